//! Slice shape constructs.
//!
//! REC files store each slice with the x index varying fastest, which is
//! column major (Fortran) order for an array indexed as `[x, y]`. The memory
//! order of every reshape is named explicitly through [`AxisOrder`].
//!
//! [`AxisOrder`]: ./enum.AxisOrder.html
use crate::error::Result;
use ndarray::{Array2, ShapeBuilder};

/// Memory order of a flat sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisOrder {
    /// The last index varies fastest (C order).
    RowMajor,
    /// The first index varies fastest (Fortran order).
    ColumnMajor,
}

impl AxisOrder {
    /// Arrange a flat buffer into a 2D array of the given shape.
    ///
    /// # Example
    ///
    /// ```
    /// # use parrec2nii::volume::shape::AxisOrder;
    /// let a = AxisOrder::ColumnMajor.reshape((2, 3), vec![0, 1, 2, 3, 4, 5])?;
    /// assert_eq!(a[(1, 0)], 1);
    /// assert_eq!(a[(0, 1)], 2);
    /// # Ok::<(), parrec2nii::ParRecError>(())
    /// ```
    pub fn reshape<T>(self, shape: (usize, usize), data: Vec<T>) -> Result<Array2<T>> {
        let array = match self {
            AxisOrder::RowMajor => Array2::from_shape_vec(shape, data)?,
            AxisOrder::ColumnMajor => Array2::from_shape_vec(shape.f(), data)?,
        };
        Ok(array)
    }
}
