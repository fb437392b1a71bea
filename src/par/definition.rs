//! The IMAGE INFORMATION DEFINITION block of a PAR file.
//!
//! Every definition line declares one slice attribute along with its width
//! and type, e.g. `#  recon resolution (x y)   (2*integer)`. Together these
//! lines form the schema of the data rows which follow.

use super::general::{label_text, sanitize_identifier};
use crate::error::{ParRecError, Result};

/// Storage kind of a slice table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Declared as `integer` or `string`.
    Int,
    /// Declared as `float`.
    Float,
}

/// One scalar column of the slice table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, with the sub-field suffix for multi-valued attributes.
    pub name: String,
    /// Storage kind.
    pub kind: ColumnKind,
}

/// One attribute as declared in the definition block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Normalized attribute name.
    pub name: String,
    /// Number of columns taken by the attribute.
    pub width: usize,
    /// Storage kind of each column.
    pub kind: ColumnKind,
    /// The definition line as written in the file.
    pub line: String,
}

/// Sub-field names of the attributes spanning more than one column.
fn subfield_names(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "recon_resolution" | "pixel_spacing" => Some(&["x", "y"]),
        "image_angulation" | "image_offcentre" | "diffusion" => Some(&["ap", "fh", "rl"]),
        _ => None,
    }
}

/// The ordered slice table schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceSchema {
    fields: Vec<FieldDefinition>,
    columns: Vec<Column>,
}

impl SliceSchema {
    /// Try to interpret a line of the definition block. `Ok(None)` is
    /// returned for comment lines which do not declare an attribute.
    pub fn parse_line(line: &str, line_number: usize) -> Result<Option<FieldDefinition>> {
        let body = match line.trim().strip_prefix('#') {
            Some(body) => body,
            None => return Ok(None),
        };
        let (open, close) = match (body.rfind('('), body.rfind(')')) {
            (Some(open), Some(close)) if open < close => (open, close),
            _ => return Ok(None),
        };
        if !body[close + 1..].trim().is_empty() {
            return Ok(None);
        }
        let name = match label_text(&body[..open]) {
            Some(label) => sanitize_identifier(label),
            None => return Ok(None),
        };
        if name.is_empty() {
            return Ok(None);
        }

        let shape = body[open + 1..close].trim();
        let (width, kind) = match shape.split_once('*') {
            Some((n, kind)) => match n.trim().parse::<usize>() {
                Ok(n) if n > 0 => (n, kind.trim()),
                _ => return Ok(None),
            },
            None => (1, shape),
        };
        let kind = match kind {
            "integer" | "string" => ColumnKind::Int,
            "float" => ColumnKind::Float,
            other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => {
                return Err(ParRecError::UnknownFieldType(line_number, other.to_string()));
            }
            // a parenthesized remark, not a type declaration
            _ => return Ok(None),
        };

        Ok(Some(FieldDefinition {
            name,
            width,
            kind,
            line: line.trim().to_string(),
        }))
    }

    /// Append an attribute, expanding it into its scalar columns.
    pub fn push(&mut self, field: FieldDefinition) {
        let kind = field.kind;
        if field.width == 1 {
            self.columns.push(Column {
                name: field.name.clone(),
                kind,
            });
        } else {
            match subfield_names(&field.name).filter(|s| s.len() == field.width) {
                Some(subs) => self.columns.extend(subs.iter().map(|s| Column {
                    name: format!("{}_{}", field.name, s),
                    kind,
                })),
                None => self.columns.extend((1..=field.width).map(|i| Column {
                    name: format!("{}_{}", field.name, i),
                    kind,
                })),
            }
        }
        self.fields.push(field);
    }

    /// Declared attributes, in order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Scalar columns, in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Total number of scalar columns, which every data row must match.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no attribute has been declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Position of the named column, failing if it was not declared.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| ParRecError::MissingField(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<FieldDefinition> {
        SliceSchema::parse_line(line, 1).unwrap()
    }

    #[test]
    fn definition_lines() {
        let f = parse("#  index in REC file (in images)            (integer)").unwrap();
        assert_eq!(f.name, "index_in_rec_file");
        assert_eq!(f.width, 1);
        assert_eq!(f.kind, ColumnKind::Int);

        let f = parse("#  image angulation (ap,fh,rl in degrees )  (3*float)").unwrap();
        assert_eq!(f.name, "image_angulation");
        assert_eq!(f.width, 3);
        assert_eq!(f.kind, ColumnKind::Float);

        let f = parse("#  TURBO factor  <0=no turbo>               (integer)").unwrap();
        assert_eq!(f.name, "turbo_factor");

        let f = parse("#  contrast type                            (string)").unwrap();
        assert_eq!(f.kind, ColumnKind::Int);

        assert_eq!(parse("#"), None);
        assert_eq!(
            parse("#  The rest of this file contains ONE line per image, this line contains the following information:"),
            None
        );
        assert_eq!(parse("# === IMAGE INFORMATION ==="), None);
    }

    #[test]
    fn unknown_types() {
        let err = SliceSchema::parse_line("#  magic number   (2*complex)", 42).unwrap_err();
        match err {
            ParRecError::UnknownFieldType(line, kind) => {
                assert_eq!(line, 42);
                assert_eq!(kind, "complex");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn column_expansion() {
        let mut schema = SliceSchema::default();
        for line in &[
            "#  slice number                             (integer)",
            "#  recon resolution (x y)                   (2*integer)",
            "#  diffusion (ap, fh, rl)                   (3*float)",
            "#  mystery (a b c d)                        (4*float)",
        ] {
            schema.push(parse(line).unwrap());
        }
        let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "slice_number",
                "recon_resolution_x",
                "recon_resolution_y",
                "diffusion_ap",
                "diffusion_fh",
                "diffusion_rl",
                "mystery_1",
                "mystery_2",
                "mystery_3",
                "mystery_4",
            ]
        );
        assert_eq!(schema.fields().len(), 4);
        assert_eq!(schema.len(), 10);
        assert_eq!(schema.index_of("diffusion_fh"), Some(4));
        assert!(schema.require("echo_time").is_err());
    }
}
