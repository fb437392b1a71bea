//! The GENERAL INFORMATION block of a PAR file.
//!
//! Each entry of the block is a line of the form
//! `.    <label>    :   <value(s)>`. Labels are normalized into
//! identifiers (`Max. number of slices/locations` becomes
//! `max_number_of_slices_locations`) and values are typed by inspection.

use crate::error::{ParRecError, Result};
use std::fmt;

/// A typed value of the general information block.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneralValue {
    /// A single integer token.
    Integer(i64),
    /// A single real number token.
    Real(f64),
    /// Two or more tokens, all of them numbers.
    RealVector(Vec<f64>),
    /// Anything else.
    Text(String),
}

impl GeneralValue {
    /// Infer the type of a raw value string.
    pub fn infer(raw: &str) -> GeneralValue {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() > 1 {
            let parsed: std::result::Result<Vec<f64>, _> =
                tokens.iter().map(|t| t.parse::<f64>()).collect();
            if let Ok(v) = parsed {
                return GeneralValue::RealVector(v);
            }
        } else if let Some(token) = tokens.first() {
            if let Ok(i) = token.parse::<i64>() {
                return GeneralValue::Integer(i);
            }
            if let Ok(x) = token.parse::<f64>() {
                return GeneralValue::Real(x);
            }
        }
        GeneralValue::Text(raw.trim().to_string())
    }
}

impl fmt::Display for GeneralValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeneralValue::Integer(i) => write!(f, "{}", i),
            GeneralValue::Real(x) => write!(f, "{}", x),
            GeneralValue::RealVector(v) => {
                let parts: Vec<String> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "{}", parts.join("  "))
            }
            GeneralValue::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of the general information block.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralEntry {
    /// Normalized identifier.
    pub key: String,
    /// Label exactly as written in the file.
    pub label: String,
    /// Value text exactly as written in the file, trimmed.
    pub raw: String,
    /// Typed value.
    pub value: GeneralValue,
}

/// The general information block, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralInfo {
    entries: Vec<GeneralEntry>,
}

impl GeneralInfo {
    /// Parse one general information line. Returns `None` when the line is
    /// not a `.`-prefixed `label : value` entry.
    pub fn parse_line(line: &str) -> Option<GeneralEntry> {
        let body = line.trim_start().strip_prefix('.')?;
        let (label, raw) = body.split_once(':')?;
        let key = sanitize_identifier(label_text(label)?);
        if key.is_empty() {
            return None;
        }
        let raw = raw.trim().to_string();
        Some(GeneralEntry {
            key,
            label: label.trim().to_string(),
            value: GeneralValue::infer(&raw),
            raw,
        })
    }

    /// Add an entry. An existing entry with the same key is replaced.
    pub fn insert(&mut self, entry: GeneralEntry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(e) => *e = entry,
            None => self.entries.push(entry),
        }
    }

    /// Iterate over all entries in file order.
    pub fn iter(&self) -> ::std::slice::Iter<GeneralEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were read.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch the entry under the given key.
    pub fn entry(&self, key: &str) -> Result<&GeneralEntry> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| ParRecError::MissingField(key.to_string()))
    }

    /// Fetch a value by key.
    pub fn get(&self, key: &str) -> Option<&GeneralValue> {
        self.entry(key).ok().map(|e| &e.value)
    }

    /// Fetch an integer value. Integral reals are accepted.
    pub fn integer(&self, key: &str) -> Result<i64> {
        match self.entry(key)?.value {
            GeneralValue::Integer(i) => Ok(i),
            GeneralValue::Real(x) if x.fract() == 0. => Ok(x as i64),
            _ => Err(ParRecError::InvalidField(key.to_string(), "an integer")),
        }
    }

    /// Fetch a real value.
    pub fn real(&self, key: &str) -> Result<f64> {
        match self.entry(key)?.value {
            GeneralValue::Integer(i) => Ok(i as f64),
            GeneralValue::Real(x) => Ok(x),
            _ => Err(ParRecError::InvalidField(key.to_string(), "a real number")),
        }
    }

    /// Fetch a vector of exactly `N` reals.
    pub fn vector<const N: usize>(&self, key: &str) -> Result<[f64; N]> {
        match &self.entry(key)?.value {
            GeneralValue::RealVector(v) if v.len() == N => {
                let mut out = [0.; N];
                out.copy_from_slice(v);
                Ok(out)
            }
            _ => Err(ParRecError::InvalidField(key.to_string(), "a vector of reals")),
        }
    }

    /// Fetch the raw text of a value, whatever its inferred type.
    pub fn text(&self, key: &str) -> Result<&str> {
        Ok(&self.entry(key)?.raw)
    }

    /// Replace the numeric vector stored under `key`.
    pub(crate) fn set_vector(&mut self, key: &str, values: &[f64]) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.key == key)
            .ok_or_else(|| ParRecError::MissingField(key.to_string()))?;
        let parts: Vec<String> = values.iter().map(|x| format!("{:.3}", x)).collect();
        entry.raw = parts.join("  ");
        entry.value = GeneralValue::RealVector(values.to_vec());
        Ok(())
    }
}

/// Cut a label at its first bracketed annotation (`(...)`, `[...]` or
/// `<...>`) and at its last letter.
pub(crate) fn label_text(label: &str) -> Option<&str> {
    let end = label
        .find(|c| matches!(c, '<' | '>' | '(' | ')' | '[' | ']'))
        .unwrap_or_else(|| label.len());
    let head = &label[..end];
    let last = head.rfind(|c: char| c.is_ascii_alphabetic())?;
    Some(head[..=last].trim_start())
}

/// Turn a free text label into a lower case identifier: `/` and `-` act as
/// word separators, runs of whitespace become `_`, and remaining non-word
/// characters are dropped.
pub fn sanitize_identifier(name: &str) -> String {
    name.trim()
        .split(|c: char| c.is_whitespace() || c == '/' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(
            sanitize_identifier("Max. number of slices/locations"),
            "max_number_of_slices_locations"
        );
        assert_eq!(sanitize_identifier("minimum RR-interval"), "minimum_rr_interval");
        assert_eq!(sanitize_identifier("  index in REC file "), "index_in_rec_file");
    }

    #[test]
    fn labels() {
        assert_eq!(label_text("    FOV (ap,fh,rl) [mm]     "), Some("FOV"));
        assert_eq!(
            label_text("    Angulation midslice(ap,fh,rl)[degr]"),
            Some("Angulation midslice")
        );
        assert_eq!(label_text("    Flow compensation <0=no 1=yes> ?   "), Some("Flow compensation"));
        assert_eq!(label_text("   [mm]"), None);
    }

    #[test]
    fn typed_values() {
        assert_eq!(GeneralValue::infer("  60 "), GeneralValue::Integer(60));
        assert_eq!(GeneralValue::infer("5869.386"), GeneralValue::Real(5869.386));
        assert_eq!(
            GeneralValue::infer("212.000  132.000  212.000"),
            GeneralValue::RealVector(vec![212., 132., 212.])
        );
        assert_eq!(
            GeneralValue::infer("Head First Supine"),
            GeneralValue::Text("Head First Supine".to_string())
        );
        assert_eq!(
            GeneralValue::infer("WIP_T1"),
            GeneralValue::Text("WIP_T1".to_string())
        );
    }

    #[test]
    fn entry_lines() {
        let e = GeneralInfo::parse_line(
            ".    Examination date/time              :   2007.04.13 / 09:51:58",
        )
        .unwrap();
        assert_eq!(e.key, "examination_date_time");
        assert_eq!(e.raw, "2007.04.13 / 09:51:58");
        assert!(matches!(e.value, GeneralValue::Text(_)));

        let e = GeneralInfo::parse_line(".    Off Centre midslice(ap,fh,rl) [mm] :   -1.006  -13.779  11.255")
            .unwrap();
        assert_eq!(e.key, "off_centre_midslice");
        assert_eq!(e.value, GeneralValue::RealVector(vec![-1.006, -13.779, 11.255]));

        assert_eq!(GeneralInfo::parse_line("# === PIXEL VALUES ==="), None);
        assert_eq!(GeneralInfo::parse_line(".  no colon here"), None);
    }

    #[test]
    fn accessors() {
        let mut info = GeneralInfo::default();
        for line in &[
            ".    Protocol name                      :   WIP T1W_3D",
            ".    Max. number of dynamics            :   3",
            ".    FOV (ap,fh,rl) [mm]                :   240.000  120.000  240.000",
        ] {
            info.insert(GeneralInfo::parse_line(line).unwrap());
        }
        assert_eq!(info.len(), 3);
        assert_eq!(info.text("protocol_name").unwrap(), "WIP T1W_3D");
        assert_eq!(info.integer("max_number_of_dynamics").unwrap(), 3);
        assert_eq!(info.real("max_number_of_dynamics").unwrap(), 3.);
        assert_eq!(info.vector::<3>("fov").unwrap(), [240., 120., 240.]);
        assert!(matches!(
            info.vector::<2>("fov"),
            Err(ParRecError::InvalidField(_, _))
        ));
        assert!(matches!(info.integer("fov"), Err(ParRecError::InvalidField(_, _))));
        assert!(matches!(
            info.integer("max_number_of_echoes"),
            Err(ParRecError::MissingField(_))
        ));
    }
}
