//! Value index keys
//!
//! Keys derived from raw node values. Ordering is total and deterministic:
//! Bool < Int < Float < String.

use serde::{Deserialize, Serialize};

/// Index key representing a typed node value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from a boolean
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits // Negative: flip all bits
        } else {
            bits ^ (1 << 63) // Positive: flip sign bit
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Derive a key from the raw value bytes of a text, attribute, comment
    /// or processing-instruction node.
    ///
    /// Values that read as a boolean or number are typed accordingly,
    /// everything else becomes a string key. Returns None for values that
    /// are not valid UTF-8.
    pub fn from_raw_value(raw: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(raw).ok()?;
        let trimmed = text.trim();

        let key = match trimmed {
            "true" => IndexKey::from_bool(true),
            "false" => IndexKey::from_bool(false),
            _ => {
                if let Ok(i) = trimmed.parse::<i64>() {
                    IndexKey::from_int(i)
                } else if let Some(f) = trimmed.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    IndexKey::from_float(f)
                } else {
                    IndexKey::from_string(text)
                }
            }
        };
        Some(key)
    }
}
