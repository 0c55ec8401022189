//! Hierarchical position labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Structural position of a node, e.g. `1.3.5`.
///
/// Each division is the ordinal of the node among its parent's children,
/// so comparing two labels compares document order. A label always has at
/// least one division.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct DeweyId {
    divisions: Vec<u32>,
}

impl DeweyId {
    /// Label of the document root
    pub fn root() -> Self {
        Self {
            divisions: vec![1],
        }
    }

    /// Label of the child at `ordinal` (1-based) below this node
    pub fn child(&self, ordinal: u32) -> Self {
        let mut divisions = self.divisions.clone();
        divisions.push(ordinal);
        Self { divisions }
    }

    /// Label of the parent, None for the root
    pub fn parent(&self) -> Option<Self> {
        if self.divisions.len() <= 1 {
            return None;
        }
        Some(Self {
            divisions: self.divisions[..self.divisions.len() - 1].to_vec(),
        })
    }

    /// Depth below the root, which has level 0
    pub fn level(&self) -> usize {
        self.divisions.len() - 1
    }

    /// Returns true if `other` lies strictly below this node
    pub fn is_ancestor_of(&self, other: &DeweyId) -> bool {
        other.divisions.len() > self.divisions.len()
            && other.divisions.starts_with(&self.divisions)
    }

    /// Returns the divisions
    pub fn divisions(&self) -> &[u32] {
        &self.divisions
    }
}

impl fmt::Display for DeweyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, division) in self.divisions.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", division)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<u32>> for DeweyId {
    type Error = String;

    fn try_from(divisions: Vec<u32>) -> Result<Self, Self::Error> {
        if divisions.is_empty() {
            return Err("dewey id needs at least one division".to_string());
        }
        Ok(Self { divisions })
    }
}

impl From<DeweyId> for Vec<u32> {
    fn from(id: DeweyId) -> Self {
        id.divisions
    }
}

impl FromStr for DeweyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let divisions = s
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|e| format!("invalid division '{}': {}", part, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from(divisions)
    }
}
