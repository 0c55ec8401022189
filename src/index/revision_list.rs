//! Revisions in which a single node changed.

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use crate::Revision;

/// Ascending, strictly increasing, non-empty list of revision numbers.
///
/// The value type of the node-to-revisions index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Revision>", into = "Vec<Revision>")]
pub struct RevisionList {
    revisions: Vec<Revision>,
}

impl RevisionList {
    /// Creates a list holding a single revision.
    pub fn new(first: Revision) -> Self {
        Self {
            revisions: vec![first],
        }
    }

    /// Creates a list from revisions that must already be strictly increasing.
    pub fn from_revisions(revisions: Vec<Revision>) -> IndexResult<Self> {
        if revisions.is_empty() {
            return Err(IndexError::EmptyRevisionList);
        }
        for pair in revisions.windows(2) {
            if pair[1] <= pair[0] {
                return Err(IndexError::NotStrictlyIncreasing {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { revisions })
    }

    /// Appends a revision.
    ///
    /// Appending the current last revision again is a no-op, since a node
    /// may change several times within one revision.
    pub fn push(&mut self, revision: Revision) -> IndexResult<()> {
        let last = self.last();
        if revision == last {
            return Ok(());
        }
        if revision < last {
            return Err(IndexError::NotStrictlyIncreasing {
                previous: last,
                next: revision,
            });
        }
        self.revisions.push(revision);
        Ok(())
    }

    /// Returns the revisions in ascending order
    #[inline]
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Returns the oldest revision
    #[inline]
    pub fn first(&self) -> Revision {
        self.revisions[0]
    }

    /// Returns the newest revision
    #[inline]
    pub fn last(&self) -> Revision {
        self.revisions[self.revisions.len() - 1]
    }

    /// Returns true if the node changed in the given revision
    pub fn contains(&self, revision: Revision) -> bool {
        self.revisions.binary_search(&revision).is_ok()
    }

    /// Returns the number of revisions, always at least one
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.revisions.len()
    }
}

impl TryFrom<Vec<Revision>> for RevisionList {
    type Error = IndexError;

    fn try_from(revisions: Vec<Revision>) -> IndexResult<Self> {
        Self::from_revisions(revisions)
    }
}

impl From<RevisionList> for Vec<Revision> {
    fn from(list: RevisionList) -> Self {
        list.revisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut list = RevisionList::new(2);
        list.push(5).unwrap();
        list.push(5).unwrap();
        list.push(9).unwrap();

        assert_eq!(list.revisions(), &[2, 5, 9]);
        assert_eq!(list.first(), 2);
        assert_eq!(list.last(), 9);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_push_rejects_older_revision() {
        let mut list = RevisionList::new(4);
        let err = list.push(3).unwrap_err();
        assert_eq!(
            err,
            IndexError::NotStrictlyIncreasing {
                previous: 4,
                next: 3
            }
        );
        assert_eq!(list.revisions(), &[4]);
    }

    #[test]
    fn test_from_revisions_validates() {
        assert!(RevisionList::from_revisions(vec![1, 3, 8]).is_ok());
        assert_eq!(
            RevisionList::from_revisions(vec![]).unwrap_err(),
            IndexError::EmptyRevisionList
        );
        assert!(RevisionList::from_revisions(vec![1, 1]).is_err());
        assert!(RevisionList::from_revisions(vec![4, 2]).is_err());
    }

    #[test]
    fn test_contains() {
        let list = RevisionList::from_revisions(vec![1, 4, 6]).unwrap();
        assert!(list.contains(4));
        assert!(!list.contains(5));
    }

    #[test]
    fn test_deserialize_validates() {
        let list: RevisionList = serde_json::from_str("[1,2,7]").unwrap();
        assert_eq!(list.revisions(), &[1, 2, 7]);

        assert!(serde_json::from_str::<RevisionList>("[3,1]").is_err());
        assert!(serde_json::from_str::<RevisionList>("[]").is_err());
    }
}
