//! Identifier mapping between Source and Target vehicles
//!
//! The mapping is built once at startup from two ordered identifier lists that
//! pair up by position. It is immutable afterwards and iterates in input order,
//! so every pass visits the vehicles in the same sequence.

use crate::types::{Result, SyncError};
use std::collections::HashSet;

/// One paired vehicle: the id it has in the Source and in the Target system
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VehiclePair {
    pub source_id: String,
    pub target_id: String,
}

/// Bijective, insertion-ordered pairing of Source ids to Target ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleMapping {
    pairs: Vec<VehiclePair>,
}

impl VehicleMapping {
    /// Build a mapping from two equal-length identifier lists
    ///
    /// Position `i` of `source_ids` is paired with position `i` of `target_ids`.
    ///
    /// # Errors
    /// * `EmptyIdentifiers` if either list is empty
    /// * `LengthMismatch` if the lists differ in length
    /// * `DuplicateSourceId` / `DuplicateTargetId` if an id appears twice on one side
    pub fn new<S, T>(source_ids: S, target_ids: T) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let source_ids: Vec<String> = source_ids.into_iter().map(Into::into).collect();
        let target_ids: Vec<String> = target_ids.into_iter().map(Into::into).collect();

        if source_ids.is_empty() {
            return Err(SyncError::EmptyIdentifiers("source"));
        }
        if target_ids.is_empty() {
            return Err(SyncError::EmptyIdentifiers("target"));
        }
        if source_ids.len() != target_ids.len() {
            return Err(SyncError::LengthMismatch {
                sources: source_ids.len(),
                targets: target_ids.len(),
            });
        }

        let mut seen_sources = HashSet::with_capacity(source_ids.len());
        let mut seen_targets = HashSet::with_capacity(target_ids.len());
        let mut pairs = Vec::with_capacity(source_ids.len());

        for (source_id, target_id) in source_ids.into_iter().zip(target_ids) {
            if !seen_sources.insert(source_id.clone()) {
                return Err(SyncError::DuplicateSourceId(source_id));
            }
            if !seen_targets.insert(target_id.clone()) {
                return Err(SyncError::DuplicateTargetId(target_id));
            }
            pairs.push(VehiclePair {
                source_id,
                target_id,
            });
        }

        Ok(Self { pairs })
    }

    /// Iterate over all pairs in input order
    pub fn iter(&self) -> impl Iterator<Item = &VehiclePair> {
        self.pairs.iter()
    }

    /// Look up the Target id paired with a Source id
    pub fn target_for(&self, source_id: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|pair| pair.source_id == source_id)
            .map(|pair| pair.target_id.as_str())
    }

    /// All Source ids in input order
    pub fn source_ids(&self) -> Vec<&str> {
        self.pairs.iter().map(|pair| pair.source_id.as_str()).collect()
    }

    /// Number of mapped vehicles (never zero)
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<'a> IntoIterator for &'a VehicleMapping {
    type Item = &'a VehiclePair;
    type IntoIter = std::slice::Iter<'a, VehiclePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_pairing() {
        let mapping = VehicleMapping::new(["v1", "v2", "v3"], ["c1", "c2", "c3"]).unwrap();

        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.target_for("v1"), Some("c1"));
        assert_eq!(mapping.target_for("v2"), Some("c2"));
        assert_eq!(mapping.target_for("v3"), Some("c3"));
        assert_eq!(mapping.target_for("c1"), None);
    }

    #[test]
    fn test_iteration_keeps_input_order() {
        let mapping = VehicleMapping::new(["zeta", "alpha", "mid"], ["1", "2", "3"]).unwrap();
        assert_eq!(mapping.source_ids(), vec!["zeta", "alpha", "mid"]);

        let targets: Vec<&str> = mapping.iter().map(|p| p.target_id.as_str()).collect();
        assert_eq!(targets, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_empty_lists_rejected() {
        let empty: [&str; 0] = [];
        assert_eq!(
            VehicleMapping::new(empty, ["c1"]),
            Err(SyncError::EmptyIdentifiers("source"))
        );
        assert_eq!(
            VehicleMapping::new(["v1"], empty),
            Err(SyncError::EmptyIdentifiers("target"))
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = VehicleMapping::new(["v1", "v2"], ["c1"]);
        assert_eq!(
            result,
            Err(SyncError::LengthMismatch {
                sources: 2,
                targets: 1
            })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        assert_eq!(
            VehicleMapping::new(["v1", "v1"], ["c1", "c2"]),
            Err(SyncError::DuplicateSourceId("v1".to_string()))
        );
        assert_eq!(
            VehicleMapping::new(["v1", "v2"], ["c1", "c1"]),
            Err(SyncError::DuplicateTargetId("c1".to_string()))
        );
    }

    #[test]
    fn test_accepts_owned_strings() {
        let sources = vec!["v1".to_string()];
        let targets = vec!["c1".to_string()];
        let mapping = VehicleMapping::new(sources, targets).unwrap();
        assert!(!mapping.is_empty());
    }
}
