//! Target-face to source-face assignments for multi-face swaps.

use std::collections::BTreeMap;

use crate::error::{ClientError, ClientResult};

/// Wire sentinel for "leave this face untouched".
pub const UNASSIGNED: i32 = -1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceMapping {
    entries: BTreeMap<u32, i32>,
}

impl FaceMapping {
    /// Every detected face starts unassigned.
    pub fn for_faces(indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            entries: indices.into_iter().map(|i| (i, UNASSIGNED)).collect(),
        }
    }

    /// Assign `source` (or [`UNASSIGNED`]) to a detected target face.
    pub fn assign(&mut self, target: u32, source: i32, source_count: usize) -> ClientResult<()> {
        let Some(entry) = self.entries.get_mut(&target) else {
            return Err(ClientError::validation("target_face", "not a detected face", target.to_string()));
        };
        let in_range = source == UNASSIGNED || (source >= 0 && (source as usize) < source_count);
        if !in_range {
            return Err(ClientError::validation(
                "source_face",
                format!("must be -1 or below {source_count}"),
                source.to_string(),
            ));
        }
        *entry = source;
        Ok(())
    }

    pub fn get(&self, target: u32) -> Option<i32> {
        self.entries.get(&target).copied()
    }

    pub fn assigned_count(&self) -> usize {
        self.entries.values().filter(|s| **s != UNASSIGNED).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.entries.iter().map(|(t, s)| (*t, *s))
    }

    /// Comma-joined `target:source` pairs in target order, skipping
    /// unassigned faces. `None` when nothing is assigned.
    pub fn to_wire(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .iter()
            .filter(|(_, s)| *s != UNASSIGNED)
            .map(|(t, s)| format!("{t}:{s}"))
            .collect();
        (!pairs.is_empty()).then(|| pairs.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_faces_are_left_out() {
        let mut mapping = FaceMapping::for_faces([0, 1, 2]);
        mapping.assign(0, 1, 2).unwrap();
        mapping.assign(1, 0, 2).unwrap();
        assert_eq!(mapping.get(2), Some(UNASSIGNED));
        assert_eq!(mapping.to_wire().as_deref(), Some("0:1,1:0"));
        assert_eq!(mapping.assigned_count(), 2);
    }

    #[test]
    fn nothing_assigned_omits_field() {
        let mut mapping = FaceMapping::for_faces([0, 1]);
        assert_eq!(mapping.to_wire(), None);
        mapping.assign(1, 0, 1).unwrap();
        mapping.assign(1, UNASSIGNED, 1).unwrap();
        assert_eq!(mapping.to_wire(), None);
    }

    #[test]
    fn rejects_unknown_faces_and_sources() {
        let mut mapping = FaceMapping::for_faces([0]);
        assert!(mapping.assign(5, 0, 1).is_err());
        assert!(mapping.assign(0, 1, 1).is_err());
        assert!(mapping.assign(0, -2, 1).is_err());
        assert_eq!(mapping.get(0), Some(UNASSIGNED));
    }

    #[test]
    fn wire_order_follows_target_index() {
        let mut mapping = FaceMapping::for_faces([10, 2]);
        mapping.assign(10, 0, 2).unwrap();
        mapping.assign(2, 1, 2).unwrap();
        assert_eq!(mapping.to_wire().as_deref(), Some("2:1,10:0"));
    }
}
