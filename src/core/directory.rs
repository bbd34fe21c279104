//! Directory table shared by the root image and camera configuration containers
//!
//! Entries keep insertion order. An optional pinned identifier is moved to the
//! front of the serialized output; the table itself is never reordered.

use crate::core::codec::{DirectoryEntry, DIR_ENTRY_SIZE};
use crate::error::DirectoryError;

/// Ordered table of directory entries with unique identifiers
#[derive(Debug, Clone, Default)]
pub struct DirectoryTable {
    entries: Vec<DirectoryEntry>,
    pinned_identifier: Option<u32>,
}

impl DirectoryTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, rejecting identifiers already in the table
    pub fn add_entry(
        &mut self,
        identifier: u32,
        offset: u32,
        size: u32,
    ) -> Result<(), DirectoryError> {
        if self.contains(identifier) {
            return Err(DirectoryError::DuplicateIdentifier { identifier });
        }
        self.entries.push(DirectoryEntry::new(identifier, offset, size));
        Ok(())
    }

    /// Whether `identifier` is already registered
    pub fn contains(&self, identifier: u32) -> bool {
        self.entries.iter().any(|e| e.identifier == identifier)
    }

    /// Set the identifier to serialize first.
    ///
    /// An identifier with no matching entry leaves the output order unchanged.
    pub fn set_pinned_identifier(&mut self, identifier: Option<u32>) {
        self.pinned_identifier = identifier;
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the serialized table in bytes
    pub fn serialized_len(&self) -> usize {
        self.entries.len() * DIR_ENTRY_SIZE
    }

    /// Entries in serialization order
    pub fn ordered_entries(&self) -> Vec<DirectoryEntry> {
        let pinned = self
            .pinned_identifier
            .and_then(|id| self.entries.iter().position(|e| e.identifier == id));

        match pinned {
            Some(index) => {
                let mut ordered = Vec::with_capacity(self.entries.len());
                ordered.push(self.entries[index]);
                ordered.extend(
                    self.entries
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != index)
                        .map(|(_, e)| *e),
                );
                ordered
            }
            None => self.entries.clone(),
        }
    }

    /// Concatenated 12-byte encodings in serialization order
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_len());
        for entry in self.ordered_entries() {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn identifiers(bytes: &[u8]) -> Vec<u32> {
        bytes
            .chunks(DIR_ENTRY_SIZE)
            .filter_map(DirectoryEntry::from_bytes)
            .map(|e| e.identifier)
            .collect()
    }

    #[test]
    fn test_add_entry_keeps_insertion_order() {
        let mut table = DirectoryTable::new();
        table.add_entry(0x2001, 0x8000, 10).unwrap();
        table.add_entry(0x1001, 0x10000, 20).unwrap();

        let bytes = table.serialize();
        assert_eq!(bytes.len(), 24);
        assert_eq!(identifiers(&bytes), vec![0x2001, 0x1001]);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut table = DirectoryTable::new();
        table.add_entry(0x1001, 0, 4).unwrap();
        table.add_entry(0x1002, 4, 4).unwrap();

        let err = table.add_entry(0x1001, 8, 4).unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateIdentifier { identifier: 0x1001 });
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_pinned_identifier_moves_to_front() {
        let mut table = DirectoryTable::new();
        table.add_entry(0x1003, 0, 1).unwrap();
        table.add_entry(0x1001, 0x8000, 1).unwrap();
        table.add_entry(0x1002, 0x10000, 1).unwrap();
        table.set_pinned_identifier(Some(0x1002));

        assert_eq!(identifiers(&table.serialize()), vec![0x1002, 0x1003, 0x1001]);
        // The table itself keeps insertion order
        assert_eq!(table.entries()[0].identifier, 0x1003);
    }

    #[test]
    fn test_pinned_identifier_absent_is_noop() {
        let mut table = DirectoryTable::new();
        table.add_entry(0x1003, 0, 1).unwrap();
        table.add_entry(0x1001, 0x8000, 1).unwrap();
        table.set_pinned_identifier(Some(0x1FFE));

        assert_eq!(identifiers(&table.serialize()), vec![0x1003, 0x1001]);
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let mut table = DirectoryTable::new();
        table.add_entry(0x1001, 0, 1).unwrap();
        table.add_entry(0x1002, 1, 1).unwrap();
        table.set_pinned_identifier(Some(0x1002));

        assert_eq!(table.serialize(), table.serialize());
    }

    #[test]
    fn test_empty_table_serializes_to_nothing() {
        let table = DirectoryTable::new();
        assert!(table.is_empty());
        assert!(table.serialize().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// N distinct identifiers serialize to N*12 bytes in insertion order
        #[test]
        fn prop_directory_cardinality(ids in prop::collection::hash_set(any::<u32>(), 0..40)) {
            let ids: Vec<u32> = ids.into_iter().collect();
            let mut table = DirectoryTable::new();
            for (i, id) in ids.iter().enumerate() {
                table.add_entry(*id, i as u32, 1).unwrap();
            }

            let bytes = table.serialize();
            prop_assert_eq!(bytes.len(), ids.len() * DIR_ENTRY_SIZE);
            prop_assert_eq!(identifiers(&bytes), ids);
        }

        /// Pinning keeps the relative order of the remaining entries
        #[test]
        fn prop_pinning_preserves_rest(
            ids in prop::collection::hash_set(any::<u32>(), 1..30),
            pick in any::<prop::sample::Index>(),
        ) {
            let ids: Vec<u32> = ids.into_iter().collect();
            let pinned = ids[pick.index(ids.len())];
            let mut table = DirectoryTable::new();
            for id in &ids {
                table.add_entry(*id, 0, 0).unwrap();
            }
            table.set_pinned_identifier(Some(pinned));

            let order = identifiers(&table.serialize());
            prop_assert_eq!(order[0], pinned);
            let rest: Vec<u32> = ids.iter().copied().filter(|id| *id != pinned).collect();
            prop_assert_eq!(&order[1..], rest.as_slice());
        }
    }
}
