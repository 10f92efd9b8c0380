use std::collections::HashMap;

/// A file or object on a [`Filesystem`](super::Filesystem). `address` is
/// opaque to the core — interpreted only by the filesystem's driver.
/// Created on first reference, never mutated; checksums and metadata are
/// appended independently of the address itself.
#[derive(Debug, Clone, PartialEq)]
pub struct DataItem {
    pub id: i64,
    pub filesystem_id: i64,
    pub address: String,
    pub size: Option<u64>,
    pub checksums: Vec<Checksum>,
    pub metadata: HashMap<String, String>,
}

/// One `(algorithm, checksum)` pair for a [`DataItem`]. A re-checksum with
/// the same algorithm replaces the prior row rather than appending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: String,
    pub value: String,
}

impl DataItem {
    pub fn new(id: i64, filesystem_id: i64, address: impl Into<String>) -> Self {
        Self {
            id,
            filesystem_id,
            address: address.into(),
            size: None,
            checksums: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}
