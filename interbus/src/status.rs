//! Status and setup register decoding.
//!
//! A module kind describes its 16-bit status word as a table of bit
//! positions and labels. Decoding reports the labels of every asserted bit
//! that the table names; reserved or unlisted bits are dropped, so device
//! vocabularies can change without touching the decoder.

use std::fmt;

/// One named bit of a status or setup register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBit {
    pub bit: u8,
    pub label: &'static str,
}

impl StatusBit {
    pub const fn new(bit: u8, label: &'static str) -> Self {
        Self { bit, label }
    }

    pub fn mask(&self) -> u16 {
        1u16.checked_shl(self.bit.into()).unwrap_or(0)
    }
}

/// Bit→label vocabulary for one register of one module kind.
pub type BitTable = [StatusBit];

/// Labels asserted in one status read, low bit first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusFlagSet {
    raw: u16,
    labels: Vec<&'static str>,
}

impl StatusFlagSet {
    /// The word the labels were decoded from.
    pub fn raw(&self) -> u16 {
        self.raw
    }

    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| *l == label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.labels.iter().copied()
    }
}

impl fmt::Display for StatusFlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "0x{:04X} (no flags set)", self.raw)
        } else {
            write!(f, "0x{:04X} ({})", self.raw, self.labels.join(", "))
        }
    }
}

/// Decode `raw` against `table`.
pub fn decode(raw: u16, table: &BitTable) -> StatusFlagSet {
    let mut asserted: Vec<&StatusBit> = table
        .iter()
        .filter(|entry| entry.bit < 16 && raw & entry.mask() != 0)
        .collect();
    asserted.sort_by_key(|entry| entry.bit);

    StatusFlagSet {
        raw,
        labels: asserted.into_iter().map(|entry| entry.label).collect(),
    }
}
