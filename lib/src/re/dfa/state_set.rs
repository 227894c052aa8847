use std::hash::{Hash, Hasher};

use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

/// Fixed-width set of arrow indexes that identifies a DFA state during the
/// subset construction.
///
/// Two sets are equal if they have the same width and the same bits set.
/// The hash is the XOR of the underlying words, which is cheap and good
/// enough as a first filter, hash tables still compare sets for equality.
#[derive(Clone, Debug)]
pub(crate) struct StateSet {
    bits: BitVec<u64, Lsb0>,
}

impl StateSet {
    /// Creates an empty set that can hold indexes in `0..width`.
    pub fn new(width: usize) -> Self {
        let mut bits = BitVec::repeat(false, width);
        // Bits past `width` in the last word take part in comparisons and
        // hashing, they must be zero.
        bits.set_uninitialized(false);
        Self { bits }
    }

    /// Creates a set that contains a single index.
    pub fn singleton(width: usize, index: usize) -> Self {
        let mut set = Self::new(width);
        set.insert(index);
        set
    }

    /// # Panics
    ///
    /// If `index` is not lower than the width of the set.
    #[inline]
    pub fn insert(&mut self, index: usize) {
        assert!(index < self.bits.len(), "index out of range");
        self.bits.set(index, true);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Returns the indexes in the set, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        self.bits.len() == other.bits.len()
            && self.bits.as_raw_slice() == other.bits.as_raw_slice()
    }
}

impl Eq for StateSet {}

impl Hash for StateSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let hash = self
            .bits
            .as_raw_slice()
            .iter()
            .fold(0_u64, |hash, word| hash ^ word);
        state.write_u64(hash);
    }
}
