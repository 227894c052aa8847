use bitvec::vec::BitVec;

/// A set of dense `usize` keys that remembers insertion order.
///
/// Membership is checked with a bitmap that has one bit per possible key,
/// which makes this type suitable for keys that are indexes in some arena,
/// like automaton states. The bitmap grows as needed. Keys are also stored
/// in a vector, so iterating the set and clearing it are proportional to
/// the number of keys in the set and not to the size of the bitmap.
#[derive(Debug, Default)]
pub(crate) struct BitmapSet {
    // Keys in insertion order.
    items: Vec<usize>,
    // One bit per possible key.
    bitmap: BitVec<usize>,
}

impl BitmapSet {
    /// Creates a set that can hold keys in `0..capacity` without growing
    /// its bitmap.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::new(), bitmap: BitVec::repeat(false, capacity) }
    }

    /// Adds a key to the set.
    ///
    /// Returns `true` if the key didn't exist in the set and was added, and
    /// `false` if it already existed.
    #[inline]
    pub fn insert(&mut self, key: usize) -> bool {
        if self.bitmap.len() <= key {
            self.bitmap.resize(key + 1, false);
        } else if self.bitmap[key] {
            return false;
        }
        self.bitmap.set(key, true);
        self.items.push(key);
        true
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes all keys in the set.
    #[inline]
    pub fn clear(&mut self) {
        for key in self.items.drain(..) {
            self.bitmap.set(key, false);
        }
    }

    /// Returns an iterator for the keys in the set.
    ///
    /// Keys are returned in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().copied()
    }
}
