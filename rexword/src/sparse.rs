use core::fmt;

/// A set of small integers drawn from `0..capacity`.
///
/// Insertion, membership and clearing are all O(1) and values iterate in
/// insertion order. `sparse` is never cleared: an entry is trusted only when
/// the dense slot it points at holds the same value.
#[derive(Clone)]
pub struct SparseSet {
    dense: Vec<u32>,
    sparse: Vec<u32>,
}

impl SparseSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            dense: Vec::with_capacity(capacity),
            sparse: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.sparse.len()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Adds `value`, returning `false` if it was already present.
    ///
    /// # Panics
    ///
    /// Panics if `value` is outside `0..capacity`.
    pub fn insert(&mut self, value: u32) -> bool {
        assert!(
            (value as usize) < self.capacity(),
            "sparse set value {} out of range for capacity {}",
            value,
            self.capacity()
        );
        if self.contains(value) {
            return false;
        }
        self.sparse[value as usize] = self.dense.len() as u32;
        self.dense.push(value);
        true
    }

    pub fn contains(&self, value: u32) -> bool {
        match self.sparse.get(value as usize) {
            Some(&slot) => self.dense.get(slot as usize) == Some(&value),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.dense.clear();
    }

    /// Values in insertion order.
    pub fn as_slice(&self) -> &[u32] {
        &self.dense
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.dense.iter().copied()
    }
}

impl fmt::Debug for SparseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
