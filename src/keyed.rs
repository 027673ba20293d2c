//! Enum-Keyed Fixed Arrays
//!
//! Every per-channel table in the engine is a fixed-size array indexed by an
//! enumerated key. The key's `index` is an exhaustive `match`, so adding a
//! variant without updating the table is a compile error, and the array
//! length is checked against `Key::COUNT` when the table is built.

use core::marker::PhantomData;
use core::ops::{Index, IndexMut};

/// An enumerated key that addresses a slot in a [`KeyedArray`]
pub trait Key: Copy + 'static {
    /// Number of distinct keys
    const COUNT: usize;

    /// Every key, in slot order
    const ALL: &'static [Self];

    /// Slot index, always `< COUNT`
    fn index(self) -> usize;
}

/// Fixed-size array addressed by an enumerated key type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyedArray<K: Key, T, const N: usize> {
    slots: [T; N],
    _key: PhantomData<K>,
}

impl<K: Key, T, const N: usize> KeyedArray<K, T, N> {
    const LEN_MATCHES_KEY: () = assert!(N == K::COUNT, "array length must equal Key::COUNT");

    /// Build from a fully initialised array in slot order
    pub fn from_array(slots: [T; N]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LEN_MATCHES_KEY;
        Self {
            slots,
            _key: PhantomData,
        }
    }

    /// Build by calling `f` for each key
    pub fn from_fn(mut f: impl FnMut(K) -> T) -> Self {
        Self::from_array(core::array::from_fn(|i| f(K::ALL[i])))
    }

    /// Iterate `(key, value)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        K::ALL.iter().copied().zip(self.slots.iter())
    }

    /// Iterate `(key, value)` pairs mutably in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        K::ALL.iter().copied().zip(self.slots.iter_mut())
    }

    /// Raw slot view
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }
}

impl<K: Key, T: Copy, const N: usize> KeyedArray<K, T, N> {
    /// Every slot set to `value`
    pub fn splat(value: T) -> Self {
        Self::from_array([value; N])
    }

    /// Set every slot to `value`
    pub fn fill(&mut self, value: T) {
        self.slots.fill(value);
    }
}

impl<K: Key, T: Default + Copy, const N: usize> Default for KeyedArray<K, T, N> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl<K: Key, T, const N: usize> Index<K> for KeyedArray<K, T, N> {
    type Output = T;

    #[inline]
    fn index(&self, key: K) -> &T {
        &self.slots[key.index()]
    }
}

impl<K: Key, T, const N: usize> IndexMut<K> for KeyedArray<K, T, N> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut T {
        &mut self.slots[key.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Jack {
        Left,
        Right,
        Sum,
    }

    impl Key for Jack {
        const COUNT: usize = 3;
        const ALL: &'static [Self] = &[Jack::Left, Jack::Right, Jack::Sum];

        fn index(self) -> usize {
            match self {
                Jack::Left => 0,
                Jack::Right => 1,
                Jack::Sum => 2,
            }
        }
    }

    #[test]
    fn test_index_by_key() {
        let mut table: KeyedArray<Jack, u16, 3> = KeyedArray::splat(0);
        table[Jack::Right] = 7;
        assert_eq!(table[Jack::Left], 0);
        assert_eq!(table[Jack::Right], 7);
        assert_eq!(table.as_slice(), &[0, 7, 0]);
    }

    #[test]
    fn test_from_fn_visits_keys_in_order() {
        let table: KeyedArray<Jack, usize, 3> = KeyedArray::from_fn(|k: Jack| k.index() * 10);
        let pairs: Vec<_> = table.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(pairs, vec![(Jack::Left, 0), (Jack::Right, 10), (Jack::Sum, 20)]);
    }
}
