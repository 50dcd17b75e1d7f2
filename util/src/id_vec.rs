use std::marker::PhantomData;

/// Append-only arena that hands out typed indexes.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<K, V> IdVec<K, V> {
    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            vec: Vec::with_capacity(cap),
            _phantom: PhantomData,
        }
    }

    /// Get the current length
    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// True if len == 0
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    /// Get the value with id `k`.
    #[inline]
    pub fn get(&self, k: K) -> &V {
        &self.vec[k.into()]
    }

    /// Get a mutable reference to value with id `k`.
    #[inline]
    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.vec[k.into()]
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Push `v` into the underlying vec, and return an id that can be used to retrieve it later.
    #[inline]
    pub fn push(&mut self, v: V) -> K {
        let id = self.vec.len().into();
        self.vec.push(v);
        id
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Id(usize);

    impl From<usize> for Id {
        fn from(val: usize) -> Self {
            Self(val)
        }
    }

    impl From<Id> for usize {
        fn from(id: Id) -> usize {
            id.0
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut ids: IdVec<Id, &str> = IdVec::with_capacity(2);
        let a = ids.push("a");
        let b = ids.push("b");
        assert_eq!(a, Id(0));
        assert_eq!(b, Id(1));
        assert_eq!(*ids.get(b), "b");
        *ids.get_mut(a) = "z";
        assert_eq!(*ids.get(a), "z");
        assert_eq!(ids.len(), 2);
    }
}
