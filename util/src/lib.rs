mod id_vec;
pub use id_vec::IdVec;

mod timer;
pub use timer::Timer;

pub type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, Hasher>;
pub type HashSet<T> = std::collections::HashSet<T, Hasher>;

/// Create an empty `HashMap` with the given capacity.
#[inline]
pub fn hash_map<K, V>(cap: usize) -> HashMap<K, V> {
    HashMap::with_capacity_and_hasher(cap, Hasher::default())
}

/// Create an empty `HashSet` with the given capacity.
#[inline]
pub fn hash_set<T>(cap: usize) -> HashSet<T> {
    HashSet::with_capacity_and_hasher(cap, Hasher::default())
}
