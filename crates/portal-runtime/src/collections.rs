use std::hash::{Hash, Hasher};

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};

    pub type BuildHasher = std::collections::hash_map::RandomState;
    pub(crate) type StableHasher = std::collections::hash_map::DefaultHasher;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};

    pub type BuildHasher = ahash::RandomState;
    pub(crate) type StableHasher = ahash::AHasher;
}

pub type FastMap<K, V> = map::HashMap<K, V, map::BuildHasher>;
pub type FastSet<T> = map::HashSet<T, map::BuildHasher>;

pub fn fast_map<K, V>() -> FastMap<K, V> {
    FastMap::with_hasher(map::BuildHasher::default())
}

pub fn fast_set<T>() -> FastSet<T> {
    FastSet::with_hasher(map::BuildHasher::default())
}

/// Hash with fixed keys, so equal values hash equally on every render.
pub fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = map::StableHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
