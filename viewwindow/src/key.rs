#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(feature = "std")]
use std::collections::HashMap;

#[cfg(feature = "std")]
pub(crate) type KeyMap<K, V> = HashMap<K, V>;
#[cfg(not(feature = "std"))]
pub(crate) type KeyMap<K, V> = BTreeMap<K, V>;

/// Bound for keys tracked by [`crate::ProximityObserver`].
///
/// With `std` this is `Hash + Eq`; without it, `Ord` (backed by a `BTreeMap`).
#[cfg(feature = "std")]
pub trait ObserverKey: core::hash::Hash + Eq + Clone {}
#[cfg(feature = "std")]
impl<K: core::hash::Hash + Eq + Clone> ObserverKey for K {}

#[cfg(not(feature = "std"))]
pub trait ObserverKey: Ord + Clone {}
#[cfg(not(feature = "std"))]
impl<K: Ord + Clone> ObserverKey for K {}
