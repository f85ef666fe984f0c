//! Cached, composable diagram-to-diagram transformations.
//!
//! A morphism is a pure function from diagram handle to diagram handle,
//! memoized per input so every shared subgraph is processed at most once no
//! matter how many paths reach it — without this, the compression the
//! diagram provides would not translate into algorithmic savings.
//!
//! The combinators here are generic; domain-specific operators implement
//! [`Morphism`] alongside them and compose freely.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;

use super::factory::{Key, MfddFactory, NodeId, Value};

/// A memoized transformation of decision diagrams.
///
/// `apply` must be deterministic for a given factory state; the `&mut self`
/// receiver carries the per-instance result cache, so reusing one instance
/// across calls reuses everything it has already computed.
pub trait Morphism<K: Key, V: Value> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId;
}

/// A morphism that only acts on keys at or above a known threshold.
///
/// [`Saturated`] uses this to recurse transparently through the part of the
/// diagram the wrapped morphism cannot affect.
pub trait Saturable<K> {
    fn lowest_relevant_key(&self) -> K;
}

/// The identity morphism.
pub struct Identity;

impl<K: Key, V: Value> Morphism<K, V> for Identity {
    fn apply(&mut self, _factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        p
    }
}

/// Applies each part to the input and unions the results.
pub struct MorphismUnion<K: Key, V: Value> {
    parts: Vec<Box<dyn Morphism<K, V>>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> MorphismUnion<K, V> {
    pub fn new(parts: Vec<Box<dyn Morphism<K, V>>>) -> Self {
        Self {
            parts,
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for MorphismUnion<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let mut result = NodeId::ZERO;
        for part in &mut self.parts {
            let image = part.apply(factory, p);
            result = factory.union(result, image);
        }
        self.cache.insert(p, result);
        result
    }
}

/// Function composition: applies `inner` first, then `outer`.
pub struct Composition<K: Key, V: Value> {
    outer: Box<dyn Morphism<K, V>>,
    inner: Box<dyn Morphism<K, V>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> Composition<K, V> {
    pub fn new(
        outer: impl Morphism<K, V> + 'static,
        inner: impl Morphism<K, V> + 'static,
    ) -> Self {
        Self {
            outer: Box::new(outer),
            inner: Box::new(inner),
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for Composition<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let mid = self.inner.apply(factory, p);
        let result = self.outer.apply(factory, mid);
        self.cache.insert(p, result);
        result
    }
}

/// Repeated application of a morphism until its output stops changing.
///
/// Handle equality is structural equality under canonical construction, so
/// the loop terminates as soon as one application is a no-op. Termination
/// requires the wrapped morphism to be monotone: each application must
/// either return its input or strictly grow the represented set within a
/// finite universe.
pub struct FixedPoint<K: Key, V: Value> {
    inner: Box<dyn Morphism<K, V>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> FixedPoint<K, V> {
    pub fn new(inner: impl Morphism<K, V> + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for FixedPoint<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let mut current = p;
        loop {
            let next = self.inner.apply(factory, current);
            if next == current {
                break;
            }
            current = next;
        }
        self.cache.insert(p, current);
        current
    }
}

/// Extends every represented mapping with a fixed set of bindings.
pub struct Insert<K: Key, V: Value> {
    /// Bindings sorted by key.
    assignments: Vec<(K, V)>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> Insert<K, V> {
    pub fn new(assignments: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut assignments: Vec<(K, V)> = assignments.into_iter().collect();
        assignments.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        assert!(!assignments.is_empty(), "insertion requires at least one binding");
        Self {
            assignments,
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for Insert<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        // Per-binding work is memoized on the factory, so distinct Insert
        // instances sharing a binding still share one cache.
        let mut result = p;
        for &(key, value) in &self.assignments {
            result = factory.insert_assignment(result, key, value);
        }
        self.cache.insert(p, result);
        result
    }
}

impl<K: Key, V: Value> Saturable<K> for Insert<K, V> {
    fn lowest_relevant_key(&self) -> K {
        self.assignments[0].0
    }
}

/// Retains only the mappings that bind every one of the given keys.
///
/// The filter handles its lowest key and chains to a saturated filter for
/// the rest; a node whose key has passed the current target short-circuits
/// to `Zero`, as the target can no longer appear deeper.
pub struct InclusiveKeyFilter<K: Key, V: Value> {
    key: K,
    next: Option<Box<Saturated<K, V, InclusiveKeyFilter<K, V>>>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> InclusiveKeyFilter<K, V> {
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        assert!(!keys.is_empty(), "key filter requires at least one key");
        Self::from_sorted(&keys)
    }

    fn from_sorted(keys: &[K]) -> Self {
        let next = (keys.len() > 1)
            .then(|| Box::new(Saturated::new(Self::from_sorted(&keys[1..]))));
        Self {
            key: keys[0],
            next,
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for InclusiveKeyFilter<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if factory.is_terminal(p) {
            // Reaching a terminal means the required key never appeared.
            return NodeId::ZERO;
        }
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let key = factory.key(p);
        let result = match key.cmp(&self.key) {
            Ordering::Less => {
                let take: Vec<_> = factory
                    .arcs(p)
                    .to_vec()
                    .into_iter()
                    .map(|(v, c)| (v, self.apply(factory, c)))
                    .collect();
                let skip = factory.skip(p);
                let skip = self.apply(factory, skip);
                factory.node(key, take, skip)
            }
            Ordering::Equal => {
                let arcs = factory.arcs(p).to_vec();
                let take = match &mut self.next {
                    Some(next) => arcs
                        .into_iter()
                        .map(|(v, c)| (v, next.apply(factory, c)))
                        .collect(),
                    None => arcs,
                };
                factory.node(key, take, NodeId::ZERO)
            }
            Ordering::Greater => NodeId::ZERO,
        };
        self.cache.insert(p, result);
        result
    }
}

impl<K: Key, V: Value> Saturable<K> for InclusiveKeyFilter<K, V> {
    fn lowest_relevant_key(&self) -> K {
        self.key
    }
}

/// Retains only the mappings that bind none of the given keys.
pub struct ExclusiveKeyFilter<K: Key, V: Value> {
    key: K,
    next: Option<Box<Saturated<K, V, ExclusiveKeyFilter<K, V>>>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<K: Key, V: Value> ExclusiveKeyFilter<K, V> {
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort_unstable();
        keys.dedup();
        assert!(!keys.is_empty(), "key filter requires at least one key");
        Self::from_sorted(&keys)
    }

    fn from_sorted(keys: &[K]) -> Self {
        let next = (keys.len() > 1)
            .then(|| Box::new(Saturated::new(Self::from_sorted(&keys[1..]))));
        Self {
            key: keys[0],
            next,
            cache: HashMap::new(),
        }
    }
}

impl<K: Key, V: Value> Morphism<K, V> for ExclusiveKeyFilter<K, V> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if factory.is_terminal(p) {
            // A mapping that ended before the key trivially omits it.
            return p;
        }
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let key = factory.key(p);
        let result = match key.cmp(&self.key) {
            Ordering::Less => {
                let take: Vec<_> = factory
                    .arcs(p)
                    .to_vec()
                    .into_iter()
                    .map(|(v, c)| (v, self.apply(factory, c)))
                    .collect();
                let skip = factory.skip(p);
                let skip = self.apply(factory, skip);
                factory.node(key, take, skip)
            }
            Ordering::Equal => {
                // Only the members absent the key survive.
                let skip = factory.skip(p);
                match &mut self.next {
                    Some(next) => next.apply(factory, skip),
                    None => skip,
                }
            }
            Ordering::Greater => match &mut self.next {
                Some(next) => next.apply(factory, p),
                None => p,
            },
        };
        self.cache.insert(p, result);
        result
    }
}

impl<K: Key, V: Value> Saturable<K> for ExclusiveKeyFilter<K, V> {
    fn lowest_relevant_key(&self) -> K {
        self.key
    }
}

/// Wraps a morphism that declares a lowest relevant key, recursing
/// transparently through nodes whose key precedes it.
///
/// Nothing above the threshold can be affected by the wrapped morphism, so
/// the wrapper rebuilds those regions without re-entering full dispatch.
/// This is what keeps fixed-point iteration from re-traversing high,
/// already-settled parts of the diagram on every pass.
pub struct Saturated<K: Key, V: Value, M: Morphism<K, V> + Saturable<K>> {
    inner: M,
    lowest: K,
    cache: HashMap<NodeId, NodeId>,
    _values: PhantomData<V>,
}

impl<K: Key, V: Value, M: Morphism<K, V> + Saturable<K>> Saturated<K, V, M> {
    pub fn new(inner: M) -> Self {
        let lowest = inner.lowest_relevant_key();
        Self {
            inner,
            lowest,
            cache: HashMap::new(),
            _values: PhantomData,
        }
    }
}

impl<K: Key, V: Value, M: Morphism<K, V> + Saturable<K>> Morphism<K, V> for Saturated<K, V, M> {
    fn apply(&mut self, factory: &mut MfddFactory<K, V>, p: NodeId) -> NodeId {
        if factory.is_terminal(p) {
            return self.inner.apply(factory, p);
        }
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let key = factory.key(p);
        let result = if key < self.lowest {
            let take: Vec<_> = factory
                .arcs(p)
                .to_vec()
                .into_iter()
                .map(|(v, c)| (v, self.apply(factory, c)))
                .collect();
            let skip = factory.skip(p);
            let skip = self.apply(factory, skip);
            factory.node(key, take, skip)
        } else {
            self.inner.apply(factory, p)
        };
        self.cache.insert(p, result);
        result
    }
}

impl<K: Key, V: Value, M: Morphism<K, V> + Saturable<K>> Saturable<K> for Saturated<K, V, M> {
    fn lowest_relevant_key(&self) -> K {
        self.lowest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type F = MfddFactory<u8, u8>;

    fn family(f: &mut F, mappings: &[&[(u8, u8)]]) -> NodeId {
        f.encode(mappings.iter().map(|m| m.iter().copied()))
    }

    fn members(f: &F, p: NodeId) -> Vec<BTreeMap<u8, u8>> {
        let mut v: Vec<_> = f.mappings(p).collect();
        v.sort();
        v
    }

    #[test]
    fn test_identity() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)], &[(2, 2)]]);
        assert_eq!(Identity.apply(&mut f, p), p);
    }

    #[test]
    fn test_filter_partition() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1), (2, 2)], &[(2, 5)], &[(3, 3)], &[]]);

        let mut with = InclusiveKeyFilter::new([2u8]);
        let mut without = ExclusiveKeyFilter::new([2u8]);
        let kept = with.apply(&mut f, p);
        let dropped = without.apply(&mut f, p);

        // The two filters partition the represented set exactly.
        assert_eq!(f.count(kept) + f.count(dropped), f.count(p));
        let reunited = f.union(kept, dropped);
        assert_eq!(reunited, p);
        assert!(members(&f, kept).iter().all(|m| m.contains_key(&2)));
        assert!(members(&f, dropped).iter().all(|m| !m.contains_key(&2)));
    }

    #[test]
    fn test_inclusive_filter_multiple_keys() {
        let mut f = F::new();
        let p = family(
            &mut f,
            &[&[(1, 1), (3, 3)], &[(1, 1)], &[(3, 3)], &[(1, 0), (2, 0), (3, 0)]],
        );
        let mut filter = InclusiveKeyFilter::new([1u8, 3]);
        let kept = filter.apply(&mut f, p);
        assert_eq!(f.count(kept), 2);
        assert!(members(&f, kept)
            .iter()
            .all(|m| m.contains_key(&1) && m.contains_key(&3)));
    }

    #[test]
    fn test_exclusive_filter_multiple_keys() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)], &[(2, 2)], &[(3, 3)], &[(4, 4)]]);
        let mut filter = ExclusiveKeyFilter::new([2u8, 3]);
        let kept = filter.apply(&mut f, p);
        let got = members(&f, kept);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|m| !m.contains_key(&2) && !m.contains_key(&3)));
    }

    #[test]
    fn test_insert_morphism() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(2, 2)], &[]]);
        let mut insert = Insert::new([(1u8, 9u8), (3, 7)]);
        let q = insert.apply(&mut f, p);
        assert!(members(&f, q)
            .iter()
            .all(|m| m.get(&1) == Some(&9) && m.get(&3) == Some(&7)));
        assert_eq!(f.count(q), 2);
    }

    #[test]
    fn test_composition_order() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)], &[(1, 1), (2, 2)]]);
        // Keep members without key 2, then bind it: every member ends up
        // with the inserted value, proving the filter ran first.
        let mut composed =
            Composition::new(Insert::new([(2u8, 9u8)]), ExclusiveKeyFilter::new([2u8]));
        let q = composed.apply(&mut f, p);
        assert_eq!(
            members(&f, q),
            vec![BTreeMap::from([(1u8, 1u8), (2, 9)])]
        );
    }

    #[test]
    fn test_union_of_morphisms() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)]]);
        let parts: Vec<Box<dyn Morphism<u8, u8>>> = vec![
            Box::new(Insert::new([(2u8, 1u8)])),
            Box::new(Insert::new([(2u8, 2u8)])),
            Box::new(Identity),
        ];
        let mut union = MorphismUnion::new(parts);
        let q = union.apply(&mut f, p);
        assert_eq!(f.count(q), 3);
    }

    #[test]
    fn test_fixed_point_reaches_stability() {
        let mut f = F::new();
        let p = family(&mut f, &[&[]]);
        // One pass binds key 1, the next leaves the result unchanged.
        let parts: Vec<Box<dyn Morphism<u8, u8>>> = vec![
            Box::new(Insert::new([(1u8, 1u8)])),
            Box::new(Identity),
        ];
        let mut fp = FixedPoint::new(MorphismUnion::new(parts));
        let q = fp.apply(&mut f, p);
        let again = fp.apply(&mut f, q);
        assert_eq!(q, again);
        assert_eq!(f.count(q), 2);
    }

    #[test]
    fn test_saturated_matches_unsaturated() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1), (5, 5)], &[(1, 2)], &[(5, 0)]]);
        let mut plain = ExclusiveKeyFilter::new([5u8]);
        let mut saturated = Saturated::new(ExclusiveKeyFilter::new([5u8]));
        let a = plain.apply(&mut f, p);
        let b = saturated.apply(&mut f, p);
        assert_eq!(a, b);
    }
}
