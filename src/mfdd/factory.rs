//! Hash-consed node store for multi-valued decision diagrams.
//!
//! The factory owns every node in an append-only arena and guarantees
//! canonicity: structurally identical nodes are allocated exactly once, so
//! handle equality is structural equality. All diagram operations go through
//! the factory, which also owns the memo tables for `union` and assignment
//! insertion.
//!
//! # Reference
//! Bryant (1986), "Graph-Based Algorithms for Boolean Function Manipulation"

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use super::iter::Mappings;

/// Bound required of diagram keys.
///
/// The key order is the diagram's variable order: along any take-edge the
/// child's key strictly exceeds the parent's.
pub trait Key: Copy + Ord + Hash + fmt::Debug + 'static {}
impl<T: Copy + Ord + Hash + fmt::Debug + 'static> Key for T {}

/// Bound required of diagram arc values.
///
/// `Ord` gives nodes a canonical arc order, which hash-consing relies on.
pub trait Value: Copy + Ord + Hash + fmt::Debug + 'static {}
impl<T: Copy + Ord + Hash + fmt::Debug + 'static> Value for T {}

/// A lightweight handle to a node owned by an [`MfddFactory`].
///
/// Handles are only meaningful for the factory that issued them. Because
/// construction is canonicalizing, two handles are equal if and only if they
/// represent the same set of mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The empty set of mappings.
    pub const ZERO: NodeId = NodeId(0);
    /// The set containing exactly the empty mapping.
    pub const ONE: NodeId = NodeId(1);
}

/// A decision-diagram node: a key, its take-arcs, and a skip-child.
///
/// `take` is sorted by arc value and never contains `Zero` children or
/// duplicate values; a node with no take-arcs is never materialized (it
/// reduces to its skip-child at construction).
#[derive(Clone, PartialEq, Eq, Hash)]
struct Node<K, V> {
    key: K,
    take: Box<[(V, NodeId)]>,
    skip: NodeId,
}

/// Arena, unique table, and memo tables for one diagram universe.
pub struct MfddFactory<K: Key, V: Value> {
    /// Node storage; `NodeId` n ≥ 2 indexes entry n − 2.
    nodes: Vec<Node<K, V>>,
    /// Unique table: node content → handle (hash-consing).
    unique: HashMap<Node<K, V>, NodeId>,
    /// Memo table for `union`, keyed by the normalized operand pair.
    union_cache: HashMap<(NodeId, NodeId), NodeId>,
    /// Memo table for single-assignment insertion.
    insert_cache: HashMap<(NodeId, K, V), NodeId>,
}

impl<K: Key, V: Value> MfddFactory<K, V> {
    /// Creates an empty factory holding only the two terminals.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            unique: HashMap::new(),
            union_cache: HashMap::new(),
            insert_cache: HashMap::new(),
        }
    }

    /// Number of distinct non-terminal nodes ever created.
    ///
    /// This is the scalability signal for the whole approach: it grows with
    /// shared structure, not with the number of represented mappings.
    pub fn created_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `p` is one of the two terminal nodes.
    pub fn is_terminal(&self, p: NodeId) -> bool {
        p.0 < 2
    }

    fn node_ref(&self, p: NodeId) -> &Node<K, V> {
        assert!(!self.is_terminal(p), "terminal nodes have no structure");
        &self.nodes[p.0 as usize - 2]
    }

    /// The key of a non-terminal node.
    pub fn key(&self, p: NodeId) -> K {
        self.node_ref(p).key
    }

    /// The take-arcs of a non-terminal node, sorted by arc value.
    pub fn arcs(&self, p: NodeId) -> &[(V, NodeId)] {
        &self.node_ref(p).take
    }

    /// The skip-child of a non-terminal node.
    pub fn skip(&self, p: NodeId) -> NodeId {
        self.node_ref(p).skip
    }

    fn parts(&self, p: NodeId) -> (K, Vec<(V, NodeId)>, NodeId) {
        let node = self.node_ref(p);
        (node.key, node.take.to_vec(), node.skip)
    }

    /// Returns the canonical node for `(key, take, skip)`.
    ///
    /// Arcs to `Zero` are dropped; if no arc remains the node reduces to its
    /// skip-child. Otherwise the unique table either returns the existing
    /// handle or registers a new node.
    pub fn node(&mut self, key: K, mut take: Vec<(V, NodeId)>, skip: NodeId) -> NodeId {
        take.retain(|&(_, child)| child != NodeId::ZERO);
        if take.is_empty() {
            return skip;
        }
        take.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        debug_assert!(
            take.windows(2).all(|w| w[0].0 != w[1].0),
            "duplicate arc values must be merged by union before construction"
        );
        debug_assert!(
            take.iter()
                .all(|&(_, c)| self.is_terminal(c) || self.key(c) > key),
            "take-edge child key must strictly exceed the parent key"
        );
        debug_assert!(
            self.is_terminal(skip) || self.key(skip) > key,
            "skip child key must strictly exceed the parent key"
        );

        let node = Node {
            key,
            take: take.into_boxed_slice(),
            skip,
        };
        if let Some(&id) = self.unique.get(&node) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32 + 2);
        self.nodes.push(node.clone());
        self.unique.insert(node, id);
        id
    }

    /// Structural merge producing the diagram for the set union of `a` and `b`.
    ///
    /// Memoized over the (unordered) operand pair; recursion compares top
    /// keys, processing the lower key first and merging take-arcs entrywise
    /// when the keys coincide.
    pub fn union(&mut self, a: NodeId, b: NodeId) -> NodeId {
        if a == NodeId::ZERO || a == b {
            return b;
        }
        if b == NodeId::ZERO {
            return a;
        }
        let probe = (a.min(b), a.max(b));
        if let Some(&r) = self.union_cache.get(&probe) {
            return r;
        }

        let result = if a == NodeId::ONE || b == NodeId::ONE {
            // Adjoining the empty mapping only affects the skip-spine.
            let other = if a == NodeId::ONE { b } else { a };
            let (key, take, skip) = self.parts(other);
            let skip = self.union(skip, NodeId::ONE);
            self.node(key, take, skip)
        } else {
            let (ka, take_a, skip_a) = self.parts(a);
            let (kb, take_b, skip_b) = self.parts(b);
            match ka.cmp(&kb) {
                Ordering::Less => {
                    let skip = self.union(skip_a, b);
                    self.node(ka, take_a, skip)
                }
                Ordering::Greater => {
                    let skip = self.union(skip_b, a);
                    self.node(kb, take_b, skip)
                }
                Ordering::Equal => {
                    let take = self.merge_arcs(take_a, take_b);
                    let skip = self.union(skip_a, skip_b);
                    self.node(ka, take, skip)
                }
            }
        };
        self.union_cache.insert(probe, result);
        result
    }

    /// Entrywise merge of two sorted arc lists; shared values recurse.
    fn merge_arcs(
        &mut self,
        take_a: Vec<(V, NodeId)>,
        take_b: Vec<(V, NodeId)>,
    ) -> Vec<(V, NodeId)> {
        let mut merged = Vec::with_capacity(take_a.len() + take_b.len());
        let mut ia = take_a.into_iter().peekable();
        let mut ib = take_b.into_iter().peekable();
        loop {
            match (ia.peek().copied(), ib.peek().copied()) {
                (Some((va, ca)), Some((vb, cb))) => match va.cmp(&vb) {
                    Ordering::Less => {
                        merged.push((va, ca));
                        ia.next();
                    }
                    Ordering::Greater => {
                        merged.push((vb, cb));
                        ib.next();
                    }
                    Ordering::Equal => {
                        let child = self.union(ca, cb);
                        merged.push((va, child));
                        ia.next();
                        ib.next();
                    }
                },
                (Some(arc), None) => {
                    merged.push(arc);
                    ia.next();
                }
                (None, Some(arc)) => {
                    merged.push(arc);
                    ib.next();
                }
                (None, None) => break,
            }
        }
        merged
    }

    /// Builds the diagram representing exactly the given family of mappings.
    ///
    /// Each mapping is assembled bottom-up in descending key order and the
    /// results are unioned.
    pub fn encode<M>(&mut self, family: impl IntoIterator<Item = M>) -> NodeId
    where
        M: IntoIterator<Item = (K, V)>,
    {
        let mut result = NodeId::ZERO;
        for mapping in family {
            let mut entries: Vec<(K, V)> = mapping.into_iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            debug_assert!(
                entries.windows(2).all(|w| w[0].0 != w[1].0),
                "a mapping cannot bind the same key twice"
            );
            let mut node = NodeId::ONE;
            for &(key, value) in entries.iter().rev() {
                node = self.node(key, vec![(value, node)], NodeId::ZERO);
            }
            result = self.union(result, node);
        }
        result
    }

    /// Extends every mapping in `p` with the binding `key ↦ value`.
    ///
    /// Mappings that already bind `key` are rebound to `value` (members that
    /// then coincide merge). Memoized at factory level so repeated
    /// insertions of the same binding share one cache across all callers.
    pub fn insert_assignment(&mut self, p: NodeId, key: K, value: V) -> NodeId {
        if p == NodeId::ZERO {
            return NodeId::ZERO;
        }
        if let Some(&r) = self.insert_cache.get(&(p, key, value)) {
            return r;
        }

        let result = if p == NodeId::ONE || self.key(p) > key {
            self.node(key, vec![(value, p)], NodeId::ZERO)
        } else {
            let (node_key, take, skip) = self.parts(p);
            if node_key == key {
                let mut merged = skip;
                for (_, child) in take {
                    merged = self.union(merged, child);
                }
                self.node(key, vec![(value, merged)], NodeId::ZERO)
            } else {
                let take = take
                    .into_iter()
                    .map(|(v, c)| (v, self.insert_assignment(c, key, value)))
                    .collect();
                let skip = self.insert_assignment(skip, key, value);
                self.node(node_key, take, skip)
            }
        };
        self.insert_cache.insert((p, key, value), result);
        result
    }

    /// Number of mappings represented by `p`, without materializing any.
    ///
    /// Memoized path counting: cost proportional to the node count of the
    /// shared graph, not to the size of the represented set.
    pub fn count(&self, p: NodeId) -> u128 {
        let mut memo = HashMap::new();
        self.count_rec(p, &mut memo)
    }

    fn count_rec(&self, p: NodeId, memo: &mut HashMap<NodeId, u128>) -> u128 {
        if p == NodeId::ZERO {
            return 0;
        }
        if p == NodeId::ONE {
            return 1;
        }
        if let Some(&n) = memo.get(&p) {
            return n;
        }
        let node = self.node_ref(p);
        let mut total = self.count_rec(node.skip, memo);
        for &(_, child) in node.take.iter() {
            total += self.count_rec(child, memo);
        }
        memo.insert(p, total);
        total
    }

    /// Lazy depth-first iterator over the concrete mappings `p` represents.
    ///
    /// The sequence is finite and the iterator is restartable: calling this
    /// again with the same handle produces the same mappings afresh.
    pub fn mappings(&self, p: NodeId) -> Mappings<'_, K, V> {
        Mappings::new(self, p)
    }
}

impl<K: Key, V: Value> Default for MfddFactory<K, V> {
    fn default() -> Self {
        Self::new()
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
    fn test_empty_take_reduces_to_skip() {
        let mut f = F::new();
        let skip = f.node(3, vec![(1, NodeId::ONE)], NodeId::ZERO);
        assert_eq!(f.node(1, vec![], skip), skip);
        // Arcs to Zero count as absent.
        assert_eq!(f.node(1, vec![(7, NodeId::ZERO)], skip), skip);
    }

    #[test]
    fn test_hash_consing_dedupes() {
        let mut f = F::new();
        let a = f.node(2, vec![(5, NodeId::ONE)], NodeId::ZERO);
        let b = f.node(2, vec![(5, NodeId::ONE)], NodeId::ZERO);
        assert_eq!(a, b);
        assert_eq!(f.created_count(), 1);
    }

    #[test]
    fn test_encode_enumerate_round_trip() {
        let mut f = F::new();
        let fam: &[&[(u8, u8)]] = &[&[(1, 10), (2, 20)], &[(1, 10)], &[(2, 21)], &[]];
        let p = family(&mut f, fam);
        let got = members(&f, p);
        let mut want: Vec<BTreeMap<u8, u8>> = fam
            .iter()
            .map(|m| m.iter().copied().collect())
            .collect();
        want.sort();
        assert_eq!(got, want);
        assert_eq!(f.count(p), 4);
    }

    #[test]
    fn test_union_laws() {
        let mut f = F::new();
        let a = family(&mut f, &[&[(1, 1)], &[(2, 2)]]);
        let b = family(&mut f, &[&[(2, 2)], &[(3, 3)]]);
        let c = family(&mut f, &[&[(1, 4), (3, 3)]]);

        // Idempotent, commutative, associative — as handles, thanks to
        // canonical construction.
        assert_eq!(f.union(a, a), a);
        let ab = f.union(a, b);
        let ba = f.union(b, a);
        assert_eq!(ab, ba);
        let ab_c = f.union(ab, c);
        let bc = f.union(b, c);
        let a_bc = f.union(a, bc);
        assert_eq!(ab_c, a_bc);
        assert_eq!(f.count(ab_c), 4);
    }

    #[test]
    fn test_union_with_one_adjoins_empty_mapping() {
        let mut f = F::new();
        let a = family(&mut f, &[&[(1, 1)]]);
        let u = f.union(a, NodeId::ONE);
        assert_eq!(f.count(u), 2);
        assert!(members(&f, u).contains(&BTreeMap::new()));
    }

    #[test]
    fn test_insert_assignment_extends_members() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)], &[(3, 3)]]);
        let q = f.insert_assignment(p, 2, 9);
        let got = members(&f, q);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|m| m.get(&2) == Some(&9)));
        // Memoized: same call, same handle.
        assert_eq!(f.insert_assignment(p, 2, 9), q);
    }

    #[test]
    fn test_insert_assignment_rebinds_existing_key() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(2, 1)], &[(2, 5)]]);
        let q = f.insert_assignment(p, 2, 7);
        // Both members collapse onto the same rebound mapping.
        assert_eq!(f.count(q), 1);
        assert_eq!(members(&f, q), vec![BTreeMap::from([(2u8, 7u8)])]);
    }

    #[test]
    fn test_count_on_terminals() {
        let f = F::new();
        assert_eq!(f.count(NodeId::ZERO), 0);
        assert_eq!(f.count(NodeId::ONE), 1);
    }

    #[test]
    fn test_mappings_restartable() {
        let mut f = F::new();
        let p = family(&mut f, &[&[(1, 1)], &[(2, 2)]]);
        let first: Vec<_> = f.mappings(p).collect();
        let second: Vec<_> = f.mappings(p).collect();
        assert_eq!(first, second);
    }
}
