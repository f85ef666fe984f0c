//! Lazy enumeration of the mappings a diagram represents.

use std::collections::BTreeMap;

use super::factory::{Key, MfddFactory, NodeId, Value};

/// Depth-first iterator over the concrete mappings below a diagram handle.
///
/// Take-arcs are visited in arc-value order, then the skip branch. The
/// traversal keeps an explicit stack so enumeration can be suspended between
/// items; it never materializes more than the current path.
pub struct Mappings<'a, K: Key, V: Value> {
    factory: &'a MfddFactory<K, V>,
    /// Node to enter next; `None` means backtrack.
    cursor: Option<NodeId>,
    /// Non-terminal ancestors of the cursor with the branch index in flight.
    /// Branch indices `0..arcs.len()` are take-arcs, `arcs.len()` is skip.
    stack: Vec<(NodeId, usize)>,
    /// Key/value bindings along the current take-path.
    prefix: Vec<(K, V)>,
}

impl<'a, K: Key, V: Value> Mappings<'a, K, V> {
    pub(super) fn new(factory: &'a MfddFactory<K, V>, root: NodeId) -> Self {
        Self {
            factory,
            cursor: Some(root),
            stack: Vec::new(),
            prefix: Vec::new(),
        }
    }
}

impl<K: Key, V: Value> Iterator for Mappings<'_, K, V> {
    type Item = BTreeMap<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.cursor.take() {
                Some(NodeId::ZERO) => {}
                Some(NodeId::ONE) => {
                    return Some(self.prefix.iter().copied().collect());
                }
                Some(node) => {
                    // Non-terminal nodes always carry at least one arc.
                    let (value, child) = self.factory.arcs(node)[0];
                    self.prefix.push((self.factory.key(node), value));
                    self.stack.push((node, 0));
                    self.cursor = Some(child);
                }
                None => {
                    let (node, branch) = self.stack.last_mut()?;
                    let node = *node;
                    let arcs = self.factory.arcs(node);
                    if *branch < arcs.len() {
                        self.prefix.pop();
                        *branch += 1;
                        if *branch < arcs.len() {
                            let (value, child) = arcs[*branch];
                            self.prefix.push((self.factory.key(node), value));
                            self.cursor = Some(child);
                        } else {
                            self.cursor = Some(self.factory.skip(node));
                        }
                    } else {
                        self.stack.pop();
                    }
                }
            }
        }
    }
}
