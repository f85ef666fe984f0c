//! Dependency and deadline constraint filtering.
//!
//! After the fixed point has grown the full schedule space, some states
//! place a task before its dependencies have completed (or before they are
//! present at all). The locator walks the task region and, at every task
//! node with dependencies, turns the task's scheduled start into a bound
//! its dependencies must meet deeper in the diagram.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::mfdd::{Morphism, NodeId, Saturable, Saturated};
use crate::models::{TaskId, TaskModel, Time};

use super::encoding::{ScheduleFactory, ScheduleKey, ScheduleValue};

/// Checks that each listed dependency completes by a fixed bound.
///
/// Handles its lowest dependency id and chains to a saturated filter for
/// the rest. A path on which the dependency key is missing (the dependent
/// ran but the dependency never did) prunes to `Zero`, as does any arc
/// whose completion time (`clock + wcet`) exceeds the bound.
pub struct DependencyFilter {
    /// `(id, wcet)` of the dependency checked here.
    dependency: (TaskId, Time),
    /// Start time of the dependent task.
    bound: Time,
    next: Option<Box<Saturated<ScheduleKey, ScheduleValue, DependencyFilter>>>,
    cache: HashMap<NodeId, NodeId>,
}

impl DependencyFilter {
    /// `dependencies` must be sorted ascending by id and non-empty.
    pub fn new(dependencies: &[(TaskId, Time)], bound: Time) -> Self {
        debug_assert!(!dependencies.is_empty());
        debug_assert!(dependencies.windows(2).all(|w| w[0].0 < w[1].0));
        let next = (dependencies.len() > 1)
            .then(|| Box::new(Saturated::new(Self::new(&dependencies[1..], bound))));
        Self {
            dependency: dependencies[0],
            bound,
            next,
            cache: HashMap::new(),
        }
    }
}

impl Morphism<ScheduleKey, ScheduleValue> for DependencyFilter {
    fn apply(&mut self, factory: &mut ScheduleFactory, p: NodeId) -> NodeId {
        if factory.is_terminal(p) {
            // One here means the dependency key never appeared: the
            // dependent was scheduled but its dependency was not.
            return NodeId::ZERO;
        }
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let (id, wcet) = self.dependency;
        let target = ScheduleKey::Task(id);
        let key = factory.key(p);
        let result = match key.cmp(&target) {
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
                let mut take = Vec::new();
                for (arc, child) in factory.arcs(p).to_vec() {
                    if arc.clock + wcet <= self.bound {
                        let child = match &mut self.next {
                            Some(next) => next.apply(factory, child),
                            None => child,
                        };
                        take.push((arc, child));
                    }
                }
                factory.node(key, take, NodeId::ZERO)
            }
            Ordering::Greater => NodeId::ZERO,
        };
        self.cache.insert(p, result);
        result
    }
}

impl Saturable<ScheduleKey> for DependencyFilter {
    fn lowest_relevant_key(&self) -> ScheduleKey {
        ScheduleKey::Task(self.dependency.0)
    }
}

/// Walks the task region and applies a [`DependencyFilter`] below every
/// scheduled task that has dependencies.
///
/// Filter instances are canonicalized by `(task, bound)` so states sharing
/// a start time share one filter cache across the whole traversal.
pub struct DependencyLocator<'m> {
    model: &'m TaskModel,
    filters: HashMap<(TaskId, Time), Saturated<ScheduleKey, ScheduleValue, DependencyFilter>>,
    cache: HashMap<NodeId, NodeId>,
}

impl<'m> DependencyLocator<'m> {
    pub fn new(model: &'m TaskModel) -> Self {
        Self {
            model,
            filters: HashMap::new(),
            cache: HashMap::new(),
        }
    }
}

impl Morphism<ScheduleKey, ScheduleValue> for DependencyLocator<'_> {
    fn apply(&mut self, factory: &mut ScheduleFactory, p: NodeId) -> NodeId {
        if factory.is_terminal(p) {
            return p;
        }
        if let Some(&r) = self.cache.get(&p) {
            return r;
        }
        let key = factory.key(p);
        let result = match key {
            ScheduleKey::Core(_) => {
                debug_assert_eq!(factory.skip(p), NodeId::ZERO, "unbound core in encoding");
                let take: Vec<_> = factory
                    .arcs(p)
                    .to_vec()
                    .into_iter()
                    .map(|(v, c)| (v, self.apply(factory, c)))
                    .collect();
                factory.node(key, take, NodeId::ZERO)
            }
            ScheduleKey::Task(id) => {
                let task = match self.model.get(id) {
                    Some(task) => task,
                    None => unreachable!("task {id} appears in the diagram but not the model"),
                };
                if !task.has_dependencies() {
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
                    let dependencies = self.model.dependency_wcets(task);
                    let mut take = Vec::new();
                    for (arc, child) in factory.arcs(p).to_vec() {
                        // Check the remaining tasks below first, then this
                        // task's own dependencies against its start time.
                        let below = self.apply(factory, child);
                        let filter = self
                            .filters
                            .entry((id, arc.clock))
                            .or_insert_with(|| {
                                Saturated::new(DependencyFilter::new(&dependencies, arc.clock))
                            });
                        take.push((arc, filter.apply(factory, below)));
                    }
                    let skip = factory.skip(p);
                    let skip = self.apply(factory, skip);
                    factory.node(key, take, skip)
                }
            }
        };
        self.cache.insert(p, result);
        result
    }
}
