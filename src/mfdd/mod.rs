//! Multi-valued decision diagrams (MFDDs).
//!
//! An MFDD is a compressed, hash-consed DAG representing a *set* of finite
//! key→value mappings through shared structure. Each node tests one key: a
//! take-arc per value binds the key and moves to a deeper node, the skip-arc
//! leaves the key unbound. Two terminals close the structure: `Zero` (the
//! empty set) and `One` (the end of a successful mapping).
//!
//! The package splits into:
//!
//! - **`factory`**: the node store; canonical construction, union, explicit
//!   encoding, counting, and the created-node counter.
//! - **`morphism`**: cached transformations over diagrams; identity, union,
//!   composition, fixed point, insertion, key filters, and saturation.
//! - **`iter`**: lazy enumeration of represented mappings.
//!
//! Everything is generic over the key/value alphabet; the scheduling domain
//! instantiates it in [`crate::scheduler`].

mod factory;
mod iter;
mod morphism;

pub use factory::{Key, MfddFactory, NodeId, Value};
pub use iter::Mappings;
pub use morphism::{
    Composition, ExclusiveKeyFilter, FixedPoint, Identity, InclusiveKeyFilter, Insert, Morphism,
    MorphismUnion, Saturable, Saturated,
};
