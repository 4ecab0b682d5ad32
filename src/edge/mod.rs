//! Edge descriptor model.
//!
//! The compiler emits one descriptor per step input edge (capacity bounds,
//! backpressure policy, payload type). The runtime derives the edge's
//! semantics from it and instantiates a matching queue:
//!
//! ```text
//! maxCapacity > 0          → bounded
//! backpressure == "block"  → atLeastOnce, otherwise bestEffort
//! edge.FIFO / edge.Pipeline → FifoQueue, edge.LIFO → LifoQueue
//! ```

pub mod descriptor;
pub mod error;
pub mod index;
pub mod policy;

pub use descriptor::{
    EdgeDescriptor, EdgeDiagnostic, EdgeKind, MergeOp, MultiPath, MultiPathInput, Segment,
};
pub use error::{EdgeError, EdgeResult};
pub use index::{EdgesIndex, EDGES_FILE, EDGES_SCHEMA};
pub use policy::{derive_bounded_delivery, BackpressurePolicy, Delivery, Overflow};
