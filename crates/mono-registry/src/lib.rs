//! The specialization registry (C4): the pass's only mutable, cross-thread
//! state. See `Registry` for the memo/queue/result-store contract.

mod registry;

pub use registry::{Registry, WorkItem};
