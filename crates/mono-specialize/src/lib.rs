//! Expression specialization (C6): given one `WorkItem` from the registry,
//! produces the fully-monomorphic `Def` it describes, demanding further
//! specializations along the way. Does not decide what to seed or when the
//! pass has reached a fixpoint — that is the driver's job (`mono-driver`).

mod demand;
mod freshen;
mod rewrite;

pub use demand::{demand_def, demand_sig};
pub use freshen::Env;
pub use rewrite::{SpecCtx, specialize_work_item};
