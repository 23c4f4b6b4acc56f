//! Shared plumbing for the monomorphization pass: symbols, source spans, and
//! the internal-compiler-error type. Every other crate in this workspace
//! depends on this one and nothing in this one depends back.

mod error;
mod span;
mod symbol;

pub use error::{InternalError, ice};
pub use span::{SourceLoc, Span};
pub use symbol::{LocalSymbol, Symbol, next_fresh_id};

pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;
