use crate::span::SourceLoc;
use crate::symbol::Symbol;

/// Every error this pass can produce is a bug in this phase or in a
/// preceding one (SPEC_FULL.md §7) — there is no user-facing diagnostic
/// path, so this is a panic payload rather than a `Result` error type. A
/// host compiler that wraps the pass in `std::panic::catch_unwind` can
/// downcast the payload to `InternalError` and inspect `kind()` instead of
/// string-matching a panic message.
#[derive(Clone, Debug, thiserror::Error)]
pub enum InternalError {
    #[error("unification failure at {loc}: could not unify {lhs} with {rhs}")]
    UnificationFailure { loc: SourceLoc, lhs: String, rhs: String },

    #[error("no matching instance and no default body for signature {sig} at {loc}")]
    MissingInstance { sig: Symbol, loc: SourceLoc },

    #[error("{count} instances of {trait_sym} match at {loc}; expected exactly one")]
    AmbiguousInstances { trait_sym: Symbol, count: usize, loc: SourceLoc },

    #[error("unbound local variable {sym} at {loc}")]
    UnboundVariable { sym: String, loc: SourceLoc },

    #[error("associated type {assoc} is not reducible for argument {arg} at {loc}")]
    UnreducibleAssocType { assoc: Symbol, arg: String, loc: SourceLoc },
}

impl InternalError {
    /// Stable, `match`-friendly discriminant name, independent of the
    /// formatted message, for assertions in tests and host crash reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            InternalError::UnificationFailure { .. } => "unification_failure",
            InternalError::MissingInstance { .. } => "missing_instance",
            InternalError::AmbiguousInstances { .. } => "ambiguous_instances",
            InternalError::UnboundVariable { .. } => "unbound_variable",
            InternalError::UnreducibleAssocType { .. } => "unreducible_assoc_type",
        }
    }
}

/// Raises (panics with) an [`InternalError`]. Named `ice` (internal
/// compiler error) to read naturally at call sites: `ice(err)` rather than
/// a bare `panic!`, so a `grep` for how this phase fails turns up one
/// function instead of a dozen ad hoc `panic!` call sites.
#[track_caller]
pub fn ice(err: InternalError) -> ! {
    tracing::error!(kind = err.kind(), "{err}");
    std::panic::panic_any(err);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Installs a `tracing` subscriber so `ice`'s `tracing::error!` call has
    /// somewhere to go under `cargo test`; `try_init` so running more than
    /// one test in this module doesn't panic on a second global subscriber.
    fn init_test_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn ice_panics_with_the_original_error_as_the_payload() {
        init_test_tracing();
        let err = InternalError::UnboundVariable { sym: "x".to_string(), loc: SourceLoc::dummy() };

        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| ice(err))).unwrap_err();
        let payload = caught.downcast::<InternalError>().expect("panic payload should be the InternalError");
        assert_eq!(payload.kind(), "unbound_variable");
    }
}
