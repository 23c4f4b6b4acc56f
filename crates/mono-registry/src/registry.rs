use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mono_ast::{Def, Type};
use mono_common::Symbol;
use mono_solver::StrictSubst;

/// One unit of pending work: specialize `def` under `subst`, and store the
/// result at `fresh_sym` once done (SPEC_FULL.md §4.4, §4.7). `subst` has no
/// useful `Eq`/`Hash` impl and work items are only ever consumed once, so
/// this is a plain struct rather than a memo key.
pub struct WorkItem {
    pub fresh_sym: Symbol,
    pub def: Def,
    pub subst: StrictSubst,
}

/// The pass's only mutable, cross-thread state (SPEC_FULL.md §4.4, §5):
///
/// - `pending`: a lock-free multi-producer/multi-consumer queue of
///   not-yet-specialized work.
/// - `memo`: `(source_symbol, erased_type) -> fresh_symbol`, first writer
///   wins.
/// - `results`: `fresh_symbol -> specialized Def`, written exactly once per
///   key.
///
/// Backed by `DashMap` the same way the teacher's `TypeInterner` backs its
/// concurrent type cache: sharded locking gives atomic per-key
/// read-then-write without a single global lock across the whole table.
#[derive(Default)]
pub struct Registry {
    pending: SegQueue<WorkItem>,
    memo: DashMap<(Symbol, Type), Symbol>,
    results: DashMap<Symbol, Def>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn enqueue(&self, item: WorkItem) {
        self.pending.push(item);
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Atomically drains every item currently in the pending queue into a
    /// `Vec`, leaving behind whatever was pushed concurrently during the
    /// drain (those items survive for the next wave). This is the
    /// "snapshot-and-drain" step the driver repeats to fixpoint
    /// (SPEC_FULL.md §4.9).
    pub fn drain_pending(&self) -> Vec<WorkItem> {
        let mut items = Vec::new();
        while let Some(item) = self.pending.pop() {
            items.push(item);
        }
        items
    }

    /// Looks up or reserves a fresh symbol for `(source, erased_type)`.
    /// `mint` is called at most once per key even under concurrent callers:
    /// `DashMap::entry` locks the owning shard for the duration of the
    /// closure, giving exactly the first-writer-wins semantics the memo
    /// requires (SPEC_FULL.md §4.4).
    pub fn demand(&self, source: Symbol, erased_type: Type, mint: impl FnOnce() -> Symbol) -> (Symbol, bool) {
        match self.memo.entry((source, erased_type)) {
            Entry::Occupied(existing) => {
                tracing::trace!(source = %existing.key().0, "demand hit memo");
                (existing.get().clone(), false)
            }
            Entry::Vacant(slot) => {
                let fresh = mint();
                tracing::trace!(source = %slot.key().0, fresh = %fresh, "demand minted fresh symbol");
                slot.insert(fresh.clone());
                (fresh, true)
            }
        }
    }

    /// Inserts a specialized definition. Called exactly once per
    /// `fresh_sym`, immediately after a worker finishes specializing the
    /// `WorkItem` that reserved that symbol.
    pub fn store_result(&self, fresh_sym: Symbol, def: Def) {
        self.results.insert(fresh_sym, def);
    }

    /// Consumes the registry, returning the final `fresh_symbol -> Def` map
    /// that becomes the output root's `defs` table (SPEC_FULL.md §6).
    #[must_use]
    pub fn into_defs(self) -> mono_common::FxHashMap<Symbol, Def> {
        self.results.into_iter().collect()
    }

    #[must_use]
    pub fn specialization_count(&self) -> usize {
        self.results.len()
    }
}
