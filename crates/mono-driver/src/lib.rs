//! The driver (C7) and the pass's ambient configuration/observability
//! surface (C9): seeds the registry with every non-parametric definition,
//! drains the pending queue to a fixpoint in parallel waves, and assembles
//! the output root (SPEC_FULL.md §4.9-§4.10).

use mono_ast::{Def, Root};
use mono_registry::{Registry, WorkItem};
use mono_solver::StrictSubst;
use mono_specialize::SpecCtx;

/// The pass's only externally-visible knob. `parallel = true` (the
/// default) runs each wave on `rayon`'s global thread pool; `parallel =
/// false` runs it in-process so tests can assert deterministic wave counts
/// without fighting scheduler nondeterminism (SPEC_FULL.md §4.9).
#[derive(Clone, Copy, Debug)]
pub struct PassOptions {
    pub parallel: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        PassOptions { parallel: true }
    }
}

/// Small summary struct returned alongside the output root, mirroring the
/// teacher's practice of returning stats from batch phases rather than
/// threading global counters through the caller (SPEC_FULL.md §4.10).
#[derive(Clone, Copy, Debug, Default)]
pub struct PassStats {
    pub defs_seeded: usize,
    pub waves_run: usize,
    pub specializations_minted: usize,
    pub trait_resolutions_performed: usize,
}

pub struct Driver;

impl Driver {
    /// Runs the whole-program monomorphization pass over `root`.
    pub fn run(root: &Root, options: PassOptions) -> (Root, PassStats) {
        let registry = Registry::new();
        let ctx = SpecCtx::new(root, &registry);

        let seed_items = seed(root, &registry);
        let defs_seeded = seed_items.len();
        tracing::debug!(defs_seeded, parallel = options.parallel, "seeding registry with non-parametric definitions");

        let mut waves_run = 0;
        let mut next_wave = seed_items;
        while !next_wave.is_empty() {
            waves_run += 1;
            tracing::debug_span!("wave", wave = waves_run, items = next_wave.len()).in_scope(|| {
                run_wave(&ctx, next_wave, options.parallel);
            });
            next_wave = registry.drain_pending();
        }

        let stats = PassStats {
            defs_seeded,
            waves_run,
            specializations_minted: registry.specialization_count(),
            trait_resolutions_performed: ctx.trait_resolutions(),
        };
        let output = Root::from_defs(registry.into_defs());
        (output, stats)
    }
}

/// Demands a specialization of every non-parametric definition against its
/// own (already concrete) scheme base, keyed through the registry's memo so
/// that later references to the same `(def, type)` pair reuse the seed's
/// fresh symbol instead of re-specializing (SPEC_FULL.md §4.9 step 2).
fn seed(root: &Root, registry: &Registry) -> Vec<WorkItem> {
    root.non_parametric_defs()
        .map(|def: &Def| {
            let erased = mono_solver::erase(&root.eq_env, def.spec.loc, &def.spec.scheme.base);
            let (fresh_sym, _is_new) = registry.demand(def.sym.clone(), erased, || def.sym.freshen());
            WorkItem { fresh_sym, def: def.clone(), subst: StrictSubst::empty() }
        })
        .collect()
}

fn run_wave(ctx: &SpecCtx, items: Vec<WorkItem>, parallel: bool) {
    if parallel {
        use rayon::prelude::*;
        items.into_par_iter().for_each(|item| specialize_and_store(ctx, item));
    } else {
        for item in items {
            specialize_and_store(ctx, item);
        }
    }
}

fn specialize_and_store(ctx: &SpecCtx, item: WorkItem) {
    let fresh_sym = item.fresh_sym.clone();
    tracing::trace!(sym = %fresh_sym, "specializing");
    let specialized = mono_specialize::specialize_work_item(ctx, item);
    ctx.registry.store_result(fresh_sym, specialized);
}

/// Free-function entry point for callers who don't need the `Driver` type
/// itself (SPEC_FULL.md §6: "the crate exposes a single Rust API entry
/// point (`run_pass` / `Driver::run`)").
pub fn run_pass(root: &Root, options: PassOptions) -> (Root, PassStats) {
    Driver::run(root, options)
}
