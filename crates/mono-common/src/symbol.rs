use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter backing every freshening operation in the pass (fresh
/// definition symbols minted by the registry, fresh local symbols minted by
/// the specializer). A single counter is enough: uniqueness is all that is
/// required, not any particular numbering scheme.
static NEXT_FRESH_ID: AtomicU64 = AtomicU64::new(1);

#[must_use]
pub fn next_fresh_id() -> u64 {
    NEXT_FRESH_ID.fetch_add(1, Ordering::Relaxed)
}

/// A top-level definition/signature/trait/instance/alias symbol: a namespace
/// path plus a name. Specialization mints fresh symbols by tagging the
/// source symbol's name with a fresh id, which keeps the namespace (and any
/// human-readable debugging value) intact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    namespace: Arc<[Arc<str>]>,
    name: Arc<str>,
}

impl Symbol {
    pub fn new(namespace: impl IntoIterator<Item = impl Into<Arc<str>>>, name: impl Into<Arc<str>>) -> Self {
        Symbol {
            namespace: namespace.into_iter().map(Into::into).collect(),
            name: name.into(),
        }
    }

    /// A symbol with no namespace, used for well-known built-in constants
    /// (`Unit`, `Pure`, the Boolean/case-set operator heads).
    pub fn unqualified(name: impl Into<Arc<str>>) -> Self {
        Symbol { namespace: Arc::from([]), name: name.into() }
    }

    #[must_use]
    pub fn namespace(&self) -> &[Arc<str>] {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mints a fresh top-level symbol derived from `self`, used by the
    /// registry (C4) when specializing a definition and by the trait
    /// resolver (C5) when synthesizing a definition from a default body.
    #[must_use]
    pub fn freshen(&self) -> Symbol {
        let id = next_fresh_id();
        Symbol {
            namespace: self.namespace.clone(),
            name: Arc::from(format!("{}${id}", self.name)),
        }
    }

    /// Appends a path segment, used by the trait resolver to build the
    /// synthesized namespace `trait.namespace ++ [trait.name]` for a default
    /// body (SPEC_FULL.md §4.5).
    #[must_use]
    pub fn nested(&self, segment: impl Into<Arc<str>>) -> Symbol {
        let mut namespace: Vec<Arc<str>> = self.namespace.iter().cloned().collect();
        namespace.push(self.name.clone());
        Symbol { namespace: namespace.into(), name: segment.into() }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in self.namespace.iter() {
            write!(f, "{segment}.")?;
        }
        write!(f, "{}", self.name)
    }
}

/// A local binder (let/lambda/pattern/handler/catch) within one definition's
/// body. Identity is the id alone; `hint` exists only so panics and tests
/// read as something other than opaque integers.
#[derive(Clone, Debug)]
pub struct LocalSymbol {
    id: u64,
    hint: Arc<str>,
}

impl LocalSymbol {
    #[must_use]
    pub fn fresh(hint: impl Into<Arc<str>>) -> Self {
        LocalSymbol { id: next_fresh_id(), hint: hint.into() }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn hint(&self) -> &str {
        &self.hint
    }
}

impl PartialEq for LocalSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LocalSymbol {}

impl std::hash::Hash for LocalSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for LocalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.hint, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshen_changes_name_but_keeps_namespace() {
        let sym = Symbol::new(["List"], "fst");
        let fresh = sym.freshen();
        assert_eq!(fresh.namespace(), sym.namespace());
        assert_ne!(fresh.name(), sym.name());
        assert!(fresh.name().starts_with("fst$"));
    }

    #[test]
    fn nested_appends_trait_name_to_namespace() {
        let trait_sym = Symbol::new(["prelude"], "Greet");
        let nested = trait_sym.nested("greet");
        assert_eq!(nested.namespace(), [Arc::<str>::from("prelude"), Arc::from("Greet")]);
        assert_eq!(nested.name(), "greet");
    }

    #[test]
    fn local_symbols_compare_by_id_not_hint() {
        let a = LocalSymbol::fresh("x");
        let b = LocalSymbol::fresh("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
