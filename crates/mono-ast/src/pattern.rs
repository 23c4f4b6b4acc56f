use crate::expr::Constant;
use crate::types::Type;
use mono_common::{LocalSymbol, SourceLoc, Symbol};
use std::sync::Arc;

/// Patterns (SPEC_FULL.md §3). Record patterns use a label sequence plus a
/// tail, matching how row-typed records are described in the type system:
/// `{name: p, ...tail}` rather than a fixed-arity tuple of fields.
#[derive(Clone, Debug)]
pub enum Pattern {
    Wildcard { tpe: Type, loc: SourceLoc },
    Var { sym: LocalSymbol, tpe: Type, loc: SourceLoc },
    Constant { value: Constant, tpe: Type, loc: SourceLoc },
    Tag { sym: Symbol, arg: Box<Pattern>, tpe: Type, loc: SourceLoc },
    Tuple { elems: Vec<Pattern>, tpe: Type, loc: SourceLoc },
    Record { labels: Vec<(Arc<str>, Pattern)>, tail: Box<Pattern>, tpe: Type, loc: SourceLoc },
    EmptyRecord { tpe: Type, loc: SourceLoc },
}

impl Pattern {
    #[must_use]
    pub fn tpe(&self) -> &Type {
        match self {
            Pattern::Wildcard { tpe, .. }
            | Pattern::Var { tpe, .. }
            | Pattern::Constant { tpe, .. }
            | Pattern::Tag { tpe, .. }
            | Pattern::Tuple { tpe, .. }
            | Pattern::Record { tpe, .. }
            | Pattern::EmptyRecord { tpe, .. } => tpe,
        }
    }

    #[must_use]
    pub fn loc(&self) -> SourceLoc {
        match self {
            Pattern::Wildcard { loc, .. }
            | Pattern::Var { loc, .. }
            | Pattern::Constant { loc, .. }
            | Pattern::Tag { loc, .. }
            | Pattern::Tuple { loc, .. }
            | Pattern::Record { loc, .. }
            | Pattern::EmptyRecord { loc, .. } => *loc,
        }
    }
}
