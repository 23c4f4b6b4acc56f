use mono_common::Symbol;
use std::sync::Arc;

/// The kind of a type variable or constant, dictating its erasure default
/// (SPEC_FULL.md §4.1). `CaseSet` carries the enum symbol the case set
/// ranges over, since "empty case set" is only meaningful relative to one
/// particular enum declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Value,
    Effect,
    RecordRow,
    SchemaRow,
    CaseSet(Symbol),
}

impl Kind {
    #[must_use]
    pub const fn is_row(&self) -> bool {
        matches!(self, Kind::RecordRow | Kind::SchemaRow)
    }

    #[must_use]
    pub const fn is_effect(&self) -> bool {
        matches!(self, Kind::Effect)
    }
}

/// A type variable, identified by a small integer id (unique across one
/// specialization run) plus the kind that determines how it erases.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVar {
    pub id: u32,
    pub kind: Kind,
}

impl TypeVar {
    #[must_use]
    pub const fn new(id: u32, kind: Kind) -> Self {
        TypeVar { id, kind }
    }
}

/// A nullary type constructor: `Int`, `List`, `Pure`, a named effect, a
/// Boolean/case-set operator (`Union`, `Complement`, ...), a record/schema
/// row constructor, or a concrete enum case tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeConstant {
    pub sym: Symbol,
    pub kind: Kind,
}

impl TypeConstant {
    #[must_use]
    pub fn new(sym: Symbol, kind: Kind) -> Self {
        TypeConstant { sym, kind }
    }
}

/// The IR's type language (SPEC_FULL.md §3). Curried application models
/// n-ary constructors and the Boolean/case-set operators uniformly; the
/// strict substitution (mono-solver) is what gives `Apply` its algebraic
/// simplification behavior once arguments are concrete.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Var(TypeVar),
    Const(TypeConstant),
    Apply(Box<Type>, Box<Type>),
    Alias { sym: Symbol, args: Vec<Type>, expansion: Box<Type> },
    AssocApply { assoc: Symbol, arg: Box<Type> },
}

impl Type {
    #[must_use]
    pub fn apply(self, arg: Type) -> Type {
        Type::Apply(Box::new(self), Box::new(arg))
    }

    /// Splits a (possibly curried) application into its head constant and
    /// the argument list in application order, used by the strict
    /// substitution to recognize Boolean/case-set operator heads.
    #[must_use]
    pub fn spine(&self) -> (&Type, Vec<&Type>) {
        let mut head = self;
        let mut args = Vec::new();
        while let Type::Apply(f, a) = head {
            args.push(a.as_ref());
            head = f;
        }
        args.reverse();
        (head, args)
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Type::Var(v) => v.kind.clone(),
            Type::Const(c) => c.kind.clone(),
            Type::Apply(f, _) => f.kind(),
            Type::Alias { expansion, .. } => expansion.kind(),
            Type::AssocApply { .. } => Kind::Value,
        }
    }

    /// Free type variables, used to mark a type-match scrutinee's variables
    /// rigid (SPEC_FULL.md §4.6) and by tests asserting erasure.
    pub fn free_vars(&self, out: &mut Vec<TypeVar>) {
        match self {
            Type::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Type::Const(_) => {}
            Type::Apply(f, a) => {
                f.free_vars(out);
                a.free_vars(out);
            }
            Type::Alias { args, expansion, .. } => {
                for a in args {
                    a.free_vars(out);
                }
                expansion.free_vars(out);
            }
            Type::AssocApply { arg, .. } => arg.free_vars(out),
        }
    }
}

/// Well-known nullary constants the pass constructs directly rather than
/// receiving from the input program (erasure defaults, the universal
/// effect, and the Boolean/case-set operator heads).
pub mod well_known {
    use super::{Kind, Type, TypeConstant};
    use mono_common::Symbol;

    fn constant(name: &str, kind: Kind) -> Type {
        Type::Const(TypeConstant::new(Symbol::unqualified(name), kind))
    }

    #[must_use]
    pub fn unit() -> Type {
        constant("Unit", Kind::Value)
    }

    #[must_use]
    pub fn pure_effect() -> Type {
        constant("Pure", Kind::Effect)
    }

    #[must_use]
    pub fn impure_effect() -> Type {
        constant("Impure", Kind::Effect)
    }

    #[must_use]
    pub fn universal_effect() -> Type {
        constant("Univ", Kind::Effect)
    }

    #[must_use]
    pub fn empty_record_row() -> Type {
        constant("{}", Kind::RecordRow)
    }

    #[must_use]
    pub fn empty_schema_row() -> Type {
        constant("<>", Kind::SchemaRow)
    }

    #[must_use]
    pub fn empty_case_set(enum_sym: Symbol) -> Type {
        constant("EmptyCase", Kind::CaseSet(enum_sym))
    }
}
