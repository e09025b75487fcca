//! Type representation for the Larch type system.
//!
//! Defines the core `Ty` enum: primitive types, function types, record
//! types, type variables (`Generic`), and polymorphic type schemes. These
//! form the foundation of Hindley-Milner type inference.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;

/// Process-wide source of type-variable ids. Monotonic, seeded at 1.
static TYVAR_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Reset the type-variable id counter.
///
/// Test hook only: lets a test case start from id 1 so ids are
/// reproducible. Production inference never resets.
pub fn reset_tyvar_counter() {
    TYVAR_COUNTER.store(1, Ordering::SeqCst);
}

/// A type variable. Stands for an unknown type until unification
/// resolves it or generalization quantifies it.
///
/// Two `TyVar`s are equal iff their ids are equal. The `label` field is a
/// debug note recording where the variable was minted ("if expression",
/// "argument x of foo", ...) and is intentionally excluded from equality
/// and hashing to preserve type identity semantics.
#[derive(Debug, Clone)]
pub struct TyVar {
    pub id: u32,
    /// Where this variable came from. Display/debug only.
    pub label: Option<String>,
}

impl TyVar {
    /// Mint a fresh variable with an id never issued before in this
    /// process.
    pub fn fresh(label: impl Into<String>) -> Self {
        TyVar {
            id: TYVAR_COUNTER.fetch_add(1, Ordering::SeqCst),
            label: Some(label.into()),
        }
    }
}

impl PartialEq for TyVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id // label intentionally excluded
    }
}

impl Eq for TyVar {}

impl std::hash::Hash for TyVar {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state); // label intentionally excluded
    }
}

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.id)
    }
}

/// A Larch type.
///
/// - `Int`, `Bool`, `Str`: the primitive ("simple") types
/// - `Func`: a function type with fixed arity
/// - `Record`: a mapping from field name to type; field order irrelevant
/// - `Generic`: an inference variable
/// - `Scheme`: a universally quantified type. Schemes never nest: a
///   scheme only ever lives in the scope stack, bound to a name, and its
///   body never contains another scheme.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Int,
    Bool,
    Str,
    /// `(param_types) -> return_type`. Arity is fixed at construction.
    Func(Vec<Ty>, Box<Ty>),
    /// Field name to type. `BTreeMap` gives order-independent equality
    /// and sorted iteration.
    Record(BTreeMap<String, Ty>),
    /// A type variable (unresolved during inference).
    Generic(TyVar),
    /// `forall vars. body`.
    Scheme(Vec<TyVar>, Box<Ty>),
}

impl Ty {
    /// Create a function type.
    pub fn func(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Func(params, Box::new(ret))
    }

    /// Create a record type from (name, type) pairs.
    pub fn record(fields: impl IntoIterator<Item = (String, Ty)>) -> Ty {
        Ty::Record(fields.into_iter().collect())
    }

    /// Whether this is one of the atomic, self-equal primitive types.
    pub fn is_simple(&self) -> bool {
        matches!(self, Ty::Int | Ty::Bool | Ty::Str)
    }

    /// Whether the given variable appears anywhere in this type.
    pub fn occurs(&self, var: &TyVar) -> bool {
        match self {
            Ty::Int | Ty::Bool | Ty::Str => false,
            Ty::Generic(v) => v == var,
            Ty::Func(params, ret) => {
                params.iter().any(|p| p.occurs(var)) || ret.occurs(var)
            }
            Ty::Record(fields) => fields.values().any(|t| t.occurs(var)),
            Ty::Scheme(_, body) => body.occurs(var),
        }
    }

    /// Pre-order traversal exposing every sub-type by mutable reference.
    ///
    /// The visitor runs on a node before its children, so a replacement
    /// installed by the visitor is traversed too.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Ty)) {
        visit(self);
        match self {
            Ty::Int | Ty::Bool | Ty::Str | Ty::Generic(_) => {}
            Ty::Func(params, ret) => {
                for p in params.iter_mut() {
                    p.walk_mut(visit);
                }
                ret.walk_mut(visit);
            }
            Ty::Record(fields) => {
                for t in fields.values_mut() {
                    t.walk_mut(visit);
                }
            }
            Ty::Scheme(_, body) => body.walk_mut(visit),
        }
    }

    /// Rewrite every occurrence of `var` to a clone of `replacement`.
    pub fn substitute(&mut self, var: &TyVar, replacement: &Ty) {
        self.walk_mut(&mut |ty| {
            if let Ty::Generic(v) = ty {
                if v == var {
                    *ty = replacement.clone();
                }
            }
        });
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Int => write!(f, "Int"),
            Ty::Bool => write!(f, "Bool"),
            Ty::Str => write!(f, "String"),
            Ty::Func(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Ty::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}}")
            }
            Ty::Generic(v) => write!(f, "{}", v),
            Ty::Scheme(vars, body) => {
                write!(f, "forall")?;
                for v in vars {
                    write!(f, " {}", v)?;
                }
                write!(f, ". {}", body)
            }
        }
    }
}

/// Structural equality: two types are structurally equal if a bijection
/// between the `Generic` ids occurring in `a` and those in `b` turns `a`
/// into `b`.
///
/// Nominal equality (`==`) requires identical ids; structural equality is
/// the id-insensitive variant used by tests, where absolute ids depend on
/// how much inference ran before.
pub fn structural_eq(a: &Ty, b: &Ty) -> bool {
    let mut fwd = FxHashMap::default();
    let mut bwd = FxHashMap::default();
    structural_eq_in(a, b, &mut fwd, &mut bwd)
}

/// Pairwise structural equality over two type lists, sharing a single
/// bijection (equivalent variables must map consistently across entries).
pub fn list_structural_eq(a: &[Ty], b: &[Ty]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut fwd = FxHashMap::default();
    let mut bwd = FxHashMap::default();
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| structural_eq_in(x, y, &mut fwd, &mut bwd))
}

fn bind_var(x: u32, y: u32, fwd: &mut FxHashMap<u32, u32>, bwd: &mut FxHashMap<u32, u32>) -> bool {
    match (fwd.get(&x), bwd.get(&y)) {
        (None, None) => {
            fwd.insert(x, y);
            bwd.insert(y, x);
            true
        }
        (Some(&mapped), Some(&unmapped)) => mapped == y && unmapped == x,
        _ => false,
    }
}

fn structural_eq_in(
    a: &Ty,
    b: &Ty,
    fwd: &mut FxHashMap<u32, u32>,
    bwd: &mut FxHashMap<u32, u32>,
) -> bool {
    match (a, b) {
        (Ty::Int, Ty::Int) | (Ty::Bool, Ty::Bool) | (Ty::Str, Ty::Str) => true,
        (Ty::Generic(x), Ty::Generic(y)) => bind_var(x.id, y.id, fwd, bwd),
        (Ty::Func(p1, r1), Ty::Func(p2, r2)) => {
            p1.len() == p2.len()
                && p1
                    .iter()
                    .zip(p2.iter())
                    .all(|(x, y)| structural_eq_in(x, y, fwd, bwd))
                && structural_eq_in(r1, r2, fwd, bwd)
        }
        (Ty::Record(f1), Ty::Record(f2)) => {
            f1.len() == f2.len()
                && f1.iter().zip(f2.iter()).all(|((n1, t1), (n2, t2))| {
                    n1 == n2 && structural_eq_in(t1, t2, fwd, bwd)
                })
        }
        (Ty::Scheme(v1, b1), Ty::Scheme(v2, b2)) => {
            v1.len() == v2.len()
                && v1
                    .iter()
                    .zip(v2.iter())
                    .all(|(x, y)| bind_var(x.id, y.id, fwd, bwd))
                && structural_eq_in(b1, b2, fwd, bwd)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: u32) -> TyVar {
        TyVar { id, label: None }
    }

    #[test]
    fn fresh_vars_have_distinct_ids() {
        let a = TyVar::fresh("a");
        let b = TyVar::fresh("b");
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn tyvar_equality_ignores_label() {
        let a = TyVar { id: 7, label: Some("one".into()) };
        let b = TyVar { id: 7, label: Some("another".into()) };
        assert_eq!(a, b);
    }

    #[test]
    fn nominal_equality_requires_same_id() {
        assert_eq!(Ty::Generic(var(1)), Ty::Generic(var(1)));
        assert_ne!(Ty::Generic(var(1)), Ty::Generic(var(2)));
        assert_eq!(Ty::Int, Ty::Int);
        assert_ne!(Ty::Int, Ty::Bool);
    }

    #[test]
    fn record_equality_ignores_insertion_order() {
        let a = Ty::record([("x".to_string(), Ty::Int), ("y".to_string(), Ty::Bool)]);
        let b = Ty::record([("y".to_string(), Ty::Bool), ("x".to_string(), Ty::Int)]);
        assert_eq!(a, b);
    }

    #[test]
    fn func_equality_requires_equal_arity() {
        let one = Ty::func(vec![Ty::Int], Ty::Int);
        let two = Ty::func(vec![Ty::Int, Ty::Int], Ty::Int);
        assert_ne!(one, two);
    }

    #[test]
    fn occurs_finds_nested_variables() {
        let v = var(3);
        let ty = Ty::func(vec![Ty::Int], Ty::Generic(v.clone()));
        assert!(ty.occurs(&v));
        assert!(!ty.occurs(&var(4)));
        assert!(!Ty::Int.occurs(&v));
    }

    #[test]
    fn substitute_rewrites_all_occurrences() {
        let v = var(1);
        let mut ty = Ty::func(
            vec![Ty::Generic(v.clone()), Ty::Int],
            Ty::Generic(v.clone()),
        );
        ty.substitute(&v, &Ty::Bool);
        assert_eq!(ty, Ty::func(vec![Ty::Bool, Ty::Int], Ty::Bool));
    }

    #[test]
    fn substitute_reaches_record_fields() {
        let v = var(9);
        let mut ty = Ty::record([("a".to_string(), Ty::Generic(v.clone()))]);
        ty.substitute(&v, &Ty::Str);
        assert_eq!(ty, Ty::record([("a".to_string(), Ty::Str)]));
    }

    #[test]
    fn structural_eq_is_reflexive() {
        let ty = Ty::func(vec![Ty::Generic(var(5))], Ty::Generic(var(5)));
        assert!(structural_eq(&ty, &ty));
    }

    #[test]
    fn structural_eq_renames_consistently() {
        // ?1 -> ?1 is structurally equal to ?2 -> ?2 ...
        let a = Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(1)));
        let b = Ty::func(vec![Ty::Generic(var(2))], Ty::Generic(var(2)));
        assert!(structural_eq(&a, &b));
        assert!(structural_eq(&b, &a));

        // ... but not to ?2 -> ?3: the bijection must be consistent.
        let c = Ty::func(vec![Ty::Generic(var(2))], Ty::Generic(var(3)));
        assert!(!structural_eq(&a, &c));
    }

    #[test]
    fn structural_eq_requires_a_bijection() {
        // ?1 -> ?2 vs ?3 -> ?3: distinct vars cannot both map to ?3.
        let a = Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(2)));
        let b = Ty::func(vec![Ty::Generic(var(3))], Ty::Generic(var(3)));
        assert!(!structural_eq(&a, &b));
        assert!(!structural_eq(&b, &a));
    }

    #[test]
    fn list_structural_eq_shares_the_bijection() {
        // [?1, ?1] vs [?2, ?2] -- consistent.
        assert!(list_structural_eq(
            &[Ty::Generic(var(1)), Ty::Generic(var(1))],
            &[Ty::Generic(var(2)), Ty::Generic(var(2))],
        ));
        // [?1, ?1] vs [?2, ?3] -- ?1 cannot map to both.
        assert!(!list_structural_eq(
            &[Ty::Generic(var(1)), Ty::Generic(var(1))],
            &[Ty::Generic(var(2)), Ty::Generic(var(3))],
        ));
    }

    #[test]
    fn display_formats() {
        assert_eq!(format!("{}", Ty::Int), "Int");
        assert_eq!(format!("{}", Ty::Str), "String");
        assert_eq!(
            format!("{}", Ty::func(vec![Ty::Int, Ty::Bool], Ty::Str)),
            "(Int, Bool) -> String"
        );
        assert_eq!(format!("{}", Ty::Generic(var(4))), "?4");
        assert_eq!(
            format!(
                "{}",
                Ty::Scheme(
                    vec![var(1)],
                    Box::new(Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(1))))
                )
            ),
            "forall ?1. (?1) -> ?1"
        );
        assert_eq!(
            format!(
                "{}",
                Ty::record([("x".to_string(), Ty::Int), ("y".to_string(), Ty::Bool)])
            ),
            "{x: Int, y: Bool}"
        );
    }
}
