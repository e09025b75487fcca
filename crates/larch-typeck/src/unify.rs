//! The unification engine.
//!
//! Solves a constraint list into an ordered substitution, or fails on the
//! first unsatisfiable constraint. Constraints are processed head to
//! tail; every newly discovered substitution pair is applied eagerly to
//! all remaining constraints so later ones are seen in their simplified
//! form. The occurs check rejects infinite (recursive) types.

use std::collections::VecDeque;
use std::fmt;

use larch_common::span::Span;

use crate::error::{TypeError, TypeErrorKind};
use crate::ty::{Ty, TyVar};

/// An equation between two types, pending unification.
///
/// The equation is unordered; lhs/rhs only fix a processing order for
/// reproducible diagnostics. The span records the expression that
/// generated the constraint and never affects solving.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub lhs: Ty,
    pub rhs: Ty,
    pub span: Span,
}

impl Constraint {
    pub fn new(lhs: Ty, rhs: Ty, span: Span) -> Self {
        Self { lhs, rhs, span }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// An ordered list of variable-to-type rewrites.
///
/// Application order matters: later pairs may refer to variables
/// introduced by earlier ones. Applying the finished substitution twice
/// yields the same result as applying it once (eager application during
/// solving keeps bound variables out of later pairs).
#[derive(Debug, Default, Clone)]
pub struct Subst {
    pairs: Vec<(TyVar, Ty)>,
}

impl Subst {
    /// Append a rewrite pair.
    fn push(&mut self, var: TyVar, ty: Ty) {
        self.pairs.push((var, ty));
    }

    /// Rewrite the target in place, one pair at a time, in order.
    pub fn apply(&self, ty: &mut Ty) {
        for (var, replacement) in &self.pairs {
            ty.substitute(var, replacement);
        }
    }

    /// The rewrite pairs, in application order.
    pub fn pairs(&self) -> &[(TyVar, Ty)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Solve a constraint list into a substitution.
///
/// Fails with `Mismatch` on incompatible concrete heads, `ArityMismatch`
/// on function types of different arity, and `InfiniteType` when a
/// variable would be bound to a type containing itself.
pub fn unify(constraints: Vec<Constraint>) -> Result<Subst, TypeError> {
    let mut queue: VecDeque<Constraint> = constraints.into();
    let mut subst = Subst::default();

    while let Some(Constraint { lhs, rhs, span }) = queue.pop_front() {
        match (lhs, rhs) {
            // Identical simple types carry no information.
            (Ty::Int, Ty::Int) | (Ty::Bool, Ty::Bool) | (Ty::Str, Ty::Str) => {}

            // The same variable on both sides.
            (Ty::Generic(x), Ty::Generic(y)) if x == y => {}

            // Variable elimination, with occurs check.
            (Ty::Generic(var), ty) | (ty, Ty::Generic(var)) => {
                if ty.occurs(&var) {
                    return Err(TypeError::new(
                        TypeErrorKind::InfiniteType { var, ty },
                        span,
                    ));
                }
                // Eager: later constraints see the simplified form.
                for pending in queue.iter_mut() {
                    pending.lhs.substitute(&var, &ty);
                    pending.rhs.substitute(&var, &ty);
                }
                subst.push(var, ty);
            }

            // Function types decompose into return + argument equations,
            // processed return first.
            (Ty::Func(params1, ret1), Ty::Func(params2, ret2)) => {
                if params1.len() != params2.len() {
                    return Err(TypeError::new(
                        TypeErrorKind::ArityMismatch {
                            expected: params1.len(),
                            found: params2.len(),
                        },
                        span,
                    ));
                }
                let mut smaller = vec![Constraint::new(*ret1, *ret2, span)];
                smaller.extend(
                    params1
                        .into_iter()
                        .zip(params2)
                        .map(|(a, b)| Constraint::new(a, b, span)),
                );
                for constraint in smaller.into_iter().rev() {
                    queue.push_front(constraint);
                }
            }

            // Record types decompose field-wise, ascending field name.
            (Ty::Record(fields1), Ty::Record(fields2)) => {
                let same_fields = fields1.len() == fields2.len()
                    && fields1.keys().zip(fields2.keys()).all(|(a, b)| a == b);
                if !same_fields {
                    return Err(TypeError::new(
                        TypeErrorKind::Mismatch {
                            expected: Ty::Record(fields1),
                            found: Ty::Record(fields2),
                        },
                        span,
                    ));
                }
                let per_field: Vec<Constraint> = fields1
                    .into_values()
                    .zip(fields2.into_values())
                    .map(|(a, b)| Constraint::new(a, b, span))
                    .collect();
                for constraint in per_field.into_iter().rev() {
                    queue.push_front(constraint);
                }
            }

            // Incompatible heads.
            (lhs, rhs) => {
                return Err(TypeError::new(
                    TypeErrorKind::Mismatch {
                        expected: lhs,
                        found: rhs,
                    },
                    span,
                ));
            }
        }
    }

    Ok(subst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::structural_eq;

    fn span() -> Span {
        Span::point(0)
    }

    fn var(id: u32) -> TyVar {
        TyVar { id, label: None }
    }

    fn constraint(lhs: Ty, rhs: Ty) -> Constraint {
        Constraint::new(lhs, rhs, span())
    }

    #[test]
    fn empty_set_gives_empty_substitution() {
        let subst = unify(Vec::new()).unwrap();
        assert!(subst.is_empty());
    }

    #[test]
    fn trivial_constraints_are_dropped() {
        let subst = unify(vec![
            constraint(Ty::Int, Ty::Int),
            constraint(Ty::Generic(var(1)), Ty::Generic(var(1))),
        ])
        .unwrap();
        assert!(subst.is_empty());
    }

    #[test]
    fn variable_binds_to_concrete_type() {
        let subst = unify(vec![constraint(Ty::Generic(var(1)), Ty::Int)]).unwrap();
        let mut ty = Ty::Generic(var(1));
        subst.apply(&mut ty);
        assert_eq!(ty, Ty::Int);
    }

    #[test]
    fn symmetric_variable_binding() {
        let subst = unify(vec![constraint(Ty::Bool, Ty::Generic(var(2)))]).unwrap();
        let mut ty = Ty::Generic(var(2));
        subst.apply(&mut ty);
        assert_eq!(ty, Ty::Bool);
    }

    #[test]
    fn eager_application_simplifies_later_constraints() {
        // ?1 = Int, then ?2 = ?1: the second constraint must see Int.
        let subst = unify(vec![
            constraint(Ty::Generic(var(1)), Ty::Int),
            constraint(Ty::Generic(var(2)), Ty::Generic(var(1))),
        ])
        .unwrap();
        let mut ty = Ty::Generic(var(2));
        subst.apply(&mut ty);
        assert_eq!(ty, Ty::Int);
    }

    #[test]
    fn function_types_decompose() {
        // (?1) -> Bool = (Int) -> ?2
        let subst = unify(vec![constraint(
            Ty::func(vec![Ty::Generic(var(1))], Ty::Bool),
            Ty::func(vec![Ty::Int], Ty::Generic(var(2))),
        )])
        .unwrap();
        let mut arg = Ty::Generic(var(1));
        let mut ret = Ty::Generic(var(2));
        subst.apply(&mut arg);
        subst.apply(&mut ret);
        assert_eq!(arg, Ty::Int);
        assert_eq!(ret, Ty::Bool);
    }

    #[test]
    fn function_return_is_unified_before_arguments() {
        // Both sides constrain ?1; the return pair is processed first, so
        // the substitution's first entry binds ?1 via the returns.
        let subst = unify(vec![constraint(
            Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(1))),
            Ty::func(vec![Ty::Generic(var(2))], Ty::Bool),
        )])
        .unwrap();
        let (first_var, first_ty) = &subst.pairs()[0];
        assert_eq!(first_var.id, 1);
        assert_eq!(first_ty, &Ty::Bool);
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let err = unify(vec![constraint(
            Ty::func(vec![Ty::Int], Ty::Int),
            Ty::func(vec![Ty::Int, Ty::Int], Ty::Int),
        )])
        .unwrap_err();
        assert_eq!(
            err.kind,
            TypeErrorKind::ArityMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn concrete_mismatch_is_rejected() {
        let err = unify(vec![constraint(Ty::Int, Ty::Bool)]).unwrap_err();
        assert!(matches!(err.kind, TypeErrorKind::Mismatch { .. }));
    }

    #[test]
    fn occurs_check_rejects_infinite_types() {
        // ?1 = (?1) -> ?2
        let err = unify(vec![constraint(
            Ty::Generic(var(1)),
            Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(2))),
        )])
        .unwrap_err();
        assert!(matches!(err.kind, TypeErrorKind::InfiniteType { .. }));
    }

    #[test]
    fn records_unify_field_wise() {
        let a = Ty::record([
            ("x".to_string(), Ty::Generic(var(1))),
            ("y".to_string(), Ty::Bool),
        ]);
        let b = Ty::record([
            ("y".to_string(), Ty::Generic(var(2))),
            ("x".to_string(), Ty::Int),
        ]);
        let subst = unify(vec![constraint(a, b)]).unwrap();
        let mut x = Ty::Generic(var(1));
        let mut y = Ty::Generic(var(2));
        subst.apply(&mut x);
        subst.apply(&mut y);
        assert_eq!(x, Ty::Int);
        assert_eq!(y, Ty::Bool);
    }

    #[test]
    fn records_with_different_fields_are_rejected() {
        let a = Ty::record([("x".to_string(), Ty::Int)]);
        let b = Ty::record([("y".to_string(), Ty::Int)]);
        assert!(unify(vec![constraint(a, b)]).is_err());
    }

    #[test]
    fn substitution_is_idempotent() {
        let subst = unify(vec![
            constraint(
                Ty::Generic(var(1)),
                Ty::func(vec![Ty::Generic(var(2))], Ty::Generic(var(3))),
            ),
            constraint(Ty::Generic(var(2)), Ty::Int),
            constraint(Ty::Generic(var(3)), Ty::Generic(var(2))),
        ])
        .unwrap();

        let mut once = Ty::func(vec![Ty::Generic(var(1))], Ty::Generic(var(3)));
        subst.apply(&mut once);
        let mut twice = once.clone();
        subst.apply(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn solved_substitution_unifies_the_original_constraints() {
        let original = vec![
            constraint(
                Ty::Generic(var(1)),
                Ty::func(vec![Ty::Generic(var(2))], Ty::Bool),
            ),
            constraint(Ty::Generic(var(2)), Ty::Int),
        ];
        let subst = unify(original.clone()).unwrap();
        for c in &original {
            let mut lhs = c.lhs.clone();
            let mut rhs = c.rhs.clone();
            subst.apply(&mut lhs);
            subst.apply(&mut rhs);
            assert!(
                structural_eq(&lhs, &rhs),
                "substitution does not unify `{}`",
                c
            );
        }
    }
}
