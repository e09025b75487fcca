//! Constraint generation and the top-level driver.
//!
//! A syntax-directed walk of the AST produces, for each node, its type
//! over fresh variables, an appended set of equality constraints, and the
//! list of variables the node introduced. The driver solves the
//! constraints per top-level item and extends the global scope between
//! items.
//!
//! Notation for the rules implemented here, from the literature:
//!
//! ```text
//! env |- e : t -| C
//! ```
//!
//! read "in environment `env`, expression `e` has type `t`, generating
//! constraint set `C`". A literal generates no constraints; an `if`
//! generates `t_cond = Bool` plus one equation per branch against a fresh
//! result variable; an application `(f x1 .. xn)` generates
//! `t_f = (t_x1, .., t_xn) -> 'a` for fresh `'a`.

use larch_parser::ast::Expr;
use rustc_hash::FxHashMap;

use crate::env::ScopeStack;
use crate::error::{TypeError, TypeErrorKind};
use crate::generalize::{generalize, instantiate, quantify};
use crate::ty::{Ty, TyVar};
use crate::unify::{unify, Constraint};

/// The driver's output: top-level name to resolved type (a scheme for
/// polymorphic definitions, a monomorphic type otherwise).
pub type SymbolTable = FxHashMap<String, Ty>;

/// The result of checking a whole program.
#[derive(Debug)]
pub struct TypeckResult {
    /// Top-level definitions.
    pub symbols: SymbolTable,
    /// The type of the last bare (non-definition) top-level expression,
    /// if the program has one.
    pub result_type: Option<Ty>,
}

/// Type-check a program: infer each top-level item in order, extending
/// the global scope after each function definition.
///
/// The first error aborts checking.
pub fn check(program: &[Expr]) -> Result<TypeckResult, TypeError> {
    let mut scope = ScopeStack::new();
    let mut result_type = None;

    for expr in program {
        let (ty, introduced) = infer_in(&mut scope, expr)?;
        match expr {
            Expr::FuncDef(def) => {
                let bound = quantify(ty, &introduced);
                if !scope.define(&def.name, bound) {
                    return Err(TypeError::new(
                        TypeErrorKind::AlreadyDefined {
                            name: def.name.clone(),
                        },
                        def.span,
                    )
                    .with_expr(expr));
                }
            }
            _ => result_type = Some(ty),
        }
    }

    Ok(TypeckResult {
        symbols: scope.into_root(),
        result_type,
    })
}

/// Infer the type of a single expression against an empty scope.
pub fn infer(expr: &Expr) -> Result<Ty, TypeError> {
    let mut scope = ScopeStack::new();
    infer_in(&mut scope, expr).map(|(ty, _)| ty)
}

/// Generate constraints for one item, solve them, and apply the
/// resulting substitution. Returns the resolved type together with the
/// variables the item introduced (the driver quantifies over survivors).
fn infer_in(scope: &mut ScopeStack, expr: &Expr) -> Result<(Ty, Vec<TyVar>), TypeError> {
    let mut constraints = Vec::new();
    let (mut ty, introduced) =
        gen_constraints(scope, &mut constraints, expr).map_err(|e| e.with_expr(expr))?;
    let subst = unify(constraints).map_err(|e| e.with_expr(expr))?;
    subst.apply(&mut ty);
    Ok((ty, introduced))
}

/// The constraint generator.
///
/// Given the scope stack and a node, produce the node's type, append the
/// node's constraints to `constraints`, and return the fresh variables
/// introduced by the node and its descendants. Sub-expressions are
/// processed left to right and constraints appended in that order, so
/// diagnostics are reproducible.
pub fn gen_constraints(
    scope: &mut ScopeStack,
    constraints: &mut Vec<Constraint>,
    expr: &Expr,
) -> Result<(Ty, Vec<TyVar>), TypeError> {
    match expr {
        // Literals have known types and generate nothing.
        Expr::IntLiteral(_) => Ok((Ty::Int, Vec::new())),
        Expr::BoolLiteral(_) => Ok((Ty::Bool, Vec::new())),
        Expr::StrLiteral(_) => Ok((Ty::Str, Vec::new())),

        Expr::Symbol(sym) => {
            let ty = instantiate(scope, &sym.name, sym.span)?;
            Ok((ty, Vec::new()))
        }

        Expr::If(node) => {
            let result = TyVar::fresh("if expression");

            let (cond_ty, mut introduced) = gen_constraints(scope, constraints, &node.condition)?;
            let (cons_ty, gen1) = gen_constraints(scope, constraints, &node.consequence)?;
            introduced.extend(gen1);
            let (alt_ty, gen2) = gen_constraints(scope, constraints, &node.alternative)?;
            introduced.extend(gen2);

            constraints.push(Constraint::new(cond_ty, Ty::Bool, node.condition.span()));
            constraints.push(Constraint::new(
                Ty::Generic(result.clone()),
                cons_ty,
                node.span,
            ));
            constraints.push(Constraint::new(
                Ty::Generic(result.clone()),
                alt_ty,
                node.span,
            ));

            introduced.push(result.clone());
            Ok((Ty::Generic(result), introduced))
        }

        Expr::Form(node) => {
            let Some((callee, args)) = node.children.split_first() else {
                return Err(TypeError::new(
                    TypeErrorKind::MalformedAst {
                        reason: "application with no callee".into(),
                    },
                    node.span,
                ));
            };

            let (callee_ty, mut introduced) = gen_constraints(scope, constraints, callee)?;

            let mut arg_tys = Vec::with_capacity(args.len());
            for arg in args {
                let (arg_ty, gen1) = gen_constraints(scope, constraints, arg)?;
                introduced.extend(gen1);
                arg_tys.push(arg_ty);
            }

            let result = TyVar::fresh("application result");
            constraints.push(Constraint::new(
                callee_ty,
                Ty::func(arg_tys, Ty::Generic(result.clone())),
                node.span,
            ));

            introduced.push(result.clone());
            Ok((Ty::Generic(result), introduced))
        }

        Expr::Fn(node) => {
            let arg = TyVar::fresh("fn argument");

            scope.push_scope();
            let result = (|| {
                if !scope.define(&node.arg, Ty::Generic(arg.clone())) {
                    return Err(TypeError::new(
                        TypeErrorKind::AlreadyDefined {
                            name: node.arg.clone(),
                        },
                        node.span,
                    ));
                }
                gen_constraints(scope, constraints, &node.body)
            })();
            scope.pop_scope();

            let (body_ty, mut introduced) = result?;
            introduced.push(arg.clone());
            Ok((Ty::func(vec![Ty::Generic(arg)], body_ty), introduced))
        }

        // A named definition. The body is a sequence; the last
        // expression's type is the function's result. The definition's
        // own name is not visible in the body: top-level recursion is
        // not supported.
        Expr::FuncDef(node) => {
            if node.body.is_empty() {
                return Err(TypeError::new(
                    TypeErrorKind::MalformedAst {
                        reason: format!("function `{}` has an empty body", node.name),
                    },
                    node.span,
                ));
            }

            let arg_vars: Vec<TyVar> = node
                .args
                .iter()
                .map(|arg| TyVar::fresh(format!("argument {} of {}", arg, node.name)))
                .collect();

            scope.push_scope();
            let result = (|| {
                for (arg, var) in node.args.iter().zip(&arg_vars) {
                    if !scope.define(arg, Ty::Generic(var.clone())) {
                        return Err(TypeError::new(
                            TypeErrorKind::AlreadyDefined { name: arg.clone() },
                            node.span,
                        ));
                    }
                }

                let mut introduced = Vec::new();
                let mut last_ty = Ty::Int; // overwritten: body is non-empty
                for expr in &node.body {
                    let (ty, gen1) = gen_constraints(scope, constraints, expr)?;
                    introduced.extend(gen1);
                    last_ty = ty;
                }
                Ok((last_ty, introduced))
            })();
            scope.pop_scope();

            let (body_ty, mut introduced) = result?;
            introduced.extend(arg_vars.iter().cloned());
            let params = arg_vars.into_iter().map(Ty::Generic).collect();
            Ok((Ty::func(params, body_ty), introduced))
        }

        Expr::Let(node) => {
            scope.push_scope();
            let result = (|| {
                for assignment in &node.assignments {
                    let ty = generalize(scope, constraints, &assignment.value)?;
                    if !scope.define(&assignment.var, ty) {
                        return Err(TypeError::new(
                            TypeErrorKind::AlreadyDefined {
                                name: assignment.var.clone(),
                            },
                            node.span,
                        ));
                    }
                }
                gen_constraints(scope, constraints, &node.body)
            })();
            scope.pop_scope();
            result
        }

        // `set` constrains the assigned value against the name's type.
        // No instantiation happens: assignment never introduces
        // polymorphism, so a scheme's body is used directly.
        Expr::Set(node) => {
            let (value_ty, introduced) = gen_constraints(scope, constraints, &node.value)?;

            let Some(bound) = scope.find(&node.name) else {
                return Err(TypeError::new(
                    TypeErrorKind::UnboundVariable {
                        name: node.name.clone(),
                    },
                    node.span,
                ));
            };
            let bound = match bound {
                Ty::Scheme(_, body) => *body,
                other => other,
            };

            constraints.push(Constraint::new(value_ty.clone(), bound, node.span));
            Ok((value_ty, introduced))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{list_structural_eq, structural_eq};
    use larch_parser::parse;

    fn var(id: u32) -> TyVar {
        TyVar { id, label: None }
    }

    fn generic(id: u32) -> Ty {
        Ty::Generic(var(id))
    }

    /// Generate constraints for the first expression of a source string.
    fn gen(source: &str) -> (Ty, Vec<Constraint>) {
        let program = parse(source).expect("parse failed");
        let mut scope = ScopeStack::new();
        let mut constraints = Vec::new();
        let (ty, _) = gen_constraints(&mut scope, &mut constraints, &program[0])
            .expect("constraint generation failed");
        (ty, constraints)
    }

    /// Compare generated constraints against expected ones under one
    /// shared variable bijection (equivalent variables must have
    /// consistent ids across the whole list, exact ids do not matter).
    fn assert_constraints(actual: &[Constraint], actual_ty: &Ty, expected: &[(Ty, Ty)], expected_ty: &Ty) {
        let mut flat_actual = vec![actual_ty.clone()];
        for c in actual {
            flat_actual.push(c.lhs.clone());
            flat_actual.push(c.rhs.clone());
        }
        let mut flat_expected = vec![expected_ty.clone()];
        for (lhs, rhs) in expected {
            flat_expected.push(lhs.clone());
            flat_expected.push(rhs.clone());
        }
        assert!(
            list_structural_eq(&flat_actual, &flat_expected),
            "constraints differ\n  actual: {:?} with {:?}\n  expected: {:?} with {:?}",
            actual_ty,
            actual,
            expected_ty,
            expected
        );
    }

    #[test]
    fn literals_generate_no_constraints() {
        let (ty, constraints) = gen("false");
        assert_eq!(ty, Ty::Bool);
        assert!(constraints.is_empty());

        let (ty, constraints) = gen("\"s\"");
        assert_eq!(ty, Ty::Str);
        assert!(constraints.is_empty());
    }

    #[test]
    fn func_def_with_if_body() {
        let (ty, constraints) = gen("(def foo [x] (if [x] 0 1))");
        // x : ?a, if-result : ?b  |-  foo : (?a) -> ?b
        // constraints: ?a = Bool, ?b = Int, ?b = Int
        assert_constraints(
            &constraints,
            &ty,
            &[
                (generic(1), Ty::Bool),
                (generic(2), Ty::Int),
                (generic(2), Ty::Int),
            ],
            &Ty::func(vec![generic(1)], generic(2)),
        );
    }

    #[test]
    fn multi_arg_func_def() {
        let (ty, constraints) = gen("(def foo [x y] (if [x] y 4))");
        // x : ?a, y : ?b, if-result : ?c  |-  foo : (?a, ?b) -> ?c
        assert_constraints(
            &constraints,
            &ty,
            &[
                (generic(1), Ty::Bool),
                (generic(3), generic(2)),
                (generic(3), Ty::Int),
            ],
            &Ty::func(vec![generic(1), generic(2)], generic(3)),
        );
    }

    #[test]
    fn builtin_application() {
        let (ty, constraints) = gen("(def foo [x] (+ x 2))");
        // (Int, Int) -> Int  =  (?x, Int) -> ?result
        assert_constraints(
            &constraints,
            &ty,
            &[(
                Ty::func(vec![Ty::Int, Ty::Int], Ty::Int),
                Ty::func(vec![generic(1), Ty::Int], generic(2)),
            )],
            &Ty::func(vec![generic(1)], generic(2)),
        );
    }

    #[test]
    fn let_generalization_constraint_shape() {
        let (ty, constraints) =
            gen("(let [id (fn [x] x)] (let [a (id 0)] (id true)))");
        // Each use of `id` is a fresh instantiation; the two calls
        // constrain independent copies.
        assert_constraints(
            &constraints,
            &ty,
            &[
                (
                    Ty::func(vec![generic(2)], generic(2)),
                    Ty::func(vec![Ty::Int], generic(3)),
                ),
                (
                    Ty::func(vec![generic(4)], generic(4)),
                    Ty::func(vec![Ty::Bool], generic(5)),
                ),
            ],
            &generic(5),
        );
    }

    #[test]
    fn form_with_no_children_is_malformed() {
        use larch_common::span::Span;
        use larch_parser::ast::Form;

        let mut scope = ScopeStack::new();
        let mut constraints = Vec::new();
        let node = Expr::Form(Form {
            id: 1,
            span: Span::new(0, 2),
            children: Vec::new(),
        });
        let err = gen_constraints(&mut scope, &mut constraints, &node).unwrap_err();
        assert!(matches!(err.kind, TypeErrorKind::MalformedAst { .. }));
    }

    #[test]
    fn fn_scopes_are_popped_after_errors() {
        let program = parse("(fn [x] missing)").unwrap();
        let mut scope = ScopeStack::new();
        let mut constraints = Vec::new();
        let err = gen_constraints(&mut scope, &mut constraints, &program[0]).unwrap_err();
        assert!(matches!(err.kind, TypeErrorKind::UnboundVariable { .. }));
        assert_eq!(scope.depth(), 1);
    }

    #[test]
    fn set_constrains_against_the_bound_type() {
        let program = parse("(let [x 1] (set x 2))").unwrap();
        let ty = infer(&program[0]).unwrap();
        assert_eq!(ty, Ty::Int);

        let program = parse("(let [x 1] (set x true))").unwrap();
        let err = infer(&program[0]).unwrap_err();
        assert!(matches!(err.kind, TypeErrorKind::Mismatch { .. }));
    }

    #[test]
    fn set_on_unbound_name_fails() {
        let program = parse("(set ghost 1)").unwrap();
        let err = infer(&program[0]).unwrap_err();
        assert_eq!(
            err.kind,
            TypeErrorKind::UnboundVariable {
                name: "ghost".into()
            }
        );
    }

    #[test]
    fn duplicate_func_def_args_are_rejected() {
        let program = parse("(def foo [x x] x)").unwrap();
        let err = infer(&program[0]).unwrap_err();
        assert_eq!(err.kind, TypeErrorKind::AlreadyDefined { name: "x".into() });
    }

    #[test]
    fn driver_binds_definitions_in_order() {
        let program = parse("(def one [] 1) (def two [] (+ (one) 1))").unwrap();
        let result = check(&program).unwrap();
        assert_eq!(
            result.symbols.get("one"),
            Some(&Ty::func(vec![], Ty::Int))
        );
        assert_eq!(
            result.symbols.get("two"),
            Some(&Ty::func(vec![], Ty::Int))
        );
        assert!(result.result_type.is_none());
    }

    #[test]
    fn driver_generalizes_polymorphic_definitions() {
        let program = parse("(def id [x] x)").unwrap();
        let result = check(&program).unwrap();
        let expected = Ty::Scheme(
            vec![var(1)],
            Box::new(Ty::func(vec![generic(1)], generic(1))),
        );
        assert!(structural_eq(result.symbols.get("id").unwrap(), &expected));
    }

    #[test]
    fn driver_rejects_redefinition() {
        let program = parse("(def foo [] 1) (def foo [] 2)").unwrap();
        let err = check(&program).unwrap_err();
        assert_eq!(
            err.kind,
            TypeErrorKind::AlreadyDefined { name: "foo".into() }
        );
    }

    #[test]
    fn driver_rejects_builtin_collision() {
        let program = parse("(def print [x] x)").unwrap();
        let err = check(&program).unwrap_err();
        assert_eq!(
            err.kind,
            TypeErrorKind::AlreadyDefined {
                name: "print".into()
            }
        );
    }

    #[test]
    fn errors_carry_the_expression_context() {
        let program = parse("(+ true 1)").unwrap();
        let err = infer(&program[0]).unwrap_err();
        assert_eq!(err.expr.as_deref(), Some("(+ true 1)"));
    }
}
