//! AST to QBE IL generation.
//!
//! Walks the type-checked program and emits one IL function per
//! top-level definition. Scalars (Int, Bool) are lowered as `l`
//! temporaries; strings are stack cells over static data (pointer at
//! offset 0, length at offset 8) described by the `:Str` aggregate.
//!
//! Code generation is deliberately mechanical. Constructs with no
//! first-class lowering (anonymous functions, polymorphic definitions)
//! are reported as stage errors rather than silently miscompiled.

use larch_parser::ast::{Expr, Form, FuncDef, IfExpr};
use larch_typeck::ty::Ty;
use larch_typeck::SymbolTable;

use crate::il::{Builder, IlType, Value};

/// Runtime support linked into every program. `$print` writes the data
/// pointer of a `:Str` cell via libc `puts`.
const RUNTIME: &str = "\
function w $print(:Str %s) {
@start
\t%data =l loadl %s
\t%r =w call $puts(l %data)
\tret %r
}
";

/// Generate the complete IL module for a checked program.
///
/// Only top-level definitions produce code; the program must define
/// `main`, which becomes the exported entry point.
pub fn gen_program(program: &[Expr], symbols: &SymbolTable) -> Result<String, String> {
    if !symbols.contains_key("main") {
        return Err("no `main` function defined".to_string());
    }

    let mut ctx = Ctx {
        builder: Builder::new(),
        symbols,
        statics: Vec::new(),
    };

    ctx.builder.def_type("Str", &[IlType::Long, IlType::Word]);
    ctx.builder.raw(RUNTIME);

    for expr in program {
        if let Expr::FuncDef(def) = expr {
            ctx.gen_func(def)?;
        }
    }

    for (name, content) in std::mem::take(&mut ctx.statics) {
        ctx.builder.def_data(&name, &content);
    }

    Ok(ctx.builder.finish())
}

struct Ctx<'a> {
    builder: Builder,
    symbols: &'a SymbolTable,
    /// String statics collected during generation, emitted at the end.
    statics: Vec<(String, String)>,
}

/// The IL type carrying a Larch value across a function boundary.
fn to_il_type(ty: &Ty) -> Result<IlType, String> {
    match ty {
        Ty::Int | Ty::Bool => Ok(IlType::Long),
        Ty::Str => Ok(IlType::Named("Str".to_string())),
        other => Err(format!("no IL representation for type `{}`", other)),
    }
}

impl<'a> Ctx<'a> {
    fn gen_func(&mut self, def: &FuncDef) -> Result<(), String> {
        let fn_ty = self
            .symbols
            .get(&def.name)
            .ok_or_else(|| format!("function `{}` missing from the symbol table", def.name))?;

        let (params, ret) = match fn_ty {
            Ty::Func(params, ret) => (params, ret.as_ref()),
            Ty::Scheme(..) => {
                return Err(format!(
                    "cannot generate code for polymorphic function `{}`",
                    def.name
                ));
            }
            other => {
                return Err(format!(
                    "top-level `{}` has non-function type `{}`",
                    def.name, other
                ));
            }
        };

        // The entry point is exported and returns a word, whatever the
        // surface type says.
        let is_main = def.name == "main";
        let ret_ty = if is_main { IlType::Word } else { to_il_type(ret)? };

        let mut param_list = Vec::with_capacity(def.args.len());
        for (ty, name) in params.iter().zip(&def.args) {
            param_list.push((to_il_type(ty)?, Value::temp(name.clone())));
        }

        self.builder.start_func(is_main, &ret_ty, &def.name, &param_list);
        let mut last = Value::Const(0);
        for expr in &def.body {
            last = self.gen_expr(expr)?;
        }
        self.builder.ret(Some(&last));
        self.builder.end_func();
        Ok(())
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<Value, String> {
        match expr {
            Expr::IntLiteral(node) => Ok(Value::Const(node.value)),
            Expr::BoolLiteral(node) => Ok(Value::Const(node.value as i64)),
            Expr::StrLiteral(node) => self.gen_str(&node.content),

            Expr::Symbol(node) => {
                if self.symbols.contains_key(&node.name) {
                    Ok(Value::global(node.name.clone()))
                } else {
                    Ok(Value::temp(node.name.clone()))
                }
            }

            Expr::Form(node) => self.gen_call(node),
            Expr::If(node) => self.gen_if(node),

            Expr::Let(node) => {
                for assignment in &node.assignments {
                    let value = self.gen_expr(&assignment.value)?;
                    let target = Value::temp(assignment.var.clone());
                    self.builder.copy(&target, &IlType::Long, &value);
                }
                self.gen_expr(&node.body)
            }

            Expr::Set(node) => {
                let value = self.gen_expr(&node.value)?;
                let target = Value::temp(node.name.clone());
                self.builder.copy(&target, &IlType::Long, &value);
                Ok(target)
            }

            Expr::Fn(_) => {
                Err("anonymous functions are not supported in code generation".to_string())
            }
            Expr::FuncDef(def) => Err(format!(
                "nested function `{}` is not supported in code generation",
                def.name
            )),
        }
    }

    /// A string literal: static data plus a 16-byte stack cell holding
    /// the data pointer and the length.
    fn gen_str(&mut self, content: &str) -> Result<Value, String> {
        let name = format!("s{}", self.statics.len());
        self.statics.push((name.clone(), content.to_string()));

        let cell = self.builder.fresh_temp();
        self.builder
            .assign(&cell, &IlType::Long, "alloc8", &[Value::Const(16)]);
        self.builder.storel(&Value::global(name), &cell);

        let len_ptr = self.builder.fresh_temp();
        self.builder
            .assign(&len_ptr, &IlType::Long, "add", &[cell.clone(), Value::Const(8)]);
        self.builder
            .storel(&Value::Const(content.len() as i64), &len_ptr);

        Ok(cell)
    }

    fn gen_call(&mut self, form: &Form) -> Result<Value, String> {
        let Some((callee, args)) = form.children.split_first() else {
            return Err("application with no callee".to_string());
        };
        let Expr::Symbol(sym) = callee else {
            return Err(format!(
                "cannot generate code for computed call `{}`",
                Expr::Form(form.clone())
            ));
        };

        match sym.name.as_str() {
            "+" => self.gen_arith("add", &sym.name, args),
            "-" => self.gen_arith("sub", &sym.name, args),
            "*" => self.gen_arith("mul", &sym.name, args),
            "/" => self.gen_arith("div", &sym.name, args),
            ">" => self.gen_compare("csgtl", &sym.name, args),
            "<" => self.gen_compare("csltl", &sym.name, args),
            "=" => self.gen_compare("ceql", &sym.name, args),
            "print" => {
                if args.len() != 1 {
                    return Err(format!("`print` takes 1 argument, got {}", args.len()));
                }
                let value = self.gen_expr(&args[0])?;
                let result = self.builder.fresh_temp();
                self.builder.call(
                    Some((&result, &IlType::Word)),
                    &Value::global("print"),
                    &[(IlType::Named("Str".to_string()), value)],
                );
                Ok(result)
            }
            name => self.gen_user_call(name, args),
        }
    }

    fn gen_arith(&mut self, op: &str, sym: &str, args: &[Expr]) -> Result<Value, String> {
        if args.len() != 2 {
            return Err(format!("`{}` takes 2 arguments, got {}", sym, args.len()));
        }
        let lhs = self.gen_expr(&args[0])?;
        let rhs = self.gen_expr(&args[1])?;
        let target = self.builder.fresh_temp();
        self.builder.assign(&target, &IlType::Long, op, &[lhs, rhs]);
        Ok(target)
    }

    /// Comparisons produce a word; widen to `l` so every scalar flows
    /// through the function body with one type.
    fn gen_compare(&mut self, op: &str, sym: &str, args: &[Expr]) -> Result<Value, String> {
        if args.len() != 2 {
            return Err(format!("`{}` takes 2 arguments, got {}", sym, args.len()));
        }
        let lhs = self.gen_expr(&args[0])?;
        let rhs = self.gen_expr(&args[1])?;
        let narrow = self.builder.fresh_temp();
        self.builder.assign(&narrow, &IlType::Word, op, &[lhs, rhs]);
        let wide = self.builder.fresh_temp();
        self.builder
            .assign(&wide, &IlType::Long, "extsw", &[narrow]);
        Ok(wide)
    }

    fn gen_user_call(&mut self, name: &str, args: &[Expr]) -> Result<Value, String> {
        let fn_ty = self
            .symbols
            .get(name)
            .ok_or_else(|| format!("call to undefined function `{}`", name))?;

        let (params, ret) = match fn_ty {
            Ty::Func(params, ret) => (params.clone(), ret.as_ref().clone()),
            Ty::Scheme(..) => {
                return Err(format!(
                    "cannot generate code for call to polymorphic function `{}`",
                    name
                ));
            }
            other => {
                return Err(format!("`{}` of type `{}` is not callable", name, other));
            }
        };

        let mut arg_list = Vec::with_capacity(args.len());
        for (ty, expr) in params.iter().zip(args) {
            let value = self.gen_expr(expr)?;
            arg_list.push((to_il_type(ty)?, value));
        }

        let result = self.builder.fresh_temp();
        let ret_ty = to_il_type(&ret)?;
        self.builder.call(
            Some((&result, &ret_ty)),
            &Value::global(name.to_string()),
            &arg_list,
        );
        Ok(result)
    }

    fn gen_if(&mut self, node: &IfExpr) -> Result<Value, String> {
        let cond = self.gen_expr(&node.condition)?;
        let then_label = self.builder.fresh_label("then");
        let else_label = self.builder.fresh_label("else");
        let end_label = self.builder.fresh_label("end");
        let result = self.builder.fresh_temp();

        self.builder.jnz(&cond, &then_label, &else_label);

        self.builder.label(&then_label);
        let cons = self.gen_expr(&node.consequence)?;
        self.builder.copy(&result, &IlType::Long, &cons);
        self.builder.jmp(&end_label);

        self.builder.label(&else_label);
        let alt = self.gen_expr(&node.alternative)?;
        self.builder.copy(&result, &IlType::Long, &alt);

        self.builder.label(&end_label);
        Ok(result)
    }
}
