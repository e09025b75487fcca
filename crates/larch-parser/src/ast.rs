//! The Larch abstract syntax tree.
//!
//! A plain tagged sum: one struct per node kind, one enum over them.
//! Every node carries a node id unique within its parse (diagnostics
//! only) and the byte span of its source text.

use std::fmt;

use larch_common::span::Span;

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(IntLiteral),
    BoolLiteral(BoolLiteral),
    StrLiteral(StrLiteral),
    Symbol(Symbol),
    Form(Form),
    If(IfExpr),
    Fn(FnExpr),
    FuncDef(FuncDef),
    Let(LetExpr),
    Set(SetExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntLiteral {
    pub id: u32,
    pub span: Span,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolLiteral {
    pub id: u32,
    pub span: Span,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrLiteral {
    pub id: u32,
    pub span: Span,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: u32,
    pub span: Span,
    pub name: String,
}

/// An application: `(f x y ...)`. The first child is the callee.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub id: u32,
    pub span: Span,
    pub children: Vec<Expr>,
}

/// `(if [cond] cons alt)`
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub id: u32,
    pub span: Span,
    pub condition: Box<Expr>,
    pub consequence: Box<Expr>,
    pub alternative: Box<Expr>,
}

/// An anonymous single-argument function: `(fn [x] body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FnExpr {
    pub id: u32,
    pub span: Span,
    pub arg: String,
    pub body: Box<Expr>,
}

/// A named top-level function: `(def name (T1 ... Tn)? [args] body...)`.
///
/// The signature list is advisory only; the parser checks its length
/// against the argument list and the type checker ignores it.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub id: u32,
    pub span: Span,
    pub name: String,
    pub signature: Option<Vec<String>>,
    pub args: Vec<String>,
    pub body: Vec<Expr>,
}

/// `(let [x e1 y e2 ...] body)`
#[derive(Debug, Clone, PartialEq)]
pub struct LetExpr {
    pub id: u32,
    pub span: Span,
    pub assignments: Vec<Assignment>,
    pub body: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub var: String,
    pub value: Expr,
}

/// `(set name value)` -- mutation of an already-bound name.
#[derive(Debug, Clone, PartialEq)]
pub struct SetExpr {
    pub id: u32,
    pub span: Span,
    pub name: String,
    pub value: Box<Expr>,
}

impl Expr {
    /// The node id, unique within one parse.
    pub fn id(&self) -> u32 {
        match self {
            Expr::IntLiteral(n) => n.id,
            Expr::BoolLiteral(n) => n.id,
            Expr::StrLiteral(n) => n.id,
            Expr::Symbol(n) => n.id,
            Expr::Form(n) => n.id,
            Expr::If(n) => n.id,
            Expr::Fn(n) => n.id,
            Expr::FuncDef(n) => n.id,
            Expr::Let(n) => n.id,
            Expr::Set(n) => n.id,
        }
    }

    /// The byte span of the node's source text.
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral(n) => n.span,
            Expr::BoolLiteral(n) => n.span,
            Expr::StrLiteral(n) => n.span,
            Expr::Symbol(n) => n.span,
            Expr::Form(n) => n.span,
            Expr::If(n) => n.span,
            Expr::Fn(n) => n.span,
            Expr::FuncDef(n) => n.span,
            Expr::Let(n) => n.span,
            Expr::Set(n) => n.span,
        }
    }

    /// Render the canonical S-expression form of the node.
    ///
    /// Used for error context and test snapshots.
    pub fn pretty(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLiteral(n) => write!(f, "{}", n.value),
            Expr::BoolLiteral(n) => write!(f, "{}", n.value),
            Expr::StrLiteral(n) => write!(f, "\"{}\"", n.content),
            Expr::Symbol(n) => write!(f, "{}", n.name),
            Expr::Form(n) => {
                write!(f, "(")?;
                for (i, child) in n.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Expr::If(n) => write!(
                f,
                "(if [{}] {} {})",
                n.condition, n.consequence, n.alternative
            ),
            Expr::Fn(n) => write!(f, "(fn [{}] {})", n.arg, n.body),
            Expr::FuncDef(n) => {
                write!(f, "(def {}", n.name)?;
                if let Some(sig) = &n.signature {
                    write!(f, " ({})", sig.join(" "))?;
                }
                write!(f, " [{}]", n.args.join(" "))?;
                for expr in &n.body {
                    write!(f, " {}", expr)?;
                }
                write!(f, ")")
            }
            Expr::Let(n) => {
                write!(f, "(let [")?;
                for (i, a) in n.assignments.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {}", a.var, a.value)?;
                }
                write!(f, "] {})", n.body)
            }
            Expr::Set(n) => write!(f, "(set {} {})", n.name, n.value),
        }
    }
}
