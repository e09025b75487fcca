//! QBE IL text builder.
//!
//! A thin layer over a `String` that knows the IL's shape: function
//! headers with linkage, indented instructions, labels, aggregate type
//! definitions, and data definitions. The builder never validates
//! instruction semantics; the generator in [`crate::gen`] is responsible
//! for emitting well-formed IL.

use std::fmt;

/// An IL type: a base type or a named aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum IlType {
    /// `w` -- 32-bit integer.
    Word,
    /// `l` -- 64-bit integer (and pointers).
    Long,
    /// `:Name` -- a defined aggregate type.
    Named(String),
}

impl fmt::Display for IlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IlType::Word => write!(f, "w"),
            IlType::Long => write!(f, "l"),
            IlType::Named(name) => write!(f, ":{}", name),
        }
    }
}

/// An IL value: a local temporary, a global, or an integer constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `%name`
    Temp(String),
    /// `$name`
    Global(String),
    /// An integer literal.
    Const(i64),
}

impl Value {
    pub fn temp(name: impl Into<String>) -> Value {
        Value::Temp(name.into())
    }

    pub fn global(name: impl Into<String>) -> Value {
        Value::Global(name.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(name) => write!(f, "%{}", name),
            Value::Global(name) => write!(f, "${}", name),
            Value::Const(n) => write!(f, "{}", n),
        }
    }
}

/// Incremental IL writer with indentation and a temporary/label supply.
pub struct Builder {
    out: String,
    indent: usize,
    temp_counter: u32,
    label_counter: u32,
}

const INDENT: &str = "\t";

impl Builder {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            temp_counter: 0,
            label_counter: 0,
        }
    }

    /// A fresh local temporary.
    pub fn fresh_temp(&mut self) -> Value {
        let temp = Value::Temp(format!("t{}", self.temp_counter));
        self.temp_counter += 1;
        temp
    }

    /// A fresh label with the given stem, e.g. `then.3`.
    pub fn fresh_label(&mut self, stem: &str) -> String {
        let label = format!("{}.{}", stem, self.label_counter);
        self.label_counter += 1;
        label
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Append raw text verbatim (preamble, type definitions).
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Define an aggregate type: `type :Name = { l, w }`.
    pub fn def_type(&mut self, name: &str, fields: &[IlType]) {
        let list = fields
            .iter()
            .map(IlType::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!("type :{} = {{ {} }}", name, list));
    }

    /// Define a data segment: `data $name = { b "text", b 0 }`.
    ///
    /// The content is emitted as a NUL-terminated byte string.
    pub fn def_data(&mut self, name: &str, content: &str) {
        self.line(&format!("data ${} = {{ b \"{}\", b 0 }}", name, content));
    }

    /// Open a function definition and indent its body.
    pub fn start_func(
        &mut self,
        export: bool,
        ret: &IlType,
        name: &str,
        params: &[(IlType, Value)],
    ) {
        let linkage = if export { "export " } else { "" };
        let param_list = params
            .iter()
            .map(|(ty, value)| format!("{} {}", ty, value))
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!(
            "{}function {} ${}({}) {{",
            linkage, ret, name, param_list
        ));
        self.indent += 1;
        self.label("start");
    }

    /// Close the current function.
    pub fn end_func(&mut self) {
        self.indent -= 1;
        self.line("}");
    }

    /// Emit a block label. Labels are not indented past the function
    /// level.
    pub fn label(&mut self, name: &str) {
        let saved = self.indent;
        self.indent = 0;
        self.line(&format!("@{}", name));
        self.indent = saved;
    }

    /// `target =ty op a, b` (or unary).
    pub fn assign(&mut self, target: &Value, ty: &IlType, op: &str, operands: &[Value]) {
        let list = operands
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.line(&format!("{} ={} {} {}", target, ty, op, list));
    }

    /// `target =ty copy value`
    pub fn copy(&mut self, target: &Value, ty: &IlType, value: &Value) {
        self.assign(target, ty, "copy", std::slice::from_ref(value));
    }

    /// A call, with or without a result: `%r =w call $f(l %x)`.
    pub fn call(
        &mut self,
        target: Option<(&Value, &IlType)>,
        func: &Value,
        args: &[(IlType, Value)],
    ) {
        let arg_list = args
            .iter()
            .map(|(ty, value)| format!("{} {}", ty, value))
            .collect::<Vec<_>>()
            .join(", ");
        match target {
            Some((value, ty)) => {
                self.line(&format!("{} ={} call {}({})", value, ty, func, arg_list))
            }
            None => self.line(&format!("call {}({})", func, arg_list)),
        }
    }

    /// `storel value, addr`
    pub fn storel(&mut self, value: &Value, addr: &Value) {
        self.line(&format!("storel {}, {}", value, addr));
    }

    /// `jnz cond, @then, @else`
    pub fn jnz(&mut self, cond: &Value, then_label: &str, else_label: &str) {
        self.line(&format!("jnz {}, @{}, @{}", cond, then_label, else_label));
    }

    /// `jmp @label`
    pub fn jmp(&mut self, label: &str) {
        self.line(&format!("jmp @{}", label));
    }

    /// `ret value` / `ret`
    pub fn ret(&mut self, value: Option<&Value>) {
        match value {
            Some(value) => self.line(&format!("ret {}", value)),
            None => self.line("ret"),
        }
    }

    /// Finish and return the IL text.
    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
