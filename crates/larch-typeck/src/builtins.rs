//! The builtin operator table.
//!
//! Names bound before any user code runs. The table is process-wide and
//! immutable: the scope stack consults it as the final fallback during
//! lookup, and rejects user bindings that collide with it.

use crate::ty::Ty;

/// The type of a builtin name, if it is one.
pub fn builtin_type(name: &str) -> Option<Ty> {
    match name {
        "+" | "-" | "*" | "/" => Some(Ty::func(vec![Ty::Int, Ty::Int], Ty::Int)),
        ">" | "<" | "=" => Some(Ty::func(vec![Ty::Int, Ty::Int], Ty::Bool)),
        // Returns its argument until a unit type exists.
        "print" => Some(Ty::func(vec![Ty::Str], Ty::Str)),
        _ => None,
    }
}

/// Whether a name is a builtin.
pub fn is_builtin(name: &str) -> bool {
    builtin_type(name).is_some()
}
