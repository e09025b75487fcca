//! Larch code generation: textual QBE IL plus toolchain invocation.
//!
//! The backend is deliberately thin. [`gen`] lowers the type-checked AST
//! to QBE IL text, [`il`] owns the IL's surface syntax, and [`link`]
//! drives the external `qbe` and `cc` binaries that turn the IL into a
//! native executable.

pub mod gen;
pub mod il;
pub mod link;

use std::path::Path;

use larch_parser::ast::Expr;
use larch_typeck::SymbolTable;

pub use gen::gen_program;

/// Compile a checked program into a native executable at `output_path`.
///
/// Writes the intermediate `.qbe` and `.s` files next to the output and
/// removes them on success.
pub fn compile_to_binary(
    program: &[Expr],
    symbols: &SymbolTable,
    output_path: &Path,
) -> Result<(), String> {
    let il = gen_program(program, symbols)?;

    let il_path = output_path.with_extension("qbe");
    let asm_path = output_path.with_extension("s");

    std::fs::write(&il_path, il)
        .map_err(|e| format!("failed to write '{}': {}", il_path.display(), e))?;

    link::qbe_to_asm(&il_path, &asm_path)?;
    link::assemble_and_link(&asm_path, output_path)?;

    std::fs::remove_file(&il_path).ok();
    std::fs::remove_file(&asm_path).ok();

    Ok(())
}
