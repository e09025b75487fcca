//! External toolchain invocation: `qbe` then `cc`.
//!
//! The generated IL is handed to the external `qbe` binary for
//! instruction selection, and the resulting assembly to the system C
//! compiler, which acts as assembler and linker driver (CRT objects,
//! libc, platform linker flags come for free).

use std::path::Path;
use std::process::Command;

/// Translate an IL file to assembly with `qbe`.
pub fn qbe_to_asm(il_path: &Path, asm_path: &Path) -> Result<(), String> {
    let output = Command::new("qbe")
        .arg(il_path)
        .arg("-o")
        .arg(asm_path)
        .output()
        .map_err(|e| format!("failed to invoke qbe: {} (is qbe installed?)", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("qbe failed:\n{}", stderr));
    }
    Ok(())
}

/// Assemble and link with the system C compiler.
pub fn assemble_and_link(asm_path: &Path, output_path: &Path) -> Result<(), String> {
    let output = Command::new("cc")
        .arg(asm_path)
        .arg("-o")
        .arg(output_path)
        .output()
        .map_err(|e| format!("failed to invoke cc: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("linking failed:\n{}", stderr));
    }
    Ok(())
}

/// Run a built executable and return its exit code.
pub fn run_binary(path: &Path) -> Result<i32, String> {
    let status = Command::new(path)
        .status()
        .map_err(|e| format!("failed to run '{}': {}", path.display(), e))?;
    Ok(status.code().unwrap_or(1))
}
