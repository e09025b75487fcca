//! The Larch compiler CLI.
//!
//! Provides the `larchc` command with the following subcommands:
//!
//! - `larchc check [file]` - Parse and type-check, print top-level types
//! - `larchc build [file]` - Compile to a native binary (via qbe + cc)
//! - `larchc run [file]`   - Compile and immediately run
//!
//! Input comes from the positional file argument or, when omitted, from
//! standard input. Exit codes: 0 on success, 1 on a stage error (parse,
//! type check, code generation, toolchain), 2 on usage errors.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "larchc", version, about = "The Larch compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and type-check a program, printing top-level types
    Check {
        /// Input file; standard input when omitted
        input: Option<PathBuf>,
    },
    /// Compile a program to a native executable
    Build {
        /// Input file; standard input when omitted
        input: Option<PathBuf>,

        /// Output path for the compiled binary
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
    /// Compile a program and run it
    Run {
        /// Input file; standard input when omitted
        input: Option<PathBuf>,

        /// Output path for the compiled binary
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { input } => check(input.as_deref()),
        Commands::Build { input, out } => build(input.as_deref(), out.as_deref()).map(|_| 0),
        Commands::Run { input, out } => run(input.as_deref(), out.as_deref()),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    }
}

/// A parsed and type-checked program.
struct Checked {
    program: Vec<larch_parser::ast::Expr>,
    typeck: larch_typeck::TypeckResult,
}

/// Read source text from the input file or standard input.
fn read_source(input: Option<&Path>) -> Result<(String, String), String> {
    match input {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
            Ok((source, path.display().to_string()))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|e| format!("could not read stdin: {}", e))?;
            Ok((source, "<stdin>".to_string()))
        }
    }
}

/// Run the front end: parse and type-check, rendering diagnostics to
/// stderr on failure.
///
/// Every diagnostic is preceded by an editor-friendly
/// `file:line:col: message` line.
fn front_end(source: &str, filename: &str) -> Result<Checked, String> {
    let program = match larch_parser::parse(source) {
        Ok(program) => program,
        Err(error) => {
            report_location(filename, source, error.span.start, &error);
            report_parse_error(&error, source);
            return Err("could not parse source".to_string());
        }
    };

    let typeck = match larch_typeck::check(&program) {
        Ok(typeck) => typeck,
        Err(error) => {
            report_location(filename, source, error.span.start, &error);
            let rendered = larch_typeck::diagnostics::render_diagnostic(&error, source, filename);
            eprint!("{}", rendered);
            return Err("type checking failed".to_string());
        }
    };

    Ok(Checked { program, typeck })
}

/// Print the `file:line:col: message` line for a diagnostic.
fn report_location(filename: &str, source: &str, offset: u32, message: &dyn std::fmt::Display) {
    let (line, col) = larch_common::span::LineIndex::new(source).line_col(offset);
    eprintln!("{}:{}:{}: {}", filename, line, col, message);
}

/// Render a parse error with a labeled source span.
fn report_parse_error(error: &larch_parser::ParseError, source: &str) {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let len = source.len();
    let start = (error.span.start as usize).min(len);
    let mut end = (error.span.end as usize).min(len);
    if end <= start {
        // Keep the label non-empty where the source allows it.
        end = (start + 1).min(len);
    }
    let start = start.min(end);
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
        .with_config(Config::default().with_color(false))
        .with_message("parse error")
        .with_label(Label::new(start..end).with_message(&error.message))
        .finish()
        .eprint(Source::from(source));
}

fn check(input: Option<&Path>) -> Result<i32, String> {
    let (source, filename) = read_source(input)?;
    let checked = front_end(&source, &filename)?;

    // Print the symbol table, sorted for stable output, then the type of
    // the trailing expression if the program ends with one.
    let mut names: Vec<&String> = checked.typeck.symbols.keys().collect();
    names.sort();
    for name in names {
        println!("{} : {}", name, checked.typeck.symbols[name]);
    }
    if let Some(ty) = &checked.typeck.result_type {
        println!("{}", ty);
    }

    Ok(0)
}

/// Default output path: the input's file stem, or `out` for stdin.
fn output_path(input: Option<&Path>, out: Option<&Path>) -> PathBuf {
    match (out, input) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => {
            let stripped = path.with_extension("");
            // An extensionless input would collide with its own binary.
            if stripped == path {
                path.with_extension("bin")
            } else {
                stripped
            }
        }
        (None, None) => PathBuf::from("out"),
    }
}

fn build(input: Option<&Path>, out: Option<&Path>) -> Result<PathBuf, String> {
    let (source, filename) = read_source(input)?;
    let checked = front_end(&source, &filename)?;

    let output = output_path(input, out);
    larch_codegen::compile_to_binary(&checked.program, &checked.typeck.symbols, &output)?;
    eprintln!("compiled: {}", output.display());
    Ok(output)
}

fn run(input: Option<&Path>, out: Option<&Path>) -> Result<i32, String> {
    let output = build(input, out)?;

    // Binaries in the working directory need an explicit ./ prefix.
    let executable = if output.is_absolute() || output.components().count() > 1 {
        output
    } else {
        Path::new(".").join(output)
    };

    larch_codegen::link::run_binary(&executable)
}
