//! Ariadne-based diagnostic rendering for type errors.
//!
//! Renders `TypeError` values into formatted, labeled reports. Output is
//! colorless so rendered diagnostics are stable across environments and
//! usable in test assertions.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::error::{TypeError, TypeErrorKind};

/// The error code for each kind of type error.
fn error_code(error: &TypeError) -> &'static str {
    match &error.kind {
        TypeErrorKind::Mismatch { .. } => "E0001",
        TypeErrorKind::InfiniteType { .. } => "E0002",
        TypeErrorKind::ArityMismatch { .. } => "E0003",
        TypeErrorKind::UnboundVariable { .. } => "E0004",
        TypeErrorKind::AlreadyDefined { .. } => "E0005",
        TypeErrorKind::MalformedAst { .. } => "E0006",
    }
}

/// A short label for the primary span.
fn label_message(error: &TypeError) -> String {
    match &error.kind {
        TypeErrorKind::Mismatch { expected, found } => {
            format!("expected `{}`, found `{}`", expected, found)
        }
        TypeErrorKind::InfiniteType { var, .. } => {
            format!("`{}` would refer to itself here", var)
        }
        TypeErrorKind::ArityMismatch { expected, found } => {
            format!("takes {} argument(s), not {}", expected, found)
        }
        TypeErrorKind::UnboundVariable { name } => {
            format!("`{}` is not defined here", name)
        }
        TypeErrorKind::AlreadyDefined { name } => {
            format!("`{}` is already bound in an enclosing scope", name)
        }
        TypeErrorKind::MalformedAst { .. } => "unsupported syntax tree shape".to_string(),
    }
}

/// Render a type error into a formatted diagnostic string.
///
/// Each diagnostic includes an error code, the terse message, and a
/// labeled source span.
pub fn render_diagnostic(error: &TypeError, source: &str, _filename: &str) -> String {
    let source_len = source.len();

    // Clamp the span into the source and keep it non-empty; ariadne
    // needs at least a one-character label.
    let clamp = |r: Range<usize>| -> Range<usize> {
        let s = r.start.min(source_len);
        let e = r.end.min(source_len).max(s);
        if s == e {
            s..e.saturating_add(1).min(source_len)
        } else {
            s..e
        }
    };

    let span = clamp(error.span.into());

    let report = Report::<Range<usize>>::build(ReportKind::Error, span.clone())
        .with_config(Config::default().with_color(false))
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_label(Label::new(span).with_message(label_message(error)))
        .finish();

    let mut buf = Vec::new();
    let _ = report.write(Source::from(source), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
