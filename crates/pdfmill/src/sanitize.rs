//! Helpers for sanitizing untrusted filenames and for keeping full
//! filesystem paths out of log and span fields.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields — reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an untrusted upload filename to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; whitespace becomes `_`;
/// everything else (path separators, control characters, shell
/// metacharacters) is dropped. Leading and trailing dots are trimmed so the
/// result can never be `.`, `..` or a hidden file. May return an empty
/// string — callers substitute a fallback name.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            out.push(c);
        } else if c.is_whitespace() {
            out.push('_');
        }
    }
    out.trim_matches('.').to_string()
}
