//! Adapter translating convention-based external tools into the tagged
//! [`StepOutcome`](super::StepOutcome) protocol.
//!
//! Each tool takes the current artifact path as its first argument and, on
//! success, writes its output next to the input under a step-specific
//! filename suffix (e.g. `doc.pdf` → `doc-OCR.pdf`). Some tools signal
//! success by file presence alone, so the conventional output path is
//! checked after every invocation rather than trusting the exit status.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::sanitize;

/// Derives the conventional output path for `input`: the same directory and
/// extension, with `suffix` appended to the file stem.
pub(crate) fn conventional_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pdf");
    input.with_file_name(format!("{}{}.{}", stem, suffix, ext))
}

/// Invokes an external tool and reports what it produced.
///
/// Returns `Ok(Some(path))` when the conventional output exists afterwards,
/// `Ok(None)` when the tool ran cleanly but produced nothing, and `Err` with
/// captured detail when the tool failed without producing output.
pub(crate) fn run_tool(
    program: &str,
    args: &[OsString],
    input: &Path,
    suffix: &str,
) -> Result<Option<PathBuf>, String> {
    let expected = conventional_output(input, suffix);

    debug!(
        program,
        input = %sanitize::redact_path(input),
        "invoking external tool"
    );

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run {}: {}", program, e))?;

    if expected.exists() {
        return Ok(Some(expected));
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            format!("{} exited with {}", program, output.status)
        } else {
            format!("{} exited with {}: {}", program, output.status, stderr.trim())
        };
        return Err(detail);
    }

    Ok(None)
}


#[cfg(all(test, unix))]
mod tests {
    use super::testutil::fake_tool;
    use super::*;
    use tempfile::TempDir;

    fn input_file(dir: &Path) -> PathBuf {
        let path = dir.join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 original").unwrap();
        path
    }

    #[test]
    fn test_conventional_output_naming() {
        assert_eq!(
            conventional_output(Path::new("/tmp/a/doc.pdf"), "-OCR"),
            PathBuf::from("/tmp/a/doc-OCR.pdf")
        );
        assert_eq!(
            conventional_output(Path::new("doc.pdf"), "-unlocked"),
            PathBuf::from("doc-unlocked.pdf")
        );
    }

    #[test]
    fn test_tool_producing_conventional_output() {
        let tmp = TempDir::new().unwrap();
        let input = input_file(tmp.path());
        let tool = fake_tool(tmp.path(), "ok-tool", r#"cp "$1" "${1%.pdf}-OCR.pdf""#);

        let produced = run_tool(
            tool.to_str().unwrap(),
            &[input.clone().into_os_string()],
            &input,
            "-OCR",
        )
        .unwrap();

        let expected = tmp.path().join("doc-OCR.pdf");
        assert_eq!(produced, Some(expected.clone()));
        assert!(expected.exists());
    }

    #[test]
    fn test_tool_success_without_output_is_noop() {
        let tmp = TempDir::new().unwrap();
        let input = input_file(tmp.path());
        let tool = fake_tool(tmp.path(), "noop-tool", "exit 0");

        let produced = run_tool(
            tool.to_str().unwrap(),
            &[input.clone().into_os_string()],
            &input,
            "-numbered",
        )
        .unwrap();
        assert_eq!(produced, None);
    }

    #[test]
    fn test_output_presence_overrides_exit_status() {
        let tmp = TempDir::new().unwrap();
        let input = input_file(tmp.path());
        // Writes the output, then exits non-zero anyway.
        let tool = fake_tool(
            tmp.path(),
            "grumpy-tool",
            r#"cp "$1" "${1%.pdf}-unlocked.pdf"; exit 3"#,
        );

        let produced = run_tool(
            tool.to_str().unwrap(),
            &[input.clone().into_os_string()],
            &input,
            "-unlocked",
        )
        .unwrap();
        assert_eq!(produced, Some(tmp.path().join("doc-unlocked.pdf")));
    }

    #[test]
    fn test_failure_without_output_reports_stderr() {
        let tmp = TempDir::new().unwrap();
        let input = input_file(tmp.path());
        let tool = fake_tool(tmp.path(), "bad-tool", "echo 'corrupt xref' >&2; exit 1");

        let err = run_tool(
            tool.to_str().unwrap(),
            &[input.clone().into_os_string()],
            &input,
            "-FIXED",
        )
        .unwrap_err();
        assert!(err.contains("corrupt xref"), "unexpected detail: {}", err);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let input = input_file(tmp.path());

        let err = run_tool(
            "/nonexistent/pdfmill-tool",
            &[input.clone().into_os_string()],
            &input,
            "-FIXED",
        )
        .unwrap_err();
        assert!(err.contains("failed to run"));
    }
}
