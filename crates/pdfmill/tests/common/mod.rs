//! Shared helpers: stand-in processing tools backed by shell scripts.

#![cfg(unix)]

use std::fs;
use std::path::Path;

use pdfmill::config::{Config, RateLimitConfig, ToolsConfig};

/// Writes an executable shell script and returns its path as a string.
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().to_string()
}

/// A tool that copies its input to the conventional output location and
/// appends a marker line, so the final artifact records which tools ran.
pub fn marker_tool(dir: &Path, name: &str, suffix: &str, marker: &str) -> String {
    let body = format!(
        r#"in="$1"
stem="${{in%.*}}"
out="$stem{suffix}.pdf"
cp "$in" "$out"
echo "{marker}" >> "$out""#
    );
    fake_tool(dir, name, &body)
}

/// Like [`marker_tool`], but also appends the tool name to a shared trace
/// file before doing anything else, so a test can tell exactly which tools
/// were invoked even after the pipeline has cleaned its artifacts up.
pub fn traced_tool(dir: &Path, name: &str, suffix: &str, trace: &Path) -> String {
    let body = format!(
        r#"echo "{name}" >> "{trace}"
in="$1"
stem="${{in%.*}}"
cp "$in" "$stem{suffix}.pdf""#,
        trace = trace.display()
    );
    fake_tool(dir, name, &body)
}

/// A tool that fails without producing any output file.
pub fn broken_tool(dir: &Path, name: &str, message: &str) -> String {
    fake_tool(dir, name, &format!("echo '{message}' >&2; exit 1"))
}

pub fn marker_tools(dir: &Path) -> ToolsConfig {
    ToolsConfig {
        unlock: marker_tool(dir, "unlock", "-unlocked", "UNLOCK"),
        normalize: marker_tool(dir, "normalize", "-FIXED", "NORM"),
        ocr: marker_tool(dir, "ocr", "-OCR", "OCR"),
        paginate: marker_tool(dir, "paginate", "-numbered", "NUM"),
        compress: marker_tool(dir, "compress", "-compressed", "COMP"),
    }
}

pub fn test_config(store: &Path, tools: ToolsConfig, max_attempts: usize) -> Config {
    Config {
        version: "1.0".to_string(),
        storage_root: store.to_string_lossy().to_string(),
        worker_count: 2,
        queue_capacity: 16,
        max_upload_bytes: 1024 * 1024,
        rate_limit: RateLimitConfig {
            max_attempts,
            window_secs: 3600,
        },
        tools,
        smtp: None,
    }
}
