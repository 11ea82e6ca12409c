//! Rotating debug and API log files under `~/.claude/`.
//!
//! The debug log is gated by the `debugLog` config flag; the API log is
//! always on so failed ticket-system calls stay diagnosable. Both rotate at
//! 1MB to a single `.1` backup. Log paths are env-overridable so tests
//! never touch the real home directory.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

const MAX_LOG_SIZE: u64 = 1_000_000;

fn home_log_path(name: &str) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".claude").join(name),
        None => PathBuf::from(name),
    }
}

fn debug_log_path() -> PathBuf {
    match std::env::var("CHRONA_DEBUG_LOG") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => home_log_path("chrona-debug.log"),
    }
}

fn api_log_path() -> PathBuf {
    match std::env::var("CHRONA_API_LOG") {
        Ok(p) if !p.is_empty() => PathBuf::from(p),
        _ => home_log_path("chrona-api.log"),
    }
}

/// Append a category-tagged line to the debug log. No-op unless `enabled`.
/// Write failures are swallowed: logging never breaks an invocation.
pub fn debug_log(enabled: bool, category: &str, message: &str) {
    if !enabled {
        return;
    }
    append_rotating(&debug_log_path(), &format!("[{category}] {message}"));
}

/// Record one ticket-system API call. Always on.
pub fn api_log(method: &str, path: &str, status: u16, elapsed_ms: u128, detail: &str) {
    let mut line = format!("[api] {method} {path} status={status} time={elapsed_ms}ms");
    if !detail.is_empty() {
        line.push(' ');
        line.push_str(detail);
    }
    append_rotating(&api_log_path(), &line);
}

fn append_rotating(path: &PathBuf, line: &str) {
    // Rotate if too large; replace any previous backup.
    if let Ok(meta) = fs::metadata(path) {
        if meta.len() > MAX_LOG_SIZE {
            let backup = path.with_extension("log.1");
            let _ = fs::remove_file(&backup);
            let _ = fs::rename(path, &backup);
        }
    }
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let ts = timestamp();
    if let Ok(mut f) = fs::OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(f, "[{ts}] {line}");
    }
}

fn timestamp() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
