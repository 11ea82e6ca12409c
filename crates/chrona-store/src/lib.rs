//! Project-scoped persistence: paths under `.claude/`, atomic writes, and
//! an advisory lock for the canonical session document.

pub mod config;
pub mod log;
pub mod session;

use fs2::FileExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Shareable project configuration.
pub const CONFIG_NAME: &str = "chrona.json";
/// Local-only credentials.
pub const LOCAL_CONFIG_NAME: &str = "chrona.local.json";
/// Global defaults and credentials under `~/.claude/`.
pub const GLOBAL_CONFIG_NAME: &str = "chrona.global.json";
/// Live session document.
pub const SESSION_NAME: &str = "chrona-session.json";
/// Append-only archive of ended sessions.
pub const ARCHIVE_DIR_NAME: &str = "chrona-sessions";

/// State directory for a project root: `<root>/.claude/`
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(".claude")
}

pub fn config_path(root: &Path) -> PathBuf {
    state_dir(root).join(CONFIG_NAME)
}

pub fn local_config_path(root: &Path) -> PathBuf {
    state_dir(root).join(LOCAL_CONFIG_NAME)
}

pub fn session_path(root: &Path) -> PathBuf {
    state_dir(root).join(SESSION_NAME)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    state_dir(root).join(ARCHIVE_DIR_NAME)
}

/// `~/.claude/chrona.global.json` (cwd-relative fallback when no home dir).
pub fn global_config_path() -> PathBuf {
    if let Ok(p) = std::env::var("CHRONA_GLOBAL_CONFIG") {
        return PathBuf::from(p);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".claude").join(GLOBAL_CONFIG_NAME),
        None => PathBuf::from(GLOBAL_CONFIG_NAME),
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// File-based exclusive lock guard.
pub struct LockGuard {
    _file: fs::File,
}

/// Acquire an exclusive file lock. Creates the lock file if needed.
pub fn lock_file(path: &Path) -> anyhow::Result<LockGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;
    Ok(LockGuard { _file: file })
}
