//! Session document persistence.
//!
//! The live session is the sole shared mutable resource across hook
//! invocations. Every update is read-modify-write under an advisory lock
//! with atomic replace, so overlapping invocations never observe a partial
//! write. A missing or unparseable document loads as `None` — callers
//! create a fresh session rather than failing.

use std::fs;
use std::path::{Path, PathBuf};

use chrona_core::Session;

/// Session id in the `YYYYMMDD-HHMMSS` form used for archive filenames.
pub fn new_session_id() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Unix timestamp, seconds.
pub fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

fn lock_path(root: &Path) -> PathBuf {
    crate::state_dir(root).join("chrona-session.lock")
}

/// Load the live session. `None` when missing; corrupt documents are logged
/// and also load as `None` (reset-to-fresh, never propagate).
pub fn load_session(root: &Path) -> Option<Session> {
    let path = crate::session_path(root);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "corrupt session file, resetting");
            crate::log::debug_log(true, "session-load", &format!("corrupt session, resetting: {e}"));
            None
        }
    }
}

/// Persist the session atomically under the advisory lock.
pub fn save_session(root: &Path, session: &Session) -> anyhow::Result<()> {
    let _lock = crate::lock_file(&lock_path(root))?;
    let data = serde_json::to_vec_pretty(session)?;
    crate::write_atomic(&crate::session_path(root), &data)
}

/// Write an immutable archive snapshot keyed by session id.
/// Returns the archive path.
pub fn archive_session(root: &Path, session: &Session) -> anyhow::Result<PathBuf> {
    let dir = crate::archive_dir(root);
    fs::create_dir_all(&dir)?;
    let id = if session.session_id.is_empty() {
        new_session_id()
    } else {
        session.session_id.clone()
    };
    let path = dir.join(format!("{id}.json"));
    let data = serde_json::to_vec_pretty(session)?;
    crate::write_atomic(&path, &data)?;
    Ok(path)
}
