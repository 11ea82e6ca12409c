//! Worklog synthesis: aggregate an issue's chunks into a billable,
//! capped and rounded time-log draft.

use crate::session::Session;
use crate::types::{IssueKey, RawFacts, WorkChunk, MAX_WORKLOG_SECONDS};

/// How many file basenames a provisional summary shows before "+N more".
const SUMMARY_FILE_LIMIT: usize = 8;

/// Rounding policy: base granularity scaled by the accuracy dial.
#[derive(Debug, Clone, Copy)]
pub struct RoundingPolicy {
    /// Base rounding granularity in minutes.
    pub rounding_minutes: i64,
    /// Accuracy dial, 1-10.
    pub accuracy: u8,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        RoundingPolicy {
            rounding_minutes: 15,
            accuracy: 5,
        }
    }
}

impl RoundingPolicy {
    /// Effective granularity in minutes. High accuracy (8-10) refines to
    /// `max(base/15, 1)`; low accuracy (1-3) doubles the base.
    pub fn granularity_minutes(&self) -> i64 {
        let base = self.rounding_minutes;
        if self.accuracy >= 8 {
            (base / 15).max(1)
        } else if self.accuracy <= 3 {
            base * 2
        } else {
            base
        }
    }

    /// Round seconds up to the next granularity multiple, with a floor of one
    /// full granularity unit. Zero or negative input stays zero.
    pub fn round_up(&self, seconds: i64) -> i64 {
        if seconds <= 0 {
            return 0;
        }
        let unit = self.granularity_minutes() * 60;
        ((seconds + unit - 1) / unit * unit).max(unit)
    }
}

/// A synthesized worklog, ready to be enqueued as a pending entry.
#[derive(Debug, Clone)]
pub struct WorklogDraft {
    pub issue_key: Option<IssueKey>,
    /// Capped and rounded billable seconds.
    pub seconds: i64,
    /// Billable seconds before cap and rounding.
    pub raw_seconds: i64,
    pub summary: String,
    pub raw_facts: RawFacts,
    pub capped: bool,
}

/// Build the worklog draft for one issue.
///
/// Selects chunks attributed to `issue_key`; when it is the sole active
/// issue, unattributed chunks are folded in as well.
pub fn build(session: &Session, issue_key: &str, policy: &RoundingPolicy) -> WorklogDraft {
    let sole_active = session.is_sole_active_issue(issue_key);
    let chunks: Vec<&WorkChunk> = session
        .work_chunks
        .iter()
        .filter(|c| {
            c.issue_key.as_deref() == Some(issue_key) || (sole_active && c.issue_key.is_none())
        })
        .collect();
    aggregate(Some(issue_key.to_string()), &chunks, "Work on task", policy)
}

/// Build one draft covering all unattributed chunks.
pub fn build_unattributed(session: &Session, policy: &RoundingPolicy) -> WorklogDraft {
    let chunks: Vec<&WorkChunk> = session
        .work_chunks
        .iter()
        .filter(|c| c.issue_key.is_none())
        .collect();
    aggregate(None, &chunks, "Unattributed work", policy)
}

fn aggregate(
    issue_key: Option<IssueKey>,
    chunks: &[&WorkChunk],
    fallback_summary: &str,
    policy: &RoundingPolicy,
) -> WorklogDraft {
    let mut files: Vec<String> = Vec::new();
    let mut commands: Vec<String> = Vec::new();
    let mut activity_count = 0;
    let mut raw_seconds = 0;

    for chunk in chunks {
        for f in &chunk.files_changed {
            if !files.iter().any(|x| x == f) {
                files.push(f.clone());
            }
        }
        for act in &chunk.activities {
            activity_count += 1;
            if let Some(cmd) = &act.command {
                if !cmd.is_empty() && !commands.iter().any(|x| x == cmd) {
                    commands.push(cmd.clone());
                }
            }
        }
        raw_seconds += chunk.billable_seconds();
    }

    let capped = raw_seconds > MAX_WORKLOG_SECONDS;
    let effective = raw_seconds.min(MAX_WORKLOG_SECONDS);

    let summary = summarize_files(&files).unwrap_or_else(|| fallback_summary.to_string());

    WorklogDraft {
        issue_key,
        seconds: policy.round_up(effective),
        raw_seconds,
        summary,
        raw_facts: RawFacts {
            files,
            commands,
            activity_count,
        },
        capped,
    }
}

/// Provisional summary: deduplicated file basenames, up to
/// [`SUMMARY_FILE_LIMIT`], with a "+N more" overflow marker.
pub fn summarize_files(files: &[String]) -> Option<String> {
    let mut basenames: Vec<&str> = Vec::new();
    for f in files {
        let base = f.rsplit(['/', '\\']).next().unwrap_or(f.as_str());
        if !base.is_empty() && !basenames.contains(&base) {
            basenames.push(base);
        }
    }
    if basenames.is_empty() {
        return None;
    }
    let shown = basenames.len().min(SUMMARY_FILE_LIMIT);
    let rest = basenames.len() - shown;
    let mut out = basenames[..shown].join(", ");
    if rest > 0 {
        out.push_str(&format!(" +{rest} more"));
    }
    Some(out)
}
