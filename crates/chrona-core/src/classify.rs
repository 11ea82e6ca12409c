//! Heuristic issue classification and duplicate detection.
//!
//! The scorer is a fixed-lexicon keyword counter behind the [`Classifier`]
//! trait, so a richer implementation can replace it without touching
//! callers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::types::IssueKey;

/// Keywords signalling a defect report.
pub const BUG_SIGNALS: [&str; 9] = [
    "fix",
    "bug",
    "broken",
    "crash",
    "error",
    "fail",
    "regression",
    "not working",
    "issue with",
];

/// Keywords signalling new or planned work.
pub const TASK_SIGNALS: [&str; 9] = [
    "add",
    "create",
    "implement",
    "build",
    "setup",
    "configure",
    "refactor",
    "update",
    "migrate",
];

/// Jaccard similarity at or above which two summaries are duplicates.
const DUPLICATE_SIMILARITY: f64 = 0.60;

/// Maximum length of an extracted summary, ellipsis included.
const SUMMARY_MAX_CHARS: usize = 80;

/// Leading filler phrases stripped from free-text intent.
const FILLER_PREFIXES: [&str; 9] = [
    "please ",
    "can you ",
    "could you ",
    "i need to ",
    "i need you to ",
    "i want to ",
    "help me ",
    "let's ",
    "let me ",
];

/// Jira issue type assigned by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueType {
    Bug,
    Task,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::Bug => "Bug",
            IssueType::Task => "Task",
        }
    }
}

/// Classification outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub issue_type: IssueType,
    pub confidence: f64,
    pub matched_signals: Vec<&'static str>,
}

/// Optional context from observed session activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext {
    pub new_files_created: usize,
    pub files_edited: usize,
}

pub trait Classifier {
    fn classify(&self, text: &str, context: Option<&ClassifyContext>) -> Classification;
}

/// Fixed-lexicon keyword scorer.
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str, context: Option<&ClassifyContext>) -> Classification {
        let lower = text.to_lowercase();
        let bug_matches: Vec<&'static str> = BUG_SIGNALS
            .iter()
            .copied()
            .filter(|s| lower.contains(s))
            .collect();
        let task_matches: Vec<&'static str> = TASK_SIGNALS
            .iter()
            .copied()
            .filter(|s| lower.contains(s))
            .collect();

        let mut bug_score = bug_matches.len();
        let mut task_score = task_matches.len();
        if let Some(ctx) = context {
            // Pure edits with no new files smell like a fix; new files like a task.
            if ctx.new_files_created == 0 && ctx.files_edited > 0 {
                bug_score += 1;
            }
            if ctx.new_files_created > 0 {
                task_score += 1;
            }
        }

        if bug_score >= 2 || (bug_score > task_score && bug_score >= 1) {
            Classification {
                issue_type: IssueType::Bug,
                confidence: confidence(bug_score),
                matched_signals: bug_matches,
            }
        } else {
            Classification {
                issue_type: IssueType::Task,
                confidence: confidence(task_score.max(1)),
                matched_signals: task_matches,
            }
        }
    }
}

fn confidence(score: usize) -> f64 {
    (0.5 + score as f64 * 0.15).min(0.95)
}

/// Classify with the default keyword scorer.
pub fn classify(text: &str, context: Option<&ClassifyContext>) -> Classification {
    KeywordClassifier.classify(text, context)
}

/// Return the first active issue whose summary token set overlaps the
/// candidate's with Jaccard similarity ≥ 0.60.
pub fn find_duplicate(session: &Session, candidate: &str) -> Option<IssueKey> {
    let candidate_tokens = tokenize(candidate);
    if candidate_tokens.is_empty() {
        return None;
    }
    for (key, entry) in &session.active_issues {
        let existing_tokens = tokenize(&entry.summary);
        if existing_tokens.is_empty() {
            continue;
        }
        let intersection = candidate_tokens.intersection(&existing_tokens).count();
        let union = candidate_tokens.union(&existing_tokens).count();
        if intersection as f64 / union as f64 >= DUPLICATE_SIMILARITY {
            return Some(key.clone());
        }
    }
    None
}

/// Extract a clean issue summary from free-text intent: first sentence,
/// leading filler stripped, capitalized, hard-truncated to 80 chars with an
/// ellipsis.
pub fn extract_summary(free_text: &str) -> String {
    let first = free_text
        .trim()
        .split(['.', '!', '?', '\n'])
        .next()
        .unwrap_or("")
        .trim();
    let stripped = strip_fillers(first);
    if stripped.is_empty() {
        return String::new();
    }

    let mut chars = stripped.chars();
    let capitalized = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };

    if capitalized.chars().count() > SUMMARY_MAX_CHARS {
        let head: String = capitalized.chars().take(SUMMARY_MAX_CHARS - 1).collect();
        format!("{head}…")
    } else {
        capitalized
    }
}

fn strip_fillers(mut s: &str) -> &str {
    loop {
        let mut stripped = false;
        for prefix in FILLER_PREFIXES {
            // The text may end exactly at the filler (no trailing space).
            if s.eq_ignore_ascii_case(prefix.trim_end()) {
                return "";
            }
            if let Some(head) = s.get(..prefix.len()) {
                if head.eq_ignore_ascii_case(prefix) {
                    s = s[prefix.len()..].trim_start();
                    stripped = true;
                }
            }
        }
        if !stripped {
            return s;
        }
    }
}

/// Lowercased alphanumeric runs.
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
