//! Activity recording: one observed tool call at a time into the session's
//! append-only buffer, plus the planning and task timing sub-protocols.

use chrona_core::types::{
    ActivityEvent, ActivityKind, PendingWorklog, PlanningTimer, RawFacts, TaskTimer,
    WorklogStatus, MIN_TRACKED_SECONDS,
};
use chrona_core::worklog::RoundingPolicy;
use chrona_core::Session;
use chrona_store::config::Config;
use chrona_store::log::debug_log;

use crate::redact::sanitize_command;

/// Read-only / inspection tools that never count as work.
const READ_ONLY_TOOLS: [&str; 14] = [
    "Read",
    "Glob",
    "Grep",
    "LS",
    "WebSearch",
    "WebFetch",
    "TodoRead",
    "NotebookRead",
    "AskUserQuestion",
    "TaskList",
    "TaskGet",
    "ToolSearch",
    "ListMcpResourcesTool",
    "BashOutput",
];

/// Skill names containing these substrings are treated as planning work.
const PLANNING_SKILL_PATTERNS: [&str; 5] = ["plan", "brainstorm", "spec", "explore", "research"];

/// First file-write tool after plan mode ends planning automatically.
const PLANNING_IMPL_TOOLS: [&str; 4] = ["Edit", "Write", "MultiEdit", "NotebookEdit"];

fn activity_kind(tool_name: &str) -> ActivityKind {
    match tool_name {
        "Edit" | "MultiEdit" | "NotebookEdit" => ActivityKind::FileEdit,
        "Write" => ActivityKind::FileWrite,
        "Bash" => ActivityKind::Command,
        "Task" | "Agent" => ActivityKind::Agent,
        _ => ActivityKind::Other,
    }
}

fn is_planning_skill(skill_name: &str) -> bool {
    let lower = skill_name.to_lowercase();
    PLANNING_SKILL_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Record one observed PostToolUse payload into the session.
///
/// Returns true when the session was mutated and needs persisting.
pub(crate) fn record_activity(
    session: &mut Session,
    cfg: &Config,
    raw: &serde_json::Value,
    now: i64,
) -> bool {
    let tool_name = crate::parse::get_str(raw, "tool_name");
    if tool_name.is_empty() {
        return false;
    }
    let tool_input = raw.get("tool_input").cloned().unwrap_or_default();
    let tool_response = raw.get("tool_response").cloned().unwrap_or_default();

    // Planning skills are tracked before the read-only skip so their timing
    // is captured; the Skill call itself stays out of the activity buffer.
    if tool_name == "Skill" {
        let skill = tool_input
            .get("skill")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if is_planning_skill(skill) {
            handle_planning_event(session, cfg, &tool_name, skill, now);
            return true;
        }
    }

    if READ_ONLY_TOOLS.contains(&tool_name.as_str()) || tool_name == "Task" {
        debug_log(
            cfg.debug_log,
            "record-activity",
            &format!("skipping read-only tool={tool_name}"),
        );
        return false;
    }

    let file_path = tool_input
        .get("file_path")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let command = tool_input
        .get("command")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    // Writes to our own state path are noise, not user work, and may carry
    // credential data.
    if file_path.contains("/.claude/") {
        debug_log(
            cfg.debug_log,
            "record-activity",
            &format!("skipping internal state write tool={tool_name} file={file_path}"),
        );
        return false;
    }

    let activity = ActivityEvent {
        timestamp: now,
        tool: tool_name.clone(),
        kind: activity_kind(&tool_name),
        file_path: if file_path.is_empty() {
            None
        } else {
            Some(file_path.clone())
        },
        command: if command.is_empty() {
            None
        } else {
            Some(sanitize_command(&command))
        },
        issue_key: session.current_issue.clone(),
    };
    session.activity_buffer.push(activity);

    // Plan mode transitions and implementation-triggered planning end.
    if tool_name == "EnterPlanMode"
        || tool_name == "ExitPlanMode"
        || (PLANNING_IMPL_TOOLS.contains(&tool_name.as_str()) && session.active_planning.is_some())
    {
        handle_planning_event(session, cfg, &tool_name, "", now);
    }

    // Task start/complete pairs for per-task time accounting.
    if tool_name == "TaskCreate" || tool_name == "TaskUpdate" {
        handle_task_event(session, cfg, &tool_name, &tool_input, &tool_response, now);
    }

    debug_log(
        cfg.debug_log,
        "record-activity",
        &format!(
            "tool={tool_name} file={file_path} issue={}",
            session.current_issue.as_deref().unwrap_or("-")
        ),
    );
    true
}

/// Track plan mode / planning-skill start and end.
///
/// A finished span under 60s is discarded; otherwise it is queued directly
/// as a "Planning"-tagged pending worklog attributed to the planning-scoped
/// issue, falling back to the current issue, then the last parent.
pub(crate) fn handle_planning_event(
    session: &mut Session,
    cfg: &Config,
    tool_name: &str,
    skill_name: &str,
    now: i64,
) {
    let is_start =
        tool_name == "EnterPlanMode" || (tool_name == "Skill" && is_planning_skill(skill_name));
    let is_end =
        tool_name == "ExitPlanMode" || PLANNING_IMPL_TOOLS.contains(&tool_name);

    if is_start && session.active_planning.is_none() {
        let subject = if skill_name.is_empty() {
            "Planning".to_string()
        } else {
            format!("Planning: {skill_name}")
        };
        session.active_planning = Some(PlanningTimer {
            start_time: now,
            issue_key: session.current_issue.clone(),
            subject: subject.clone(),
        });
        debug_log(
            cfg.debug_log,
            "planning",
            &format!("started subject={subject:?} trigger={tool_name}"),
        );
    } else if is_end {
        if let Some(timer) = session.active_planning.take() {
            flush_planning_timer(session, cfg, timer, now);
        }
    }
}

/// Close a planning timer, queueing a worklog when the span is long enough.
pub(crate) fn flush_planning_timer(
    session: &mut Session,
    cfg: &Config,
    timer: PlanningTimer,
    now: i64,
) {
    let elapsed = now - timer.start_time;
    if elapsed < MIN_TRACKED_SECONDS {
        debug_log(
            cfg.debug_log,
            "planning",
            &format!("discarded ({elapsed}s < {MIN_TRACKED_SECONDS}s) subject={:?}", timer.subject),
        );
        return;
    }

    let issue_key = timer
        .issue_key
        .clone()
        .or_else(|| session.current_issue.clone())
        .or_else(|| session.last_parent_key.clone());
    let policy = RoundingPolicy {
        rounding_minutes: cfg.time_rounding,
        accuracy: session.accuracy,
    };
    let status = if session.autonomy.auto_approves() {
        WorklogStatus::Approved
    } else {
        WorklogStatus::Pending
    };
    let seconds = policy.round_up(elapsed);
    debug_log(
        cfg.debug_log,
        "planning",
        &format!(
            "queued {seconds}s ({elapsed}s raw) to {}",
            issue_key.as_deref().unwrap_or("-")
        ),
    );
    session.pending_worklogs.push(PendingWorklog {
        issue_key,
        seconds,
        summary: timer.subject,
        raw_facts: RawFacts::default(),
        status,
    });
}

/// Track host-task start/completion; completed tasks of 60s or more add
/// their elapsed time to the attributed issue's total.
fn handle_task_event(
    session: &mut Session,
    cfg: &Config,
    tool_name: &str,
    tool_input: &serde_json::Value,
    tool_response: &serde_json::Value,
    now: i64,
) {
    let field = |name: &str| -> String {
        tool_response
            .get(name)
            .and_then(|v| v.as_str())
            .or_else(|| tool_input.get(name).and_then(|v| v.as_str()))
            .unwrap_or("")
            .to_string()
    };
    let task_id = field("taskId");
    let mut subject = field("subject");
    let status = field("status");
    if task_id.is_empty() {
        return;
    }

    // Remember subjects from TaskCreate so later updates can resolve one.
    if tool_name == "TaskCreate" && !subject.is_empty() {
        session
            .task_subjects
            .insert(task_id.clone(), subject.clone());
    }
    if subject.is_empty() {
        if let Some(cached) = session.task_subjects.get(&task_id) {
            subject = cached.clone();
        }
    }
    if status.is_empty() {
        return;
    }

    if status == "in_progress" && !session.active_tasks.contains_key(&task_id) {
        session.active_tasks.insert(
            task_id.clone(),
            TaskTimer {
                subject: subject.clone(),
                start_time: now,
                issue_key: session.current_issue.clone(),
            },
        );
        debug_log(
            cfg.debug_log,
            "task-time",
            &format!("started taskId={task_id} subject={subject:?}"),
        );
    } else if status == "completed" {
        let Some(timer) = session.active_tasks.remove(&task_id) else {
            return;
        };
        let elapsed = now - timer.start_time;
        if elapsed < MIN_TRACKED_SECONDS {
            debug_log(
                cfg.debug_log,
                "task-time",
                &format!("discarded ({elapsed}s < {MIN_TRACKED_SECONDS}s) taskId={task_id}"),
            );
            return;
        }
        let target = timer
            .issue_key
            .clone()
            .or_else(|| session.current_issue.clone());
        if let Some(key) = target {
            if let Some(entry) = session.active_issues.get_mut(&key) {
                if !entry.paused {
                    entry.total_seconds += elapsed;
                    debug_log(
                        cfg.debug_log,
                        "task-time",
                        &format!("task={:?} added {elapsed}s to {key}", timer.subject),
                    );
                }
            }
        }
    }
}
