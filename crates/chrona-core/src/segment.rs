//! Chunk segmentation: drain the activity buffer into work chunks.
//!
//! Events are walked in timestamp order and split into groups on idle gaps,
//! issue changes, and sustained directory-cluster shifts. A gap at or above
//! the idle threshold always splits, so freshly segmented chunks never carry
//! internal idle gaps; the `idle_gaps` field is only populated by foreign
//! documents and is honored by the worklog builder's subtraction.

use std::collections::HashMap;

use crate::types::{ActivityEvent, WorkChunk};

/// Directory components considered when clustering file paths.
const DIR_CLUSTER_DEPTH: usize = 2;

/// Splitting policy: base idle threshold scaled by the accuracy dial.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPolicy {
    /// Base idle threshold in minutes.
    pub idle_threshold_minutes: i64,
    /// Accuracy dial, 1-10.
    pub accuracy: u8,
}

impl Default for SegmentPolicy {
    fn default() -> Self {
        SegmentPolicy {
            idle_threshold_minutes: 15,
            accuracy: 5,
        }
    }
}

impl SegmentPolicy {
    /// Effective idle threshold in seconds.
    ///
    /// High accuracy (8-10) shortens the threshold to `max(base/3, 5)`
    /// minutes; low accuracy (1-3) doubles it.
    pub fn idle_threshold_seconds(&self) -> i64 {
        let base = self.idle_threshold_minutes;
        let minutes = if self.accuracy >= 8 {
            (base / 3).max(5)
        } else if self.accuracy <= 3 {
            base * 2
        } else {
            base
        };
        minutes * 60
    }
}

/// Segment a drained activity buffer into work chunks.
///
/// The buffer is consumed. Events are sorted by timestamp with a stable
/// tie-break (original order). An empty buffer yields no chunks.
pub fn segment_buffer(mut buffer: Vec<ActivityEvent>, policy: &SegmentPolicy) -> Vec<WorkChunk> {
    if buffer.is_empty() {
        return Vec::new();
    }

    buffer.sort_by_key(|a| a.timestamp);
    let threshold = policy.idle_threshold_seconds();

    struct Group {
        events: Vec<ActivityEvent>,
        opened_by_dir_shift: bool,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut current = Group {
        events: Vec::new(),
        opened_by_dir_shift: false,
    };

    for event in buffer {
        if let Some(prev) = current.events.last() {
            let gap = event.timestamp - prev.timestamp;
            let issue_changed = event.issue_key != prev.issue_key;
            let dir_shift = is_sustained_dir_shift(&current.events, prev, &event);

            if gap > threshold || issue_changed || dir_shift {
                groups.push(std::mem::replace(
                    &mut current,
                    Group {
                        events: Vec::new(),
                        opened_by_dir_shift: dir_shift,
                    },
                ));
            }
        }
        current.events.push(event);
    }
    groups.push(current);

    // The chunk that follows a switch is the one whose attribution is in
    // doubt: flag it when its group was opened by a dir shift or when its
    // clusters are disjoint from the previous group's.
    let mut flags = vec![false; groups.len()];
    for idx in 0..groups.len() {
        flags[idx] = groups[idx].opened_by_dir_shift
            || (idx > 0
                && detect_context_switch(
                    &groups[idx - 1].events,
                    &groups[idx].events,
                    policy.accuracy,
                ));
    }

    let mut chunks = Vec::with_capacity(groups.len());
    for (group, needs_attribution) in groups.into_iter().zip(flags) {
        let activities = group.events;
        let start_time = activities.first().map(|a| a.timestamp).unwrap_or(0);
        let end_time = activities.last().map(|a| a.timestamp).unwrap_or(0);
        let issue_key = activities.first().and_then(|a| a.issue_key.clone());

        let mut files_changed: Vec<String> = Vec::new();
        for a in &activities {
            if let Some(path) = &a.file_path {
                if !path.is_empty() && !files_changed.iter().any(|f| f == path) {
                    files_changed.push(path.clone());
                }
            }
        }

        chunks.push(WorkChunk {
            id: WorkChunk::new_id(),
            issue_key,
            start_time,
            end_time,
            activities,
            files_changed,
            idle_gaps: Vec::new(),
            needs_attribution,
        });
    }
    chunks
}

/// Directory cluster for a file path: up to [`DIR_CLUSTER_DEPTH`] leading
/// directory components, filename excluded. Empty when the path has no
/// directory.
fn dir_cluster(file_path: &str) -> String {
    let normalized = file_path.replace('\\', "/");
    let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() <= 1 {
        return String::new();
    }
    parts.pop();
    parts
        .into_iter()
        .take(DIR_CLUSTER_DEPTH)
        .collect::<Vec<_>>()
        .join("/")
}

/// A dir shift mid-walk: the incoming event's cluster differs from the
/// previous event's, is absent from the running group, and the group already
/// holds enough events to call the shift sustained.
fn is_sustained_dir_shift(
    group: &[ActivityEvent],
    prev: &ActivityEvent,
    curr: &ActivityEvent,
) -> bool {
    let prev_dir = prev.file_path.as_deref().map(dir_cluster).unwrap_or_default();
    let curr_dir = curr.file_path.as_deref().map(dir_cluster).unwrap_or_default();
    if prev_dir.is_empty() || curr_dir.is_empty() || prev_dir == curr_dir {
        return false;
    }
    if group.len() < 2 {
        return false;
    }
    !group
        .iter()
        .filter_map(|a| a.file_path.as_deref())
        .any(|f| dir_cluster(f) == curr_dir)
}

/// Count clusters and return the top-2 most common.
fn top_clusters(activities: &[ActivityEvent]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for a in activities {
        if let Some(f) = a.file_path.as_deref() {
            if !f.is_empty() {
                *counts.entry(dir_cluster(f)).or_default() += 1;
            }
        }
    }
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.into_iter().take(2).map(|(d, _)| d).collect()
}

/// Context-switch heuristic between adjacent groups, scaled by accuracy:
/// high accuracy flags any disjoint cluster shift, low accuracy requires at
/// least 3 activities on both sides.
fn detect_context_switch(prev: &[ActivityEvent], curr: &[ActivityEvent], accuracy: u8) -> bool {
    if prev.is_empty() || curr.is_empty() {
        return false;
    }
    let prev_top = top_clusters(prev);
    let curr_top = top_clusters(curr);
    if prev_top.is_empty() || curr_top.is_empty() {
        return false;
    }
    let disjoint = !prev_top.iter().any(|d| curr_top.contains(d));
    if accuracy >= 4 {
        disjoint
    } else {
        disjoint && prev.len() >= 3 && curr.len() >= 3
    }
}
