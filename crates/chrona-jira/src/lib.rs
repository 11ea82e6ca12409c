//! Jira Cloud REST gateway.
//!
//! Thin synchronous client over `ureq` with a bounded global timeout. Every
//! call is recorded in the rotating API log. Failures map to
//! [`ChronaError::Network`] and are surfaced to the caller — no retry here;
//! retry is a later invocation's problem.

use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine};
use chrona_core::ChronaError;
use chrona_store::config::Credentials;
use chrona_store::log::api_log;
use serde::Serialize;

const TIMEOUT: Duration = Duration::from_secs(15);

/// Request to create an issue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateIssue {
    pub project_key: String,
    pub summary: String,
    /// Jira issue type name ("Task", "Bug", ...).
    pub issue_type: String,
    pub parent_key: Option<String>,
    pub assignee_id: Option<String>,
    pub labels: Vec<String>,
}

/// Key and id of a newly created issue.
#[derive(Debug, Clone)]
pub struct CreatedIssue {
    pub key: String,
    pub id: String,
}

/// Issue fields fetched by key.
#[derive(Debug, Clone)]
pub struct IssueDetails {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub issue_type: String,
    pub parent: Option<String>,
}

/// A project visible to the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    pub key: String,
    pub name: String,
}

/// A user found by account search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub account_id: String,
    pub display_name: String,
}

pub struct JiraClient {
    agent: ureq::Agent,
    base_url: String,
    auth_header: String,
}

impl JiraClient {
    /// Build a client from resolved credentials. Errors when credentials are
    /// incomplete; callers treat that as "posting disabled", not a fault.
    pub fn new(creds: &Credentials) -> Result<Self, ChronaError> {
        if !creds.is_complete() {
            return Err(ChronaError::Config("missing Jira credentials".to_string()));
        }
        let token = STANDARD.encode(format!("{}:{}", creds.email, creds.api_token));
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        Ok(JiraClient {
            agent,
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {token}"),
        })
    }

    /// Create an issue; returns the new key and id.
    pub fn create_issue(&self, req: &CreateIssue) -> Result<CreatedIssue, ChronaError> {
        let api_path = "/rest/api/3/issue";
        let url = format!("{}{api_path}", self.base_url);

        let mut fields = serde_json::json!({
            "project": {"key": req.project_key},
            "summary": req.summary,
            "issuetype": {"name": req.issue_type},
        });
        if let Some(parent) = &req.parent_key {
            fields["parent"] = serde_json::json!({"key": parent});
        }
        if let Some(assignee) = &req.assignee_id {
            fields["assignee"] = serde_json::json!({"id": assignee});
        }
        if !req.labels.is_empty() {
            fields["labels"] = serde_json::json!(req.labels);
        }
        let body = serde_json::json!({"fields": fields});

        let start = Instant::now();
        match self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send_json(&body)
        {
            Ok(mut resp) => {
                let status = resp.status().as_u16();
                let val: serde_json::Value = resp
                    .body_mut()
                    .read_json()
                    .map_err(|e| ChronaError::Network(format!("create issue response: {e}")))?;
                let key = val.get("key").and_then(|v| v.as_str()).unwrap_or("");
                let id = val.get("id").and_then(|v| v.as_str()).unwrap_or("");
                api_log(
                    "POST",
                    api_path,
                    status,
                    start.elapsed().as_millis(),
                    &format!("key={key}"),
                );
                if key.is_empty() {
                    return Err(ChronaError::Network(
                        "create issue: response missing key".to_string(),
                    ));
                }
                Ok(CreatedIssue {
                    key: key.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => {
                api_log(
                    "POST",
                    api_path,
                    error_status(&e),
                    start.elapsed().as_millis(),
                    &format!("error={e}"),
                );
                tracing::warn!(error = %e, "create issue failed");
                Err(ChronaError::Network(format!("create issue: {e}")))
            }
        }
    }

    /// Fetch an issue by key.
    pub fn get_issue(&self, issue_key: &str) -> Result<IssueDetails, ChronaError> {
        let api_path = format!("/rest/api/3/issue/{issue_key}");
        let url = format!(
            "{}{api_path}?fields=summary,status,issuetype,parent,assignee",
            self.base_url
        );

        let start = Instant::now();
        match self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()
        {
            Ok(mut resp) => {
                let status = resp.status().as_u16();
                let val: serde_json::Value = resp
                    .body_mut()
                    .read_json()
                    .map_err(|e| ChronaError::Network(format!("get issue response: {e}")))?;
                api_log(
                    "GET",
                    &api_path,
                    status,
                    start.elapsed().as_millis(),
                    &format!("key={issue_key}"),
                );
                Ok(parse_issue_details(&val))
            }
            Err(e) => {
                api_log(
                    "GET",
                    &api_path,
                    error_status(&e),
                    start.elapsed().as_millis(),
                    &format!("error={e}"),
                );
                tracing::warn!(issue = issue_key, error = %e, "get issue failed");
                Err(ChronaError::Network(format!("get issue {issue_key}: {e}")))
            }
        }
    }

    /// Post a worklog entry. An empty comment falls back to a minimal
    /// "Work on task (Nm)" description.
    pub fn add_worklog(
        &self,
        issue_key: &str,
        seconds: i64,
        comment: &str,
    ) -> Result<(), ChronaError> {
        let api_path = format!("/rest/api/3/issue/{issue_key}/worklog");
        let url = format!("{}{api_path}", self.base_url);

        let effective = if comment.trim().is_empty() {
            fallback_comment(seconds)
        } else {
            comment.trim().to_string()
        };
        let body = serde_json::json!({
            "timeSpentSeconds": seconds,
            "comment": text_to_adf(&effective),
        });

        let start = Instant::now();
        match self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send_json(&body)
        {
            Ok(resp) => {
                api_log(
                    "POST",
                    &api_path,
                    resp.status().as_u16(),
                    start.elapsed().as_millis(),
                    &format!("issue={issue_key} seconds={seconds}"),
                );
                Ok(())
            }
            Err(e) => {
                api_log(
                    "POST",
                    &api_path,
                    error_status(&e),
                    start.elapsed().as_millis(),
                    &format!("issue={issue_key} error={e}"),
                );
                tracing::warn!(issue = issue_key, seconds, error = %e, "worklog post failed");
                Err(ChronaError::Network(format!(
                    "worklog post to {issue_key}: {e}"
                )))
            }
        }
    }

    /// List projects visible to the authenticated user.
    pub fn search_projects(&self) -> Result<Vec<ProjectRef>, ChronaError> {
        let api_path = "/rest/api/3/project/search";
        let url = format!("{}{api_path}?maxResults=50&orderBy=key", self.base_url);

        let start = Instant::now();
        match self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()
        {
            Ok(mut resp) => {
                let status = resp.status().as_u16();
                let val: serde_json::Value = resp
                    .body_mut()
                    .read_json()
                    .map_err(|e| ChronaError::Network(format!("project search response: {e}")))?;
                api_log("GET", api_path, status, start.elapsed().as_millis(), "");
                Ok(parse_projects(&val))
            }
            Err(e) => {
                api_log(
                    "GET",
                    api_path,
                    error_status(&e),
                    start.elapsed().as_millis(),
                    &format!("error={e}"),
                );
                tracing::warn!(error = %e, "project search failed");
                Err(ChronaError::Network(format!("project search: {e}")))
            }
        }
    }
}

impl JiraClient {
    /// Search users by name or email; used to resolve assignee account ids.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserRef>, ChronaError> {
        let api_path = "/rest/api/3/user/search";
        let url = format!(
            "{}{api_path}?maxResults=20&query={}",
            self.base_url,
            urlencode(query)
        );

        let start = Instant::now();
        match self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()
        {
            Ok(mut resp) => {
                let status = resp.status().as_u16();
                let val: serde_json::Value = resp
                    .body_mut()
                    .read_json()
                    .map_err(|e| ChronaError::Network(format!("user search response: {e}")))?;
                api_log("GET", api_path, status, start.elapsed().as_millis(), "");
                Ok(parse_users(&val))
            }
            Err(e) => {
                api_log(
                    "GET",
                    api_path,
                    error_status(&e),
                    start.elapsed().as_millis(),
                    &format!("error={e}"),
                );
                tracing::warn!(error = %e, "user search failed");
                Err(ChronaError::Network(format!("user search: {e}")))
            }
        }
    }
}

/// Percent-encode a query parameter value (unreserved characters pass).
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn parse_users(val: &serde_json::Value) -> Vec<UserRef> {
    val.as_array()
        .map(|users| {
            users
                .iter()
                .filter_map(|u| {
                    let account_id = u.get("accountId").and_then(|v| v.as_str())?;
                    Some(UserRef {
                        account_id: account_id.to_string(),
                        display_name: u
                            .get("displayName")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn error_status(e: &ureq::Error) -> u16 {
    match e {
        ureq::Error::StatusCode(code) => *code,
        _ => 0,
    }
}

fn parse_issue_details(val: &serde_json::Value) -> IssueDetails {
    let fields = val.get("fields").cloned().unwrap_or_default();
    IssueDetails {
        key: val
            .get("key")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        summary: fields
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        status: fields
            .pointer("/status/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        issue_type: fields
            .pointer("/issuetype/name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        parent: fields
            .pointer("/parent/key")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

fn parse_projects(val: &serde_json::Value) -> Vec<ProjectRef> {
    val.get("values")
        .and_then(|v| v.as_array())
        .map(|values| {
            values
                .iter()
                .filter_map(|p| {
                    let key = p.get("key").and_then(|v| v.as_str())?;
                    Some(ProjectRef {
                        key: key.to_string(),
                        name: p
                            .get("name")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn fallback_comment(seconds: i64) -> String {
    format!("Work on task ({}m)", seconds / 60)
}

/// Convert plain text to Atlassian Document Format. Blank lines are skipped
/// because empty paragraph nodes render as a blank description in Jira.
pub fn text_to_adf(text: &str) -> serde_json::Value {
    let mut paragraphs: Vec<serde_json::Value> = text
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::json!({
                "type": "paragraph",
                "content": [{"type": "text", "text": line}],
            })
        })
        .collect();
    if paragraphs.is_empty() {
        paragraphs.push(serde_json::json!({
            "type": "paragraph",
            "content": [{"type": "text", "text": if text.is_empty() { "—" } else { text }}],
        }));
    }
    serde_json::json!({"version": 1, "type": "doc", "content": paragraphs})
}
