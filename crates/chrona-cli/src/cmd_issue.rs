use std::path::Path;

use chrona_store::config::load_credentials;
use chrona_jira::{CreateIssue, JiraClient};

/// `chrona issue create` — create an issue via the REST gateway
pub fn create(
    root: &Path,
    summary: &str,
    issue_type: &str,
    parent: Option<&str>,
    labels: Vec<String>,
) -> anyhow::Result<()> {
    let cfg = chrona_store::config::Config::load(root).unwrap_or_default();
    if cfg.project_key.is_empty() {
        anyhow::bail!("no projectKey configured (run `chrona init --project KEY`)");
    }
    let creds = load_credentials(root);
    let client = JiraClient::new(&creds)?;

    let created = client.create_issue(&CreateIssue {
        project_key: cfg.project_key,
        summary: summary.to_string(),
        issue_type: issue_type.to_string(),
        parent_key: parent.map(str::to_string),
        assignee_id: if creds.account_id.is_empty() {
            None
        } else {
            Some(creds.account_id.clone())
        },
        labels,
    })?;
    println!(
        "{}",
        serde_json::json!({"key": created.key, "id": created.id})
    );
    Ok(())
}

/// `chrona issue get <KEY>` — fetch an issue
pub fn get(root: &Path, key: &str) -> anyhow::Result<()> {
    let creds = load_credentials(root);
    let client = JiraClient::new(&creds)?;
    let issue = client.get_issue(key)?;
    println!(
        "{}",
        serde_json::json!({
            "key": issue.key,
            "summary": issue.summary,
            "status": issue.status,
            "type": issue.issue_type,
            "parent": issue.parent,
        })
    );
    Ok(())
}

/// `chrona issue classify <TEXT>` — run the keyword classifier
pub fn classify(text: &str) -> anyhow::Result<()> {
    let result = chrona_core::classify::classify(text, None);
    println!(
        "{}",
        serde_json::json!({
            "type": result.issue_type.as_str(),
            "confidence": result.confidence,
            "signals": result.matched_signals,
        })
    );
    Ok(())
}

/// `chrona projects` — list visible projects
pub fn projects(root: &Path) -> anyhow::Result<()> {
    let creds = load_credentials(root);
    let client = JiraClient::new(&creds)?;
    let projects = client.search_projects()?;
    if projects.is_empty() {
        println!("No projects visible.");
        return Ok(());
    }
    for p in projects {
        println!("{}  {}", p.key, p.name);
    }
    Ok(())
}

/// `chrona users <QUERY>` — search users for assignee resolution
pub fn users(root: &Path, query: &str) -> anyhow::Result<()> {
    let creds = load_credentials(root);
    let client = JiraClient::new(&creds)?;
    let users = client.search_users(query)?;
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    for u in users {
        println!("{}  {}", u.account_id, u.display_name);
    }
    Ok(())
}
