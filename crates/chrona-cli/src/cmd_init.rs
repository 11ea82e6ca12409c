use std::path::Path;

/// `chrona init` — write a starter project config
pub fn run(root: &Path, project_key: &str, force: bool) -> anyhow::Result<()> {
    let path = chrona_store::config_path(root);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let branch_pattern = if project_key.is_empty() {
        String::new()
    } else {
        r"^(?:feature|fix|hotfix|chore|docs)/({key}-\d+)".to_string()
    };
    let cfg = serde_json::json!({
        "projectKey": project_key,
        "enabled": true,
        "autonomyLevel": "C",
        "accuracy": 5,
        "idleThreshold": 15,
        "timeRounding": 15,
        "worklogInterval": 15,
        "autoCreate": false,
        "branchPattern": branch_pattern,
        "defaultLabels": ["chrona"],
        "debugLog": false,
    });

    chrona_store::write_atomic(&path, serde_json::to_string_pretty(&cfg)?.as_bytes())?;
    println!("Wrote {}", path.display());
    if project_key.is_empty() {
        println!("  note: set projectKey before enabling autoCreate");
    }
    println!(
        "  credentials go in {} (baseUrl, email, apiToken)",
        chrona_store::local_config_path(root).display()
    );
    Ok(())
}
