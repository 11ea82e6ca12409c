use std::io::Read;

/// `chrona hook claude` — read stdin, dispatch hook
pub fn claude() -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut stdin_buf) {
        debug_log(&format!("STDIN READ ERROR: {e}"));
        return Ok(());
    }

    let mut preview_end = stdin_buf.len().min(200);
    while !stdin_buf.is_char_boundary(preview_end) {
        preview_end -= 1;
    }
    debug_log(&format!(
        "STDIN({} bytes): {}",
        stdin_buf.len(),
        &stdin_buf[..preview_end]
    ));

    match chrona_bridge_claude::hook_entrypoint_from_stdin(&stdin_buf) {
        Ok(result) => {
            if let Some(output) = &result.stdout {
                debug_log(&format!("OK output({} bytes)", output.len()));
                print!("{output}");
            }
            if let Some(warning) = &result.stderr {
                debug_log(&format!("WARNING: {warning}"));
                eprintln!("{warning}");
                // Exit 1 = non-blocking warning; Claude Code shows stderr to
                // the user but does not block the conversation.
                std::process::exit(1);
            }
            if result.stdout.is_none() && result.stderr.is_none() {
                debug_log("OK (no output)");
            }
            Ok(())
        }
        Err(e) => {
            debug_log(&format!("ERROR: {e}"));
            // Exit 0 on internal errors — never block the host agent
            Ok(())
        }
    }
}

fn debug_log(msg: &str) {
    if std::env::var_os("CHRONA_DEBUG").is_none() {
        return;
    }
    use std::io::Write;
    let log_path = std::env::temp_dir().join("chrona-hook-debug.log");
    if let Ok(mut f) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let ts = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        let _ = writeln!(f, "[{ts}] {msg}");
    }
}
