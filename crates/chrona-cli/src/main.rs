mod cmd_hook;
mod cmd_init;
mod cmd_issue;
mod cmd_status;
mod cmd_worklog;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chrona", version, about = "Automatic Jira time tracking for coding agents")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter .claude/chrona.json config
    Init {
        /// Jira project key (e.g. PROJ)
        #[arg(long, default_value = "")]
        project: String,
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
    /// Claude Code hook entrypoints
    Hook {
        #[command(subcommand)]
        cmd: HookCmd,
    },
    /// Show the live session: active issues, buffer, chunks, pending worklogs
    Status,
    /// Worklog operations
    Worklog {
        #[command(subcommand)]
        cmd: WorklogCmd,
    },
    /// Issue operations against the ticket system
    Issue {
        #[command(subcommand)]
        cmd: IssueCmd,
    },
    /// List Jira projects visible to the configured user
    Projects,
    /// Search Jira users by name or email
    Users {
        /// Search query
        query: String,
    },
}

#[derive(Subcommand)]
enum HookCmd {
    /// Read a hook payload from stdin and dispatch it
    Claude,
}

#[derive(Subcommand)]
enum WorklogCmd {
    /// Build and print the worklog draft for an issue
    Build {
        /// Issue key (e.g. PROJ-42)
        issue: String,
    },
    /// Approve pending (and deferred) worklogs
    Approve,
    /// Hold pending worklogs back for a later decision
    Defer,
    /// Discard pending, deferred, and unattributed worklogs
    Drop,
    /// Post approved worklogs to the ticket system
    Post,
}

#[derive(Subcommand)]
enum IssueCmd {
    /// Create an issue
    Create {
        /// Issue summary
        #[arg(long)]
        summary: String,
        /// Issue type (Task, Bug, ...)
        #[arg(long = "type", default_value = "Task")]
        issue_type: String,
        /// Parent issue key
        #[arg(long)]
        parent: Option<String>,
        /// Labels (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,
    },
    /// Fetch an issue by key
    Get {
        /// Issue key
        key: String,
    },
    /// Classify free text as Bug or Task
    Classify {
        /// Text to classify
        text: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Init { project, force } => cmd_init::run(&cli.root, &project, force),
        Command::Hook { cmd } => match cmd {
            HookCmd::Claude => cmd_hook::claude(),
        },
        Command::Status => cmd_status::run(&cli.root),
        Command::Worklog { cmd } => match cmd {
            WorklogCmd::Build { issue } => cmd_worklog::build(&cli.root, &issue),
            WorklogCmd::Approve => cmd_worklog::approve(&cli.root),
            WorklogCmd::Defer => cmd_worklog::defer(&cli.root),
            WorklogCmd::Drop => cmd_worklog::drop_entries(&cli.root),
            WorklogCmd::Post => cmd_worklog::post(&cli.root),
        },
        Command::Issue { cmd } => match cmd {
            IssueCmd::Create {
                summary,
                issue_type,
                parent,
                labels,
            } => cmd_issue::create(&cli.root, &summary, &issue_type, parent.as_deref(), labels),
            IssueCmd::Get { key } => cmd_issue::get(&cli.root, &key),
            IssueCmd::Classify { text } => cmd_issue::classify(&text),
        },
        Command::Projects => cmd_issue::projects(&cli.root),
        Command::Users { query } => cmd_issue::users(&cli.root, &query),
    }
}
