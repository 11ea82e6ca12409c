pub mod redact;

mod autocreate;
mod dispatch;
mod git;
mod lifecycle;
mod parse;
mod recorder;

// Re-export public API (CLI consumers unchanged)
pub use dispatch::{hook_entrypoint_from_stdin, HookResult};
pub use lifecycle::{post_approved_worklogs, PostSummary};
