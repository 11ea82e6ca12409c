use thiserror::Error;

/// Error taxonomy for Chrona operations.
///
/// None of these are fatal to the host: config errors degrade to defaults,
/// state corruption resets to a fresh session, and network errors mark the
/// affected worklog `failed` for a later retry.
#[derive(Debug, Error)]
pub enum ChronaError {
    #[error("config error: {0}")]
    Config(String),

    #[error("session state corrupt: {0}")]
    StateCorruption(String),

    #[error("jira request failed: {0}")]
    Network(String),
}
