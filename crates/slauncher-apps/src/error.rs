//! Error types for slauncher-apps

#[derive(Debug, thiserror::Error)]
pub enum AppsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid selection file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} has no command to run")]
    EmptyCommand(String),

    #[error("Failed to launch {package}: {source}")]
    Launch {
        package: String,
        source: std::io::Error,
    },
}
