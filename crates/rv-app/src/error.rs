use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Error from backend: {0}")]
    BackendError(String),

    #[error("Invalid configuration: {name} = '{value}' ({reason})")]
    Config {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Failed to write video to {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
