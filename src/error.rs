use thiserror::Error;

pub type Result<T> = std::result::Result<T, HudError>;

#[derive(Debug, Error)]
pub enum HudError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(String),
}
