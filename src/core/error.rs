use thiserror::Error;

#[derive(Error, Debug)]
pub enum NeoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Action catalog is empty: nothing would be allowed to run")]
    EmptyCatalog,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, NeoError>;
