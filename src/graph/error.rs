use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Error(String),
    #[error("cannot read file")]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    RoutesError(#[from] crate::routes::error::Error),
    #[error(transparent)]
    ConfigError(#[from] crate::config::ConfigError),
}
