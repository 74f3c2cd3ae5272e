use thiserror::Error;

pub type ShredResult<T> = Result<T, ShredError>;

#[derive(Debug, Error)]
pub enum ShredError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
