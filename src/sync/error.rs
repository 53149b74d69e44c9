use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("sync channel closed")]
    Closed,
    #[error("sync transport error: {0}")]
    Transport(String),
    #[error("sync codec error: {0}")]
    Codec(String),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync coordinator must be initialized inside a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
