use thiserror::Error;

/// Transport-fatal errors: the connection is done, the endpoint should stop.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer closed the connection")]
    ConnectionClosed,
}
