use thiserror::Error;

#[derive(Debug, Error)]
pub enum MainbrainError {
    #[error("transport setup failed: {0}")]
    Bus(#[from] bearing_bus::BusError),

    #[error("failed to read from standard input: {0}")]
    Stdin(#[from] std::io::Error),
}
