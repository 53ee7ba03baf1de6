use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("invalid utf-8 in received frame")]
    InvalidUtf8,

    #[error("malformed message: {source}")]
    Malformed {
        #[from]
        source: serde_json::Error,
    },
}
