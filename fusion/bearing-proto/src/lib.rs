mod error;
mod idextract;
mod message;

pub use error::ProtoError;
pub use idextract::try_find_id;
pub use message::{
    AckData, CamAngle, CamAngle3, DataPayload, Envelope, ReplData, ReqData, SInfData, TRes3Data,
    TResData,
};

/// Decode a received frame against the message schema.
///
/// Rejects envelopes whose `type` doesn't match the payload shape and, for
/// `data` envelopes, nested payloads whose inner `type` doesn't match theirs
/// — `serde`'s internally tagged enum does both checks during deserialize.
pub fn decode(raw: &str) -> Result<Envelope, ProtoError> {
    Ok(serde_json::from_str(raw)?)
}

/// Serialize an envelope. Every field in this schema is always present, so
/// there is nothing for `serde_json` to suppress — the schema's own shape
/// already satisfies the "unset fields absent" wire rule.
pub fn encode(envelope: &Envelope) -> Result<String, ProtoError> {
    Ok(serde_json::to_string(envelope)?)
}
