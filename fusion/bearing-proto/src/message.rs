//! The wire message schema.
//!
//! Every message is a single JSON object shaped like
//! `{"type": ..., "id": ..., "time": ..., "data": ...}`. `serde`'s internally
//! tagged enum representation (`#[serde(tag = "type")]`) gives us exactly
//! that shape for free, both for the envelope and for the nested `data`
//! discriminator used by the `data` variant.

use serde::{Deserialize, Serialize};

/// A single bearing offset from one camera, relative to its bore sight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CamAngle {
    pub cam_id: u32,
    /// (azimuth_offset, elevation_offset), radians.
    pub direction: (f64, f64),
}

/// Upstream tracking result: per-camera 2D angles contributing to one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TResData {
    pub track_id: u64,
    pub cam_angles: Vec<CamAngle>,
}

/// Station information: a camera's pose, field of view and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SInfData {
    pub id: u32,
    pub position: (f64, f64, f64),
    pub direction: (f64, f64, f64),
    pub fov: (f64, f64),
    pub resolution: (f64, f64),
}

/// One camera's contribution to a solved 3D fix, as published downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CamAngle3 {
    pub cam_id: u32,
    pub origin: (f64, f64, f64),
    pub direction: (f64, f64, f64),
}

/// The solved 3D position for a track, with the rays that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TRes3Data {
    pub track_id: u64,
    /// -1 degraded, 0 new, 1 valid.
    pub track_type: i8,
    pub cam_angles: Vec<CamAngle3>,
    pub position: (f64, f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DataPayload {
    /// Upstream per-camera 2D angles, one per incoming tracking update.
    #[serde(rename = "tres")]
    Tres { data: TResData },
    /// A camera's pose/fov/resolution, sent upstream->downstream.
    #[serde(rename = "sinf")]
    Sinf { data: SInfData },
    /// Downstream 3D fix, published once the coordinator has solved a
    /// position. Distinct discriminator from `tres` since the shape
    /// (world position, per-camera rays, track type) differs entirely from
    /// the 2D angles the same envelope type carries upstream.
    #[serde(rename = "tres3")]
    Tres3 { data: TRes3Data },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReqData {
    pub req: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AckData {
    pub to: i64,
    pub ack: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplData {
    pub to: i64,
    /// Free-form keyed reply data.
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// The full envelope. `id` is assigned by the sender (see `bearing-bus`'s id
/// generator); `time` is the sender's wall-clock seconds as a float.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "req")]
    Req { id: i64, time: f64, data: ReqData },
    #[serde(rename = "ack")]
    Ack { id: i64, time: f64, data: AckData },
    #[serde(rename = "repl")]
    Repl { id: i64, time: f64, data: ReplData },
    #[serde(rename = "data")]
    Data {
        id: i64,
        time: f64,
        data: DataPayload,
    },
}

impl Envelope {
    pub fn id(&self) -> i64 {
        match self {
            Envelope::Req { id, .. }
            | Envelope::Ack { id, .. }
            | Envelope::Repl { id, .. }
            | Envelope::Data { id, .. } => *id,
        }
    }

    /// True for the message kinds that register a pending-reply future when
    /// sent: `req` and `data` (broadcasts). `ack` and `repl` are terminal.
    pub fn expects_reply(&self) -> bool {
        matches!(self, Envelope::Req { .. } | Envelope::Data { .. })
    }

    pub fn ack(to: i64, ack: bool, time: f64, id: i64) -> Envelope {
        Envelope::Ack {
            id,
            time,
            data: AckData { to, ack },
        }
    }
}
