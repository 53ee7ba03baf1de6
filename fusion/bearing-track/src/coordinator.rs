//! Joins upstream camera angle updates with cached station poses, invokes
//! the solver, maintains track lifecycle, and publishes solved fixes
//! downstream.

use std::sync::Arc;

use parking_lot::Mutex;

use bearing_bus::{now_secs, DataServer};
use bearing_proto::{CamAngle3, DataPayload, SInfData, TRes3Data, TResData};
use bearing_solve::{solve, CameraResult};
use vecmath::Vec3;

use crate::registry::CameraRegistry;
use crate::track::Track;

/// Magnitude given to the reconstructed world-space bearing direction. Only
/// the direction matters to the solver (it normalizes by `d . d`); this
/// just keeps the vector comfortably away from the zero-length guard.
const BEARING_DIRECTION_MAGNITUDE: f64 = 100.0;

pub struct TrackingCoordinator {
    server: Arc<DataServer>,
    registry: Mutex<CameraRegistry>,
    tracks: Mutex<Vec<Track>>,
}

impl TrackingCoordinator {
    pub fn new(server: Arc<DataServer>) -> Self {
        Self {
            server,
            registry: Mutex::new(CameraRegistry::new()),
            tracks: Mutex::new(Vec::new()),
        }
    }

    /// Upsert the station's pose/fov/resolution and broadcast it downstream.
    pub fn update_cams(&self, sinf: SInfData) {
        self.registry.lock().upsert(sinf.clone());
        self.server.record_camera(sinf.clone());
        self.server.publish(DataPayload::Sinf { data: sinf });
    }

    /// Convert each surviving camera angle to a world-space bearing, solve,
    /// update track state, and publish the fix. No-op (beyond a log line)
    /// when fewer than two bearings survive or the solver fails to converge.
    pub fn update_tracks(&self, tres: TResData) {
        let registry = self.registry.lock();
        let mut lines = Vec::with_capacity(tres.cam_angles.len());
        let mut cam_angles3 = Vec::with_capacity(tres.cam_angles.len());

        for angle in &tres.cam_angles {
            let Some(sinf) = registry.get(angle.cam_id) else {
                tracing::debug!(cam_id = angle.cam_id, "unknown camera, skipping bearing");
                continue;
            };
            let Some(result) = bearing_for(sinf, angle.direction) else {
                tracing::debug!(cam_id = angle.cam_id, "zero-length bore, skipping bearing");
                continue;
            };
            cam_angles3.push(CamAngle3 {
                cam_id: angle.cam_id,
                origin: result.origin.xyz(),
                direction: result.direction.xyz(),
            });
            lines.push(result);
        }
        drop(registry);

        if lines.len() < 2 {
            tracing::warn!(
                track_id = tres.track_id,
                surviving = lines.len(),
                "fewer than 2 bearings survived, skipping update"
            );
            return;
        }

        let (position, accuracy) = match solve(&lines) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(track_id = tres.track_id, error = %err, "solver failed to converge");
                return;
            }
        };
        tracing::debug!(track_id = tres.track_id, accuracy, "solved track position");

        let track_type = self.match_pos_track(position, tres.track_id);

        self.server.publish(DataPayload::Tres3 {
            data: TRes3Data {
                track_id: tres.track_id,
                track_type,
                cam_angles: cam_angles3,
                position: position.xyz(),
            },
        });
    }

    /// Single-track reference policy: there is exactly one live track slot.
    /// The first update creates it; every later update — regardless of the
    /// incoming `track_id` — overwrites that same slot's position.
    fn match_pos_track(&self, position: Vec3, track_id: u64) -> i8 {
        let mut tracks = self.tracks.lock();
        let time = now_secs();
        if let Some(track) = tracks.first_mut() {
            track.push(time, position);
            track.track_type
        } else {
            let track = Track::new(track_id, time, position);
            let track_type = track.track_type;
            tracks.push(track);
            track_type
        }
    }
}

/// Steps 1-4 of the angle -> world-space bearing conversion: the station's
/// own bore direction, offset by the incoming (azimuth, elevation) deltas,
/// re-expressed as a fixed-magnitude direction vector.
fn bearing_for(sinf: &SInfData, offset: (f64, f64)) -> Option<CameraResult> {
    let origin = Vec3::from_cartesian(sinf.position.0, sinf.position.1, sinf.position.2);
    let raw_bore = Vec3::from_cartesian(sinf.direction.0, sinf.direction.1, sinf.direction.2);
    let bore = raw_bore.normalize()?;

    let azimuth = bore.angle_xy() + offset.0;
    let elevation = bore.angle_xz() + offset.1;
    let direction = Vec3::from_polar(azimuth, elevation, BEARING_DIRECTION_MAGNITUDE);

    Some(CameraResult::new(origin, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bearing_proto::CamAngle;

    fn sinf(id: u32, position: (f64, f64, f64), direction: (f64, f64, f64)) -> SInfData {
        SInfData {
            id,
            position,
            direction,
            fov: (1.0, 1.0),
            resolution: (640.0, 480.0),
        }
    }

    #[tokio::test]
    async fn single_bearing_produces_no_broadcast() {
        let server = DataServer::start("127.0.0.1:0").await.unwrap();
        let coordinator = TrackingCoordinator::new(server.clone());
        coordinator.update_cams(sinf(0, (10.0, 0.0, 0.0), (-1.0, 0.0, 0.0)));

        coordinator.update_tracks(TResData {
            track_id: 0,
            cam_angles: vec![CamAngle {
                cam_id: 0,
                direction: (0.0, 0.0),
            }],
        });

        assert!(coordinator.tracks.lock().is_empty());
        server.stop().await;
    }

    #[tokio::test]
    async fn unknown_camera_is_skipped() {
        let server = DataServer::start("127.0.0.1:0").await.unwrap();
        let coordinator = TrackingCoordinator::new(server.clone());
        coordinator.update_cams(sinf(0, (10.0, 0.0, 0.0), (-1.0, 0.0, 0.0)));
        coordinator.update_cams(sinf(1, (-10.0, 0.0, 0.0), (1.0, 0.0, 0.0)));

        coordinator.update_tracks(TResData {
            track_id: 0,
            cam_angles: vec![
                CamAngle {
                    cam_id: 0,
                    direction: (0.0, 0.0),
                },
                CamAngle {
                    cam_id: 1,
                    direction: (0.0, 0.0),
                },
                CamAngle {
                    cam_id: 99,
                    direction: (0.0, 0.0),
                },
            ],
        });

        let tracks = coordinator.tracks.lock();
        assert_eq!(tracks.len(), 1);
        assert!(tracks[0].latest_position().norm() < 5.0);
        server.stop().await;
    }

    #[tokio::test]
    async fn repeated_updates_collapse_to_one_track_slot() {
        let server = DataServer::start("127.0.0.1:0").await.unwrap();
        let coordinator = TrackingCoordinator::new(server.clone());
        coordinator.update_cams(sinf(0, (10.0, 0.0, 0.0), (-1.0, 0.0, 0.0)));
        coordinator.update_cams(sinf(1, (-10.0, 0.0, 0.0), (1.0, 0.0, 0.0)));

        let make_tres = |track_id: u64| TResData {
            track_id,
            cam_angles: vec![
                CamAngle {
                    cam_id: 0,
                    direction: (0.0, 0.0),
                },
                CamAngle {
                    cam_id: 1,
                    direction: (0.0, 0.0),
                },
            ],
        };

        coordinator.update_tracks(make_tres(1));
        coordinator.update_tracks(make_tres(2));

        let tracks = coordinator.tracks.lock();
        assert_eq!(tracks.len(), 1, "single-track policy collapses all ids to one slot");
        assert_eq!(tracks[0].id, 1, "the slot keeps the id it was created with");
        assert_eq!(tracks[0].position_history.len(), 2);
        server.stop().await;
    }
}
