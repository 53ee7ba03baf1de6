//! Routes the upstream client's inbound data to the tracking coordinator.

use std::sync::Arc;

use bearing_bus::ClientCallbacks;
use bearing_proto::{SInfData, TResData};
use bearing_track::TrackingCoordinator;

pub struct UpstreamCallbacks {
    coordinator: Arc<TrackingCoordinator>,
}

impl UpstreamCallbacks {
    pub fn new(coordinator: Arc<TrackingCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl ClientCallbacks for UpstreamCallbacks {
    fn on_tres(&self, data: TResData) {
        self.coordinator.update_tracks(data);
    }

    fn on_sinf(&self, data: SInfData) {
        self.coordinator.update_cams(data);
    }
}
