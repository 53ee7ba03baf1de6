//! Camera registry: latest known pose/fov/resolution per camera id.

use std::collections::HashMap;

use bearing_proto::SInfData;

#[derive(Default)]
pub struct CameraRegistry {
    cameras: HashMap<u32, SInfData>,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insertions overwrite, never merge.
    pub fn upsert(&mut self, sinf: SInfData) {
        self.cameras.insert(sinf.id, sinf);
    }

    pub fn get(&self, cam_id: u32) -> Option<&SInfData> {
        self.cameras.get(&cam_id)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sinf(id: u32) -> SInfData {
        SInfData {
            id,
            position: (0.0, 0.0, 0.0),
            direction: (1.0, 0.0, 0.0),
            fov: (1.0, 1.0),
            resolution: (640.0, 480.0),
        }
    }

    #[test]
    fn upsert_overwrites_same_id() {
        let mut reg = CameraRegistry::new();
        reg.upsert(sinf(1));
        let mut updated = sinf(1);
        updated.fov = (2.0, 2.0);
        reg.upsert(updated);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(1).unwrap().fov, (2.0, 2.0));
    }

    #[test]
    fn distinct_ids_both_kept() {
        let mut reg = CameraRegistry::new();
        reg.upsert(sinf(1));
        reg.upsert(sinf(2));
        assert_eq!(reg.len(), 2);
    }
}
