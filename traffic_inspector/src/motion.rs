use std::collections::HashMap;

use traffic_runtime::{VehicleId, VehicleRecord, ViewPosition};

const SNAP_DISTANCE: f64 = 0.05;

/// Eases each vehicle toward its latest view position between frames.
/// Keyed on identity, so a vehicle keeps gliding as long as the engine keeps
/// its id; a newly seen id starts at its reported spot.
#[derive(Debug, Clone)]
pub struct MotionTracker {
    easing: f64,
    positions: HashMap<VehicleId, ViewPosition>,
}

impl MotionTracker {
    pub fn new(easing: f64) -> Self {
        Self {
            easing: easing.clamp(0.0, 1.0),
            positions: HashMap::new(),
        }
    }

    pub fn advance(&mut self, vehicles: &[VehicleRecord]) {
        let mut next = HashMap::with_capacity(vehicles.len());
        for record in vehicles {
            let target = record.view_position;
            let position = match self.positions.get(&record.id) {
                Some(current) => self.step(*current, target),
                None => target,
            };
            next.insert(record.id.clone(), position);
        }
        self.positions = next;
    }

    pub fn position(&self, id: &VehicleId) -> Option<ViewPosition> {
        self.positions.get(id).copied()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    fn step(&self, current: ViewPosition, target: ViewPosition) -> ViewPosition {
        let dx = target.x - current.x;
        let dy = target.y - current.y;
        if dx.abs() < SNAP_DISTANCE && dy.abs() < SNAP_DISTANCE {
            return target;
        }
        ViewPosition {
            x: current.x + dx * self.easing,
            y: current.y + dy * self.easing,
        }
    }
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new(0.35)
    }
}
