use crate::WirePosition;

/// View-space coordinate of the intersection centre, in percent.
pub const VIEW_CENTER: f64 = 50.0;

/// Position in the engine's frame. The engine reports roughly ±100 per axis
/// with `+y` pointing north.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnginePosition {
    pub x: f64,
    pub y: f64,
}

impl From<WirePosition> for EnginePosition {
    fn from(position: WirePosition) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

/// Position in percent of the rendered intersection, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewPosition {
    pub x: f64,
    pub y: f64,
}

/// Linear map from engine space into view space around [`VIEW_CENTER`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale_divisor: f64,
}

impl CoordinateMapper {
    pub fn new(scale_divisor: f64) -> Self {
        Self { scale_divisor }
    }

    pub fn scale_divisor(&self) -> f64 {
        if self.scale_divisor.is_finite() {
            self.scale_divisor.max(f64::EPSILON)
        } else {
            Self::default().scale_divisor
        }
    }

    /// Out-of-range input extrapolates; the engine may overshoot its lanes.
    pub fn to_view(&self, position: EnginePosition) -> ViewPosition {
        let divisor = self.scale_divisor();
        ViewPosition {
            x: VIEW_CENTER + position.x / divisor,
            y: VIEW_CENTER - position.y / divisor,
        }
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self { scale_divisor: 2.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64) -> EnginePosition {
        EnginePosition { x, y }
    }

    #[test]
    fn origin_maps_to_view_center() {
        for divisor in [2.0, 2.5] {
            let mapper = CoordinateMapper::new(divisor);
            assert_eq!(mapper.to_view(at(0.0, 0.0)), ViewPosition { x: 50.0, y: 50.0 });
        }
    }

    #[test]
    fn x_grows_right_and_y_is_inverted() {
        let mapper = CoordinateMapper::default();
        let view = mapper.to_view(at(100.0, 100.0));
        assert_eq!(view, ViewPosition { x: 100.0, y: 0.0 });
        let view = mapper.to_view(at(-100.0, -100.0));
        assert_eq!(view, ViewPosition { x: 0.0, y: 100.0 });
    }

    #[test]
    fn mapping_is_linear_and_monotonic() {
        let mapper = CoordinateMapper::new(2.5);
        let mut previous = mapper.to_view(at(-100.0, -100.0));
        let mut step = -100.0;
        while step < 100.0 {
            step += 12.5;
            let next = mapper.to_view(at(step, step));
            assert!(next.x > previous.x);
            assert!(next.y < previous.y);
            assert!((next.x - previous.x - 12.5 / 2.5).abs() < 1e-9);
            previous = next;
        }
    }

    #[test]
    fn overshoot_extrapolates() {
        let mapper = CoordinateMapper::default();
        let view = mapper.to_view(at(140.0, -130.0));
        assert_eq!(view, ViewPosition { x: 120.0, y: 115.0 });
    }

    #[test]
    fn degenerate_divisor_stays_total() {
        let view = CoordinateMapper::new(f64::NAN).to_view(at(10.0, 10.0));
        assert_eq!(view, ViewPosition { x: 55.0, y: 45.0 });
        let view = CoordinateMapper::new(0.0).to_view(at(0.0, 0.0));
        assert_eq!(view, ViewPosition { x: 50.0, y: 50.0 });
    }
}
