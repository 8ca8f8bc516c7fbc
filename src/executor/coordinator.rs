// Image-normalized → screen-normalized coordinate mapping.
use crate::executor::action::{ActionPoint, CoordSpace};
use crate::perception::types::CaptureContext;

/// Upper bound of the normalized coordinate space on both axes.
pub const NORM_MAX: f64 = 1000.0;

/// Converts coordinates the model gives against the (possibly cropped) image into
/// coordinates normalized against the whole logical screen.
///
/// Rebuilt from the latest [`CaptureContext`] every turn; without a context the
/// mapping is the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateMapper {
    ctx: Option<CaptureContext>,
}

impl CoordinateMapper {
    pub fn new(ctx: Option<CaptureContext>) -> Self {
        Self { ctx }
    }

    pub fn to_screen_normalized(&self, x: f64, y: f64) -> (u32, u32) {
        let Some(ctx) = self.ctx else {
            return (clamp_norm(x), clamp_norm(y));
        };
        let x = x.clamp(0.0, NORM_MAX);
        let y = y.clamp(0.0, NORM_MAX);

        let region = ctx.region;
        let monitor = ctx.monitor;
        let logical_w = ctx.logical_width.max(1) as f64;
        let logical_h = ctx.logical_height.max(1) as f64;

        // 1. image-normalized → physical pixels
        let phys_x = region.left as f64 + x / NORM_MAX * region.width as f64;
        let phys_y = region.top as f64 + y / NORM_MAX * region.height as f64;

        // 2. physical → logical
        let ratio_x = logical_w / monitor.width.max(1) as f64;
        let ratio_y = logical_h / monitor.height.max(1) as f64;

        // 3. relative to the monitor's logical origin
        let lx = phys_x * ratio_x - monitor.left as f64 * ratio_x;
        let ly = phys_y * ratio_y - monitor.top as f64 * ratio_y;

        // 4. re-normalize against the logical screen
        (
            clamp_norm(lx / logical_w * NORM_MAX),
            clamp_norm(ly / logical_h * NORM_MAX),
        )
    }

    /// Screen-normalized position for an action argument. `_ABS` points bypass mapping.
    pub fn resolve(&self, point: &ActionPoint) -> (u32, u32) {
        match point.space {
            CoordSpace::Screen => (clamp_norm(point.x), clamp_norm(point.y)),
            CoordSpace::Image => self.to_screen_normalized(point.x, point.y),
        }
    }
}

fn clamp_norm(v: f64) -> u32 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, NORM_MAX) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::types::ScreenRect;

    fn ctx(region: ScreenRect, monitor: ScreenRect, logical: (u32, u32)) -> CaptureContext {
        CaptureContext {
            region,
            monitor,
            logical_width: logical.0,
            logical_height: logical.1,
        }
    }

    #[test]
    fn no_context_is_identity_but_clamped() {
        let m = CoordinateMapper::default();
        assert_eq!(m.to_screen_normalized(250.0, 750.0), (250, 750));
        assert_eq!(m.to_screen_normalized(-20.0, 1400.0), (0, 1000));
    }

    #[test]
    fn full_screen_capture_maps_onto_itself() {
        let screen = ScreenRect::new(0, 0, 2560, 1440);
        let m = CoordinateMapper::new(Some(ctx(screen, screen, (1707, 960))));
        for v in [0.0, 123.0, 500.0, 999.0, 1000.0] {
            assert_eq!(m.to_screen_normalized(v, v), (v as u32, v as u32));
        }
    }

    #[test]
    fn cropped_region_maps_into_its_screen_area() {
        let monitor = ScreenRect::new(0, 0, 2000, 1000);
        let region = ScreenRect::new(500, 250, 1000, 500);
        let m = CoordinateMapper::new(Some(ctx(region, monitor, (2000, 1000))));
        assert_eq!(m.to_screen_normalized(0.0, 0.0), (250, 250));
        assert_eq!(m.to_screen_normalized(500.0, 500.0), (500, 500));
        assert_eq!(m.to_screen_normalized(1000.0, 1000.0), (750, 750));
    }

    #[test]
    fn scaling_and_monitor_origin_are_accounted_for() {
        // secondary-style origin with 150% scaling
        let monitor = ScreenRect::new(-3000, 0, 3000, 1500);
        let region = ScreenRect::new(-1500, 750, 1500, 750);
        let m = CoordinateMapper::new(Some(ctx(region, monitor, (2000, 1000))));
        assert_eq!(m.to_screen_normalized(0.0, 0.0), (500, 500));
        assert_eq!(m.to_screen_normalized(1000.0, 1000.0), (1000, 1000));
    }

    #[test]
    fn mapping_is_monotonic_and_bounded() {
        let monitor = ScreenRect::new(0, 0, 1920, 1080);
        let region = ScreenRect::new(100, 40, 1300, 900);
        let m = CoordinateMapper::new(Some(ctx(region, monitor, (1536, 864))));
        let mut last = (0, 0);
        for step in 0..=100 {
            let v = step as f64 * 10.0;
            let p = m.to_screen_normalized(v, v);
            assert!(p.0 <= 1000 && p.1 <= 1000);
            assert!(p.0 >= last.0 && p.1 >= last.1);
            last = p;
        }
    }

    #[test]
    fn absolute_points_bypass_mapping() {
        let monitor = ScreenRect::new(0, 0, 2000, 1000);
        let region = ScreenRect::new(500, 250, 1000, 500);
        let m = CoordinateMapper::new(Some(ctx(region, monitor, (2000, 1000))));
        let abs = ActionPoint { x: 10.0, y: 20.0, space: CoordSpace::Screen };
        let img = ActionPoint { x: 10.0, y: 20.0, space: CoordSpace::Image };
        assert_eq!(m.resolve(&abs), (10, 20));
        assert_ne!(m.resolve(&img), (10, 20));
    }
}
