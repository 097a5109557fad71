//! Perspective projection of in-view landmarks onto the camera overlay

use crate::core::ScreenSize;
use crate::utils::config::ArConfig;
use nalgebra::Point2;

/// Screen-space placement of one marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Marker anchor in pixels, origin top-left
    pub position: Point2<f64>,
    pub scale: f64,
    pub opacity: f64,
    pub z_index: i32,
    /// 1 at the camera, 0 at or beyond `max_depth_m`
    pub depth: f64,
}

/// Maps angular offset and distance to screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveProjector {
    horizontal_fov_deg: f64,
    edge_epsilon_deg: f64,
    screen_margin_px: f64,
    max_depth_m: f64,
    far_scale: f64,
    near_scale: f64,
    far_opacity: f64,
    near_opacity: f64,
    base_z_index: i32,
    label_char_offset_px: f64,
}

/// Share of the screen height used to lift distant markers toward the horizon
const DEPTH_LIFT_RATIO: f64 = 0.2;
/// Share of the screen height a full 90° pitch moves the markers
const PITCH_SHIFT_RATIO: f64 = 0.3;

impl PerspectiveProjector {
    pub fn from_config(config: &ArConfig) -> Self {
        Self {
            horizontal_fov_deg: config.horizontal_fov_deg,
            edge_epsilon_deg: config.edge_epsilon_deg,
            screen_margin_px: config.screen_margin_px,
            max_depth_m: config.max_depth_m,
            far_scale: config.far_scale,
            near_scale: config.near_scale,
            far_opacity: config.far_opacity,
            near_opacity: config.near_opacity,
            base_z_index: config.base_z_index,
            label_char_offset_px: config.label_char_offset_px,
        }
    }

    /// Project a gated landmark.
    ///
    /// `pitch_deg` is horizon-zero and positive when the camera points below
    /// the horizon; tilting down moves markers up the screen.
    pub fn project(&self, angle_diff_deg: f64, distance_m: f64, pitch_deg: f64, screen: ScreenSize) -> Projection {
        let x = self.screen_x(angle_diff_deg, screen.width);
        let y = self.screen_y(distance_m, pitch_deg, screen.height);

        let depth = self.depth(distance_m);
        Projection {
            position: Point2::new(x, y),
            scale: lerp(self.far_scale, self.near_scale, depth),
            opacity: lerp(self.far_opacity, self.near_opacity, depth),
            z_index: self.base_z_index + (depth * 1000.0).round() as i32,
            depth,
        }
    }

    fn screen_x(&self, angle_diff_deg: f64, width: f64) -> f64 {
        let half_fov = self.horizontal_fov_deg / 2.0;
        let limit = (half_fov - self.edge_epsilon_deg).max(0.0);
        let clamped = angle_diff_deg.clamp(-limit, limit);

        let norm_x = clamped.to_radians().tan() / half_fov.to_radians().tan();
        let x = width / 2.0 + norm_x * width / 2.0;
        clamp_inside(x, self.screen_margin_px, width)
    }

    fn screen_y(&self, distance_m: f64, pitch_deg: f64, height: f64) -> f64 {
        let depth_factor = (distance_m / self.max_depth_m).min(1.0);
        let lift = depth_factor * height * DEPTH_LIFT_RATIO;
        let pitch_shift = (-pitch_deg / 90.0) * height * PITCH_SHIFT_RATIO;

        let y = height * 0.5 - lift + pitch_shift;
        clamp_inside(y, self.screen_margin_px, height)
    }

    fn depth(&self, distance_m: f64) -> f64 {
        (1.0 - distance_m / self.max_depth_m).clamp(0.0, 1.0)
    }

    /// Horizontal shift that roughly centers a label of this name on its anchor
    pub fn label_offset(&self, name: &str) -> f64 {
        -(name.chars().count() as f64 * self.label_char_offset_px)
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Clamp to `[margin, extent - margin]`, collapsing to `margin` on tiny screens
fn clamp_inside(value: f64, margin: f64, extent: f64) -> f64 {
    let upper = (extent - margin).max(margin);
    value.clamp(margin, upper)
}
