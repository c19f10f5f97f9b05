//! Screen-space to soundfield mapping.
//!
//! A target rectangle on the desktop is turned into an azimuth/elevation pair
//! around the listener. Horizontal position spans a 180° field; vertical
//! position maps into a band at or below ear level.

/// Screen rectangle in desktop pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Angles of one cue, in degrees. Positive azimuth is to the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialFrame {
    pub azimuth: f64,
    pub elevation: f64,
}

impl SpatialFrame {
    /// Source position handed to the engine: `(azimuth, elevation, 0)`.
    pub fn position(&self) -> [f32; 3] {
        [self.azimuth as f32, self.elevation as f32, 0.0]
    }
}

/// Converts target rectangles into [`SpatialFrame`]s.
#[derive(Debug, Clone, Copy)]
pub struct SpatialMapper {
    /// Horizontal extent of the field in degrees.
    pub display_width: f64,
    /// Elevation of the bottom screen edge.
    pub height_min: f64,
    /// Elevation span from bottom to top screen edge.
    pub height_magnitude: f64,
}

/// Engine limit for both angles.
const ANGLE_LIMIT: f64 = 90.0;

impl SpatialMapper {
    pub const fn new(display_width: f64, height_min: f64, height_magnitude: f64) -> Self {
        Self {
            display_width,
            height_min,
            height_magnitude,
        }
    }

    /// Straight ahead at mid-screen height.
    pub fn neutral(&self) -> SpatialFrame {
        SpatialFrame {
            azimuth: 0.0,
            elevation: clamp_angle(self.height_min + 0.5 * self.height_magnitude),
        }
    }

    /// Map `target` on `desktop` to angles.
    ///
    /// Only the desktop's width and height are used (its origin is assumed
    /// at 0,0). A missing target rectangle or a degenerate desktop yields
    /// [`SpatialMapper::neutral`].
    pub fn map(&self, target: Option<Rect>, desktop: Rect) -> SpatialFrame {
        let max_x = desktop.width as f64;
        let max_y = desktop.height as f64;
        if max_x <= 0.0 || max_y <= 0.0 {
            return self.neutral();
        }

        let Some(rect) = target else {
            return self.neutral();
        };
        let (cx, cy) = rect.center();

        let azimuth = ((cx - max_x / 2.0) / max_x) * self.display_width;

        // Screen y grows downward; flip so the top edge is "above".
        let percent = (max_y - cy) / max_y;
        let elevation = percent * self.height_magnitude + self.height_min;

        SpatialFrame {
            azimuth: clamp_angle(azimuth),
            elevation: clamp_angle(elevation),
        }
    }
}

impl Default for SpatialMapper {
    fn default() -> Self {
        Self::new(180.0, -40.0, 50.0)
    }
}

fn clamp_angle(angle: f64) -> f64 {
    angle.clamp(-ANGLE_LIMIT, ANGLE_LIMIT)
}
