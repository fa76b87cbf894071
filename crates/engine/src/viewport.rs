/// Smallest render scale the quality control can reach. A zero scale would
/// produce a zero-sized texture, which the surface APIs reject.
const MIN_SCALE: f32 = 0.05;

/// Tracks the logical surface size and the render quality scale, and derives
/// the internal render resolution from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    logical: (u32, u32),
    scale: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            logical: (width.max(1), height.max(1)),
            scale: 1.0,
        }
    }

    /// Updates the logical size from a window resize. Zero dimensions are
    /// clamped; minimized windows report 0x0 and must not tear down textures.
    pub fn set_logical(&mut self, width: u32, height: u32) {
        self.logical = (width.max(1), height.max(1));
    }

    /// Sets the quality scale, clamped to (0, 1]. Returns the value actually
    /// stored.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        self.scale = scale.clamp(MIN_SCALE, 1.0);
        self.scale
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical
    }

    /// Internal render resolution: floor of logical x scale, never below 1x1.
    pub fn render_size(&self) -> (u32, u32) {
        let width = ((self.logical.0 as f32) * self.scale).floor() as u32;
        let height = ((self.logical.1 as f32) * self.scale).floor() as u32;
        (width.max(1), height.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_size_floors_fractional_pixels() {
        let mut viewport = Viewport::new(1920, 1080);
        viewport.set_scale(0.5);
        assert_eq!(viewport.render_size(), (960, 540));

        viewport.set_scale(0.33);
        assert_eq!(viewport.render_size(), (633, 356));
    }

    #[test]
    fn full_scale_matches_logical_size() {
        let viewport = Viewport::new(2560, 1440);
        assert_eq!(viewport.render_size(), (2560, 1440));
    }

    #[test]
    fn scale_clamps_to_unit_interval() {
        let mut viewport = Viewport::new(800, 600);
        assert_eq!(viewport.set_scale(2.0), 1.0);
        assert_eq!(viewport.set_scale(0.0), MIN_SCALE);
        assert_eq!(viewport.set_scale(-1.0), MIN_SCALE);
        assert!(viewport.render_size().0 >= 1);
    }

    #[test]
    fn zero_logical_size_is_clamped() {
        let mut viewport = Viewport::new(0, 0);
        assert_eq!(viewport.logical_size(), (1, 1));
        viewport.set_logical(0, 720);
        assert_eq!(viewport.logical_size(), (1, 720));
        assert_eq!(viewport.render_size(), (1, 720));
    }
}
