use winit::dpi::PhysicalSize;

/// Drawable size of the presentation surface in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// False while the window is minimized or not yet laid out.
    #[inline]
    pub fn is_drawable(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height; `None` for an undrawable surface.
    #[inline]
    pub fn aspect_ratio(self) -> Option<f32> {
        self.is_drawable()
            .then(|| self.width as f32 / self.height as f32)
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}
