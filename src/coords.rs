//! Coordinate spaces used by the hero.
//!
//! Input arrives in page space (CSS pixels, origin top-left, +Y down). The
//! shader works in surface space (device pixels of the drawing buffer, origin
//! bottom-left, +Y up). [`Projection::project`] is the only conversion between
//! the two, so the types below are deliberately not interchangeable.

/// A position reported by the browser for an input event.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

impl PagePoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position in drawing-buffer pixels, Y-up.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 2] {
        [self.x as f32, self.y as f32]
    }
}

/// Page → surface mapping for the current scale factor and surface height.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub scale: f64,
    pub surface_height: f64,
}

impl Projection {
    #[inline]
    pub const fn new(scale: f64, surface_height: f64) -> Self {
        Self {
            scale,
            surface_height,
        }
    }

    /// `(x·s, H − y·s)`.
    #[inline]
    pub fn project(&self, page: PagePoint) -> SurfacePoint {
        SurfacePoint::new(
            page.x * self.scale,
            self.surface_height - page.y * self.scale,
        )
    }
}

/// Rendering scale for a given device pixel ratio.
///
/// The hero renders at `density` times the native pixel density but never
/// drops below `min_scale`.
#[inline]
pub fn device_scale(device_pixel_ratio: f64, density: f64, min_scale: f64) -> f64 {
    min_scale.max(density * device_pixel_ratio)
}

/// Size of the drawing buffer in device pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DrawableSize {
    pub width: u32,
    pub height: u32,
}

impl DrawableSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `logical × scale`, truncated to whole pixels like `canvas.width`.
    pub fn from_viewport(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width: to_pixels(width * scale),
            height: to_pixels(height * scale),
        }
    }
}

fn to_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.floor().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
