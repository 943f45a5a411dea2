//! Placement of an image on the display surface.
//!
//! Pure integer arithmetic; clipping is the presenter's job.

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left pixel position of an image on the surface.  Either coordinate
/// may be negative when the image is larger than the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin {
    pub x: i32,
    pub y: i32,
}

/// How the image is positioned on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Centre the image, rounding towards negative infinity.
    #[default]
    Centered,
    /// Fixed offset from the surface's top-left corner.
    TopLeftOffset { x: i32, y: i32 },
}

impl Anchor {
    /// Computes where `image` lands on `surface`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trmnl_core::{Anchor, Bounds, Origin};
    ///
    /// let origin = Anchor::Centered.origin(Bounds::new(512, 342), Bounds::new(600, 300));
    /// assert_eq!(origin, Origin { x: -44, y: 21 });
    /// ```
    pub fn origin(self, surface: Bounds, image: Bounds) -> Origin {
        match self {
            Anchor::Centered => Origin {
                x: centre(surface.width, image.width),
                y: centre(surface.height, image.height),
            },
            Anchor::TopLeftOffset { x, y } => Origin { x, y },
        }
    }
}

fn centre(surface: u32, image: u32) -> i32 {
    let offset = (i64::from(surface) - i64::from(image)).div_euclid(2);
    offset.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
