//! Background color type and lenient user-input parsing
//!
//! Invalid channel values and unknown palette selections fall back to white
//! instead of failing; callers that care can inspect the parse result.

use image::Rgba;

/// Solid background color (8-bit RGB, always fully opaque when composited)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Named palette offered by the interactive color picker
pub const PALETTE: &[(&str, BackgroundColor)] = &[
    ("White", BackgroundColor::WHITE),
    ("Black", BackgroundColor::BLACK),
    ("Red", BackgroundColor::RED),
    ("Green", BackgroundColor::GREEN),
    ("Blue", BackgroundColor::BLUE),
];

impl BackgroundColor {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);

    /// Create a color from 8-bit channel values
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse three user-supplied channel strings.
    ///
    /// Returns `None` when any channel is non-numeric or outside 0-255;
    /// the caller decides on the fallback (the CLI uses white).
    #[must_use]
    pub fn parse_rgb_triple(r: &str, g: &str, b: &str) -> Option<Self> {
        Some(Self::new(
            parse_channel(r)?,
            parse_channel(g)?,
            parse_channel(b)?,
        ))
    }

    /// Resolve a palette selection (1-based index as entered at the prompt).
    ///
    /// Unrecognized selections resolve to white, matching the lenient
    /// behavior of the RGB path.
    #[must_use]
    pub fn from_palette_choice(choice: &str) -> (Self, &'static str) {
        choice
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| PALETTE.get(idx))
            .map_or((Self::WHITE, "White"), |&(name, color)| (color, name))
    }

    /// The color as a fully opaque RGBA pixel
    #[must_use]
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Parse one channel value, accepting surrounding whitespace
fn parse_channel(input: &str) -> Option<u8> {
    input.trim().parse::<u8>().ok()
}
