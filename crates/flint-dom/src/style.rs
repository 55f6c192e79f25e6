//! Declarative visual properties stored on nodes and documents.

/// RGBA color, channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorRgba {
    pub const BLACK: Self = Self::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::opaque(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Converts to 8-bit RGBA, clamping each channel.
    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        ]
    }
}

/// CSS-like display keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Block,
    Inline,
    None,
}

impl Display {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "block" => Some(Self::Block),
            "inline" => Some(Self::Inline),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// CSS-like position keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Absolute,
}

impl Position {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "static" => Some(Self::Static),
            "absolute" => Some(Self::Absolute),
            _ => None,
        }
    }
}

/// Resolved visual properties for one node.
///
/// Selector-to-node resolution is an external concern; the tree only stores
/// whatever resolved style a caller hands it.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub color: ColorRgba,
    pub background: Option<ColorRgba>,
    pub font_size: f64,
    pub font_weight: u16,
    pub display: Display,
    pub position: Position,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub top: Option<f64>,
    pub left: Option<f64>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: ColorRgba::BLACK,
            background: None,
            font_size: 16.0,
            font_weight: 400,
            display: Display::Block,
            position: Position::Static,
            width: None,
            height: None,
            top: None,
            left: None,
        }
    }
}

/// One parsed stylesheet rule: a selector paired with its declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleElement {
    pub selector: String,
    pub style: Style,
}
