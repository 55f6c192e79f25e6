//! Stylesheet rule extraction.
//!
//! Parses `selector { declarations }` blocks into [`StyleElement`]s. Matching
//! selectors against nodes is not done here or anywhere in the engine; rules
//! are stored on the document in source order for an external resolver.

use flint_dom::ColorRgba;
use flint_dom::Display;
use flint_dom::Position;
use flint_dom::Style;
use flint_dom::StyleElement;

/// Parses CSS source into rule order [`StyleElement`]s. Unknown properties
/// and values are ignored; at-rules are skipped wholesale.
pub fn parse_rules(input: &str) -> Vec<StyleElement> {
    let mut rules = Vec::new();
    let bytes = input.as_bytes();
    let mut cursor = 0_usize;

    while cursor < bytes.len() {
        let Some(open) = find_byte(bytes, cursor, b'{') else {
            break;
        };
        let Some(close) = find_matching_brace(bytes, open) else {
            break;
        };

        let selector_raw = input[cursor..open].trim();
        let body = &input[open + 1..close];
        cursor = close + 1;

        if selector_raw.starts_with('@') || selector_raw.is_empty() {
            continue;
        }

        for selector in selector_raw.split(',') {
            let selector = selector.split_whitespace().collect::<Vec<_>>().join(" ");
            if selector.is_empty() {
                continue;
            }
            rules.push(StyleElement {
                selector,
                style: parse_declarations(body),
            });
        }
    }

    rules
}

/// Builds a [`Style`] from a declaration block body.
pub fn parse_declarations(body: &str) -> Style {
    let mut style = Style::default();

    for declaration in body.split(';') {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        match name.as_str() {
            "color" => {
                if let Some(color) = parse_color(value) {
                    style.color = color;
                }
            }
            "background-color" | "background" => {
                style.background = parse_color(value);
            }
            "font-size" => {
                if let Some(size) = parse_px(value) {
                    style.font_size = size;
                }
            }
            "font-weight" => {
                style.font_weight = match value {
                    "bold" => 700,
                    "normal" => 400,
                    other => other.parse().unwrap_or(style.font_weight),
                };
            }
            "display" => {
                if let Some(display) = Display::from_keyword(value) {
                    style.display = display;
                }
            }
            "position" => {
                if let Some(position) = Position::from_keyword(value) {
                    style.position = position;
                }
            }
            "width" => style.width = parse_px(value),
            "height" => style.height = parse_px(value),
            "top" => style.top = parse_px(value),
            "left" => style.left = parse_px(value),
            _ => {}
        }
    }

    style
}

/// Parses `#rgb`, `#rrggbb`, and a handful of named colors.
pub fn parse_color(value: &str) -> Option<ColorRgba> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_color(hex);
    }

    match value.to_ascii_lowercase().as_str() {
        "black" => Some(ColorRgba::BLACK),
        "white" => Some(ColorRgba::WHITE),
        "red" => Some(ColorRgba::opaque(1.0, 0.0, 0.0)),
        "green" => Some(ColorRgba::opaque(0.0, 0.5, 0.0)),
        "blue" => Some(ColorRgba::opaque(0.0, 0.0, 1.0)),
        "yellow" => Some(ColorRgba::opaque(1.0, 1.0, 0.0)),
        "orange" => Some(ColorRgba::opaque(1.0, 0.65, 0.0)),
        "gray" | "grey" => Some(ColorRgba::opaque(0.5, 0.5, 0.5)),
        "silver" => Some(ColorRgba::opaque(0.75, 0.75, 0.75)),
        "transparent" => Some(ColorRgba::new(0.0, 0.0, 0.0, 0.0)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<ColorRgba> {
    let digits: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    let channel = |high: u32, low: u32| f64::from(high * 16 + low) / 255.0;

    match digits.as_slice() {
        [r, g, b] => Some(ColorRgba::opaque(
            channel(*r, *r),
            channel(*g, *g),
            channel(*b, *b),
        )),
        [r1, r2, g1, g2, b1, b2] => Some(ColorRgba::opaque(
            channel(*r1, *r2),
            channel(*g1, *g2),
            channel(*b1, *b2),
        )),
        _ => None,
    }
}

fn parse_px(value: &str) -> Option<f64> {
    let number = value.trim().strip_suffix("px").unwrap_or(value.trim());
    number.trim().parse().ok().filter(|parsed: &f64| parsed.is_finite())
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

fn find_matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0_usize;
    for (offset, byte) in bytes[open..].iter().enumerate() {
        match *byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
