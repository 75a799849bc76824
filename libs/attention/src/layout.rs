//! Geometry of the view: drawing constants, canvas size and token packing.

use crate::config::TokenBox;

/// Font size; also the text baseline offset inside a token box
pub const TEXT_SIZE: f64 = 15.0;
/// Height of a token box
pub const BOX_HEIGHT: f64 = 22.5;
/// Vertical gap between the Observed and Observer panels
pub const MATRIX_WIDTH: f64 = 115.0;
/// Side of a head selection box
pub const CHECKBOX_SIZE: f64 = 20.0;
/// Where drawing starts on the y axis
pub const TEXT_TOP: f64 = 30.0;
/// Maximum length of a line of text
pub const LINE_WIDTH: f64 = 870.0;

/// Width and height of the drawing surface.
pub fn canvas_size(dy_total: f64) -> (f64, f64) {
    let width = LINE_WIDTH + 20.0;
    let height = MATRIX_WIDTH + 2.0 * (dy_total + BOX_HEIGHT) + TEXT_TOP;
    (width, height)
}

/// Vertical offset of the Observer panel relative to the Observed one.
pub fn observer_offset(dy_total: f64) -> f64 {
    MATRIX_WIDTH + dy_total
}

/// Leading space drawn before a token's text.
pub fn kerning_offset(kerning: f64) -> f64 {
    0.3 * (0.25 + kerning) * TEXT_SIZE
}

/// Rendered text length of a token label at [`TEXT_SIZE`].
pub trait TextMeasure {
    fn text_length(&mut self, text: &str, bold: bool) -> f64;
}

impl<F> TextMeasure for F
where
    F: FnMut(&str, bool) -> f64,
{
    fn text_length(&mut self, text: &str, bold: bool) -> f64 {
        self(text, bold)
    }
}

/// Final position of a token label and its background box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedToken {
    pub x: f64,
    pub y: f64,
    /// Text offset from `x`
    pub dx: f64,
    /// Background box width: kerning plus measured text length
    pub width: f64,
}

/// Place tokens from their layout hints.
///
/// A token on the same row as its predecessor is moved to start right after
/// the predecessor's measured text. Tokens that begin a new row keep the
/// supplied x offset.
pub fn pack_tokens(
    tokens: &[String],
    boxes: &[TokenBox],
    prompt_length: usize,
    measure: &mut impl TextMeasure,
) -> Vec<PlacedToken> {
    let mut placed: Vec<PlacedToken> = Vec::with_capacity(tokens.len());

    for (i, (text, hint)) in tokens.iter().zip(boxes).enumerate() {
        let dx = kerning_offset(hint.kerning);
        let width = dx + measure.text_length(text, i < prompt_length);

        let x = match (i.checked_sub(1).map(|p| boxes[p]), placed.last()) {
            (Some(prev_hint), Some(prev)) if prev_hint.y == hint.y => prev.x + prev.width,
            _ => hint.x,
        };

        placed.push(PlacedToken {
            x,
            y: hint.y,
            dx,
            width,
        });
    }

    placed
}
