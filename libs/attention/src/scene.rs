//! Backend-neutral description of what is on screen.
//!
//! The browser front-end turns a [`Scene`] into SVG once per render and then
//! only patches opacities and fills as events arrive.

use crate::colour::{head_colour, lighten, Rgb};
use crate::layout::{PlacedToken, CHECKBOX_SIZE, TEXT_SIZE};
use crate::state::Panel;

/// Background fill of the hovered token
pub const SELF_FILL: &str = "lightgray";

/// Background fill of a token box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// The token under the pointer
    Hovered,
    /// A token lit by the given head's attention
    Head(Rgb),
}

impl Fill {
    pub fn css(self) -> String {
        match self {
            Fill::Hovered => SELF_FILL.to_string(),
            Fill::Head(colour) => colour.css(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenNode {
    pub text: String,
    pub place: PlacedToken,
    pub bold: bool,
    pub opacity: f64,
    pub fill: Fill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelScene {
    pub panel: Panel,
    pub tokens: Vec<TokenNode>,
}

impl PanelScene {
    pub(crate) fn new(panel: Panel, tokens: &[String], placed: Vec<PlacedToken>, prompt_length: usize) -> Self {
        let tokens = tokens
            .iter()
            .zip(placed)
            .enumerate()
            .map(|(i, (text, place))| TokenNode {
                text: text.clone(),
                place,
                bold: i < prompt_length,
                opacity: 0.0,
                fill: Fill::Hovered,
            })
            .collect();

        Self { panel, tokens }
    }

    pub fn opacities(&self) -> Vec<f64> {
        self.tokens.iter().map(|t| t.opacity).collect()
    }

    pub(crate) fn light(&mut self, intensities: &[f64], hovered: usize, colour: Rgb) {
        for (i, (node, &opacity)) in self.tokens.iter_mut().zip(intensities).enumerate() {
            node.opacity = opacity;
            node.fill = if i == hovered {
                Fill::Hovered
            } else {
                Fill::Head(colour)
            };
        }
    }

    pub(crate) fn clear(&mut self) {
        for node in &mut self.tokens {
            node.opacity = 0.0;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadBox {
    pub head: usize,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub selected: bool,
    pub fill: Rgb,
}

/// Row of head selection boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadStrip {
    pub boxes: Vec<HeadBox>,
}

impl HeadStrip {
    pub const BOX_SIZE: f64 = CHECKBOX_SIZE;
    pub const LABEL_FONT_SIZE: f64 = 0.8 * TEXT_SIZE;
    pub const LABEL_DX: f64 = 0.1 * TEXT_SIZE;
    pub const LABEL_DY: f64 = TEXT_SIZE;

    pub(crate) fn new(head_visibility: &[bool], head_start_index: usize, top: f64) -> Self {
        let boxes = head_visibility
            .iter()
            .enumerate()
            .map(|(head, &selected)| HeadBox {
                head,
                label: (head + head_start_index).to_string(),
                x: head as f64 * Self::BOX_SIZE,
                y: top,
                selected,
                fill: box_fill(head, selected),
            })
            .collect();

        Self { boxes }
    }

    pub(crate) fn refresh(&mut self, head_visibility: &[bool]) {
        for (head_box, &selected) in self.boxes.iter_mut().zip(head_visibility) {
            head_box.selected = selected;
            head_box.fill = box_fill(head_box.head, selected);
        }
    }
}

fn box_fill(head: usize, selected: bool) -> Rgb {
    let colour = head_colour(head);
    if selected {
        colour
    } else {
        lighten(colour)
    }
}

/// Everything one render draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub observed: PanelScene,
    pub observer: PanelScene,
    /// Present only when there is more than one head
    pub head_strip: Option<HeadStrip>,
}

impl Scene {
    pub fn panel(&self, panel: Panel) -> &PanelScene {
        match panel {
            Panel::Observed => &self.observed,
            Panel::Observer => &self.observer,
        }
    }

    pub(crate) fn panel_mut(&mut self, panel: Panel) -> &mut PanelScene {
        match panel {
            Panel::Observed => &mut self.observed,
            Panel::Observer => &mut self.observer,
        }
    }
}
