//! SVG element helpers and text measurement.

use crate::events::px;
use crate::view::log;
use attention::layout::TEXT_SIZE;
use attention::TextMeasure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, SvgTextContentElement};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Create an SVG element and append it to `parent`.
pub fn svg_child(document: &Document, parent: &Element, tag: &str) -> Result<Element, JsValue> {
    let element = document.create_element_ns(Some(SVG_NS), tag)?;
    parent.append_child(&element)?;
    Ok(element)
}

pub fn set_attrs(element: &Element, attrs: &[(&str, &str)]) -> Result<(), JsValue> {
    for (name, value) in attrs {
        element.set_attribute(name, value)?;
    }
    Ok(())
}

/// Style applied to every label so text cannot be selected by double-clicks
pub const LABEL_STYLE: &str = "cursor: default; -webkit-user-select: none; user-select: none; text-anchor: start";

pub fn font_weight(bold: bool) -> &'static str {
    if bold {
        "bold"
    } else {
        "normal"
    }
}

/// Measures labels with a hidden scratch `<text>` element.
pub struct SvgMeasure {
    scratch: SvgTextContentElement,
}

impl SvgMeasure {
    pub fn new(document: &Document, svg: &Element) -> Result<Self, JsValue> {
        let scratch = svg_child(document, svg, "text")?;
        let font_size = px(TEXT_SIZE);
        set_attrs(&scratch, &[("font-size", font_size.as_str()), ("visibility", "hidden")])?;
        Ok(Self {
            scratch: scratch.dyn_into()?,
        })
    }

    /// Drop the scratch element from the document.
    pub fn finish(self) {
        self.scratch.remove();
    }
}

impl TextMeasure for SvgMeasure {
    fn text_length(&mut self, text: &str, bold: bool) -> f64 {
        if let Err(err) = self.scratch.set_attribute("font-weight", font_weight(bold)) {
            log(&format!("attention view: measuring '{text}' with stale font weight: {:?}", err));
        }
        self.scratch.set_text_content(Some(text));
        self.scratch.get_computed_text_length() as f64
    }
}
