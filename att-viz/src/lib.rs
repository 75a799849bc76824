//! Self-Attention Token View for the browser
//!
//! WASM front-end drawing the attention view as SVG inside a host-provided
//! container (a notebook cell or a standalone page).

mod dom;
mod events;
mod view;

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;
use view::{apply, log, render, to_js, View};
use wasm_bindgen::prelude::*;

pub use attention::{Panel, VizEvent};

/// Install the panic hook
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Set up panic hook for better error messages in WASM
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    Ok(())
}

/// Render the bundle `params` (JSON string or plain object) into the
/// container it names.
#[wasm_bindgen(js_name = "renderAttention")]
pub fn render_attention(params: JsValue) -> Result<AttentionViz, JsValue> {
    let json = match params.as_string() {
        Some(json) => json,
        None => js_sys::JSON::stringify(&params)?.into(),
    };
    let view = View::mount(&json).inspect_err(|err| log(&format!("attention view: {:?}", err)))?;
    Ok(AttentionViz { view })
}

/// Handle to a mounted visualization
#[wasm_bindgen]
pub struct AttentionViz {
    view: Rc<RefCell<View>>,
}

#[wasm_bindgen]
impl AttentionViz {
    /// Redraw from scratch, releasing both pins
    pub fn render(&self) -> Result<(), JsValue> {
        render(&self.view)
    }

    /// Switch to a layer value, as the layer selector does
    #[wasm_bindgen(js_name = "selectLayer")]
    pub fn select_layer(&self, value: usize) -> Result<(), JsValue> {
        apply(&self.view, VizEvent::LayerChange { value }).map(|_| ())
    }

    /// Double-click a head box. Returns whether the selection changed.
    #[wasm_bindgen(js_name = "selectHead")]
    pub fn select_head(&self, head: usize) -> Result<bool, JsValue> {
        let redraw = apply(&self.view, VizEvent::HeadDoubleClick { head })?;
        Ok(redraw != attention::Redraw::Nothing)
    }

    #[wasm_bindgen(getter, js_name = "currentHead")]
    pub fn current_head(&self) -> usize {
        self.view.borrow().viz().state().head()
    }

    #[wasm_bindgen(getter, js_name = "currentLayer")]
    pub fn current_layer(&self) -> usize {
        self.view.borrow().viz().state().layer_value()
    }

    #[wasm_bindgen(getter, js_name = "tokenCount")]
    pub fn token_count(&self) -> usize {
        self.view.borrow().viz().config().tokens().len()
    }

    /// Whether a panel is pinned (0: Observed, 1: Observer)
    #[wasm_bindgen(js_name = "isPinned")]
    pub fn is_pinned(&self, panel: u8) -> Result<bool, JsValue> {
        let panel = match panel {
            0 => Panel::Observed,
            1 => Panel::Observer,
            other => return Err(to_js(format!("no panel {other}"))),
        };
        Ok(self.view.borrow().viz().state().is_pinned(panel))
    }
}
