//! Mapping from DOM events to visualization events, and the small
//! formatting helpers the DOM layer shares.

use attention::{Panel, Redraw, VizEvent};

pub const MOUSE_OVER: &str = "mouseover";
pub const MOUSE_LEAVE: &str = "mouseleave";
pub const DOUBLE_CLICK: &str = "dblclick";
pub const CHANGE: &str = "change";

/// Element a listener is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Group of one token (background box + label)
    Token { panel: Panel, index: usize },
    /// Group of a whole panel
    Panel(Panel),
    /// Group of one head selection box
    Head(usize),
}

/// The visualization event a DOM event of `kind` on `target` stands for.
pub fn viz_event(kind: &str, target: Target) -> Option<VizEvent> {
    match (kind, target) {
        (MOUSE_OVER, Target::Token { panel, index }) => Some(VizEvent::PointerEnter { panel, index }),
        (MOUSE_LEAVE, Target::Panel(panel)) => Some(VizEvent::PointerLeave { panel }),
        (DOUBLE_CLICK, Target::Panel(panel)) => Some(VizEvent::DoubleClick { panel }),
        (DOUBLE_CLICK, Target::Head(head)) => Some(VizEvent::HeadDoubleClick { head }),
        _ => None,
    }
}

/// Layer selector value to layer change.
pub fn layer_change(value: &str) -> Option<VizEvent> {
    value
        .trim()
        .parse()
        .ok()
        .map(|value| VizEvent::LayerChange { value })
}

pub fn px(value: f64) -> String {
    format!("{value}px")
}

pub fn opacity_style(opacity: f64) -> String {
    format!("opacity: {opacity}")
}

/// Message for an event the model refused, if `redraw` shows it was refused.
pub fn refused(event: VizEvent, redraw: Redraw) -> Option<String> {
    match (event, redraw) {
        (VizEvent::HeadDoubleClick { head }, Redraw::Nothing) => {
            Some(format!("attention view: head {head} not selected, a different head is already active"))
        }
        _ => None,
    }
}

/// Listeners attached to elements, detached together before they are dropped.
///
/// A listener must leave its element before the closure behind it is freed,
/// otherwise the browser keeps calling a dead function.
pub struct Listeners<E, L> {
    entries: Vec<(E, &'static str, L)>,
}

impl<E, L> Listeners<E, L> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn push(&mut self, element: E, kind: &'static str, listener: L) {
        self.entries.push((element, kind, listener));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `detach` on every entry, then drop the listeners.
    pub fn detach_all(&mut self, mut detach: impl FnMut(&E, &'static str, &L)) {
        for (element, kind, listener) in self.entries.drain(..) {
            detach(&element, kind, &listener);
        }
    }
}

impl<E, L> Default for Listeners<E, L> {
    fn default() -> Self {
        Self::new()
    }
}
