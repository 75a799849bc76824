//! Tests for att-viz crate

use crate::events::{
    layer_change, opacity_style, px, refused, viz_event, Listeners, Target, CHANGE, DOUBLE_CLICK, MOUSE_LEAVE, MOUSE_OVER,
};
use attention::{Panel, Redraw, VizEvent};

#[test]
fn test_token_hover_maps_to_pointer_enter() {
    let target = Target::Token { panel: Panel::Observer, index: 4 };
    assert_eq!(
        viz_event(MOUSE_OVER, target),
        Some(VizEvent::PointerEnter { panel: Panel::Observer, index: 4 })
    );
    // Double-clicks are handled on the panel group, not per token
    assert_eq!(viz_event(DOUBLE_CLICK, target), None);
}

#[test]
fn test_panel_events() {
    let target = Target::Panel(Panel::Observed);
    assert_eq!(
        viz_event(MOUSE_LEAVE, target),
        Some(VizEvent::PointerLeave { panel: Panel::Observed })
    );
    assert_eq!(
        viz_event(DOUBLE_CLICK, target),
        Some(VizEvent::DoubleClick { panel: Panel::Observed })
    );
    assert_eq!(viz_event(MOUSE_OVER, target), None);
}

#[test]
fn test_head_double_click() {
    assert_eq!(
        viz_event(DOUBLE_CLICK, Target::Head(3)),
        Some(VizEvent::HeadDoubleClick { head: 3 })
    );
    assert_eq!(viz_event(MOUSE_LEAVE, Target::Head(3)), None);
}

#[test]
fn test_layer_change_parsing() {
    assert_eq!(layer_change("2"), Some(VizEvent::LayerChange { value: 2 }));
    assert_eq!(layer_change(" 11 "), Some(VizEvent::LayerChange { value: 11 }));
    assert_eq!(layer_change(""), None);
    assert_eq!(layer_change("-1"), None);
}

#[test]
fn test_formatting() {
    assert_eq!(px(890.0), "890px");
    assert_eq!(px(22.5), "22.5px");
    assert_eq!(opacity_style(0.0), "opacity: 0");
    assert_eq!(opacity_style(0.9), "opacity: 0.9");
}

#[test]
fn test_refused_head_selection_is_reported() {
    let event = VizEvent::HeadDoubleClick { head: 2 };
    let msg = refused(event, Redraw::Nothing).unwrap();
    assert!(msg.contains("head 2"));

    assert_eq!(refused(event, Redraw::HeadStrip), None);
    assert_eq!(refused(VizEvent::DoubleClick { panel: Panel::Observed }, Redraw::Nothing), None);
}

#[test]
fn test_listeners_detach_before_drop() {
    use std::cell::RefCell;
    use std::rc::Rc;

    // Records the order of detaching and dropping
    struct Tracked(Rc<RefCell<Vec<String>>>);
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.borrow_mut().push("dropped".to_string());
        }
    }

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut listeners = Listeners::new();
    listeners.push("observed", MOUSE_OVER, Tracked(log.clone()));
    listeners.push("layer", CHANGE, Tracked(log.clone()));
    assert_eq!(listeners.len(), 2);

    listeners.detach_all(|element, kind, _| log.borrow_mut().push(format!("detach {element} {kind}")));

    assert!(listeners.is_empty());
    assert_eq!(
        *log.borrow(),
        ["detach observed mouseover", "dropped", "detach layer change", "dropped"]
    );
}

#[test]
fn test_empty_listeners_detach_nothing() {
    let mut listeners: Listeners<&str, u32> = Listeners::default();
    let mut calls = 0;
    listeners.detach_all(|_, _, _| calls += 1);
    assert_eq!(calls, 0);
}
