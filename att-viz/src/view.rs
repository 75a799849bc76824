//! DOM binding of one visualization: draws the scene as SVG under the root
//! container and routes browser events back into the model.

use crate::dom::{font_weight, set_attrs, svg_child, SvgMeasure, LABEL_STYLE};
use crate::events::{self, opacity_style, px, Listeners, Target, CHANGE, DOUBLE_CLICK, MOUSE_LEAVE, MOUSE_OVER};
use attention::layout::{BOX_HEIGHT, TEXT_SIZE};
use attention::{HeadStrip, Panel, PanelScene, Redraw, Visualization, VizEvent};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlOptionElement, HtmlSelectElement};

type Listener = Closure<dyn FnMut(Event)>;
type Attached = Listeners<Element, Listener>;

/// Log to the browser console
pub fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

pub fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub struct View {
    viz: Visualization,
    document: Document,
    /// The `#vis` element the SVG is drawn into
    vis: Element,
    observed_boxes: Vec<Element>,
    observer_boxes: Vec<Element>,
    head_boxes: Vec<Element>,
    /// Listeners of the current render; replaced on every render
    listeners: Attached,
    /// Change listener of the `#layer` selector
    layer_listener: Attached,
}

impl View {
    /// Validate `json`, locate the root container and draw the first render.
    pub fn mount(json: &str) -> Result<Rc<RefCell<View>>, JsValue> {
        let viz = Visualization::from_json(json).map_err(to_js)?;

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let root_id = viz.config().root_id().to_string();
        let root = document
            .get_element_by_id(&root_id)
            .ok_or_else(|| to_js(format!("no element with id '{root_id}'")))?;
        let vis = root
            .query_selector("#vis")?
            .ok_or_else(|| to_js(format!("'{root_id}' has no #vis element")))?;

        log(&format!(
            "attention view '{}': {} tokens, {} layers, {} heads",
            root_id,
            viz.config().tokens().len(),
            viz.config().layer_count(),
            viz.config().head_count()
        ));

        let view = Rc::new(RefCell::new(View {
            viz,
            document,
            vis,
            observed_boxes: Vec::new(),
            observer_boxes: Vec::new(),
            head_boxes: Vec::new(),
            listeners: Listeners::new(),
            layer_listener: Listeners::new(),
        }));

        install_layer_selector(&view, &root)?;
        render(&view)?;
        Ok(view)
    }

    pub fn viz(&self) -> &Visualization {
        &self.viz
    }

    fn boxes(&self, panel: Panel) -> &[Element] {
        match panel {
            Panel::Observed => &self.observed_boxes,
            Panel::Observer => &self.observer_boxes,
        }
    }

    /// Push a panel's opacities and fills to its background boxes.
    fn paint_panel(&self, panel: Panel) -> Result<(), JsValue> {
        let Some(scene) = self.viz.scene() else {
            return Ok(());
        };
        for (rect, node) in self.boxes(panel).iter().zip(&scene.panel(panel).tokens) {
            rect.set_attribute("style", &opacity_style(node.opacity))?;
            rect.set_attribute("fill", &node.fill.css())?;
        }
        Ok(())
    }

    fn paint_heads(&self) -> Result<(), JsValue> {
        let Some(strip) = self.viz.scene().and_then(|s| s.head_strip.as_ref()) else {
            return Ok(());
        };
        for (rect, head_box) in self.head_boxes.iter().zip(&strip.boxes) {
            rect.set_attribute("fill", &head_box.fill.css())?;
        }
        Ok(())
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.listeners.detach_all(detach);
        self.layer_listener.detach_all(detach);
    }
}

fn detach(element: &Element, kind: &'static str, listener: &Listener) {
    if let Err(err) = element.remove_event_listener_with_callback(kind, listener.as_ref().unchecked_ref()) {
        log(&format!("attention view: removing {kind} listener: {:?}", err));
    }
}

/// Apply an event and refresh whatever it changed.
pub fn apply(view: &Rc<RefCell<View>>, event: VizEvent) -> Result<Redraw, JsValue> {
    let redraw = view.borrow_mut().viz.handle(event).map_err(to_js)?;
    match redraw {
        Redraw::Nothing => {}
        Redraw::Panel(panel) => view.borrow().paint_panel(panel)?,
        Redraw::HeadStrip => view.borrow().paint_heads()?,
        Redraw::Full => render(view)?,
    }
    Ok(redraw)
}

fn dispatch(view: &Rc<RefCell<View>>, event: VizEvent) {
    match apply(view, event) {
        Ok(redraw) => {
            if let Some(msg) = events::refused(event, redraw) {
                log(&msg);
            }
        }
        Err(err) => log(&format!("attention view: {:?}", err)),
    }
}

/// Clear the drawing element and draw the current layer from scratch.
pub fn render(view: &Rc<RefCell<View>>) -> Result<(), JsValue> {
    let weak = Rc::downgrade(view);
    let mut guard = view.borrow_mut();
    let this = &mut *guard;

    this.listeners.detach_all(detach);
    this.vis.set_inner_html("");

    let svg = svg_child(&this.document, &this.vis, "svg")?;
    let mut measure = SvgMeasure::new(&this.document, &svg)?;
    let scene = this.viz.render(&mut measure).map_err(to_js)?.clone();
    measure.finish();

    let (width, height) = (px(scene.width), px(scene.height));
    set_attrs(&svg, &[("width", width.as_str()), ("height", height.as_str())])?;

    let mut ctx = DrawContext {
        document: &this.document,
        view: &weak,
        listeners: &mut this.listeners,
    };
    this.observed_boxes = ctx.panel(&svg, &scene.observed)?;
    this.observer_boxes = ctx.panel(&svg, &scene.observer)?;
    this.head_boxes = match &scene.head_strip {
        Some(strip) => ctx.head_strip(&svg, strip)?,
        None => Vec::new(),
    };

    Ok(())
}

struct DrawContext<'a> {
    document: &'a Document,
    view: &'a Weak<RefCell<View>>,
    listeners: &'a mut Attached,
}

impl DrawContext<'_> {
    fn listen(&mut self, element: &Element, kind: &'static str, target: Target) -> Result<(), JsValue> {
        let Some(event) = events::viz_event(kind, target) else {
            return Ok(());
        };
        let view = self.view.clone();
        let listener = Closure::wrap(Box::new(move |_: Event| {
            if let Some(view) = view.upgrade() {
                dispatch(&view, event);
            }
        }) as Box<dyn FnMut(Event)>);

        element.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
        self.listeners.push(element.clone(), kind, listener);
        Ok(())
    }

    /// Draw one token panel; returns its background boxes in token order.
    fn panel(&mut self, svg: &Element, scene: &PanelScene) -> Result<Vec<Element>, JsValue> {
        let panel = scene.panel;
        let group = svg_child(self.document, svg, "g")?;
        group.set_id(panel.id());
        let tokens = svg_child(self.document, &group, "g")?;

        let height = BOX_HEIGHT.to_string();
        let font_size = px(TEXT_SIZE);
        let dy = TEXT_SIZE.to_string();
        let mut boxes = Vec::with_capacity(scene.tokens.len());

        for (index, node) in scene.tokens.iter().enumerate() {
            let token = svg_child(self.document, &tokens, "g")?;
            let (x, y) = (node.place.x.to_string(), node.place.y.to_string());

            let rect = svg_child(self.document, &token, "rect")?;
            let (style, fill, width) = (opacity_style(node.opacity), node.fill.css(), node.place.width.to_string());
            set_attrs(
                &rect,
                &[
                    ("class", "background"),
                    ("style", style.as_str()),
                    ("fill", fill.as_str()),
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("width", width.as_str()),
                    ("height", height.as_str()),
                ],
            )?;

            let text = svg_child(self.document, &token, "text")?;
            let dx = node.place.dx.to_string();
            set_attrs(
                &text,
                &[
                    ("font-size", font_size.as_str()),
                    ("font-weight", font_weight(node.bold)),
                    ("style", LABEL_STYLE),
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("dx", dx.as_str()),
                    ("dy", dy.as_str()),
                ],
            )?;
            text.set_text_content(Some(&node.text));

            self.listen(&token, MOUSE_OVER, Target::Token { panel, index })?;
            boxes.push(rect);
        }

        self.listen(&group, DOUBLE_CLICK, Target::Panel(panel))?;
        self.listen(&group, MOUSE_LEAVE, Target::Panel(panel))?;
        Ok(boxes)
    }

    /// Draw the head selection strip; returns its boxes in head order.
    fn head_strip(&mut self, svg: &Element, strip: &HeadStrip) -> Result<Vec<Element>, JsValue> {
        let container = svg_child(self.document, svg, "g")?;
        let size = HeadStrip::BOX_SIZE.to_string();
        let font_size = px(HeadStrip::LABEL_FONT_SIZE);
        let dx = HeadStrip::LABEL_DX.to_string();
        let dy = HeadStrip::LABEL_DY.to_string();
        let mut rects = Vec::with_capacity(strip.boxes.len());

        for head_box in &strip.boxes {
            let group = svg_child(self.document, &container, "g")?;
            let (x, y) = (head_box.x.to_string(), head_box.y.to_string());

            let rect = svg_child(self.document, &group, "rect")?;
            let fill = head_box.fill.css();
            set_attrs(
                &rect,
                &[
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("width", size.as_str()),
                    ("height", size.as_str()),
                    ("fill", fill.as_str()),
                ],
            )?;

            let label = svg_child(self.document, &group, "text")?;
            set_attrs(
                &label,
                &[
                    ("font-size", font_size.as_str()),
                    ("style", LABEL_STYLE),
                    ("x", x.as_str()),
                    ("y", y.as_str()),
                    ("dx", dx.as_str()),
                    ("dy", dy.as_str()),
                ],
            )?;
            label.set_text_content(Some(&head_box.label));

            self.listen(&group, DOUBLE_CLICK, Target::Head(head_box.head))?;
            rects.push(rect);
        }

        Ok(rects)
    }
}

/// Fill the `#layer` selector and re-render on change. Only for multi-layer
/// bundles; installed once per mount.
fn install_layer_selector(view: &Rc<RefCell<View>>, root: &Element) -> Result<(), JsValue> {
    let select = {
        let this = view.borrow();
        let config = this.viz.config();
        if config.layer_count() <= 1 {
            return Ok(());
        }

        let select = root
            .query_selector("#layer")?
            .ok_or("root container has no #layer selector")?
            .dyn_into::<HtmlSelectElement>()?;
        // A previous mount on the same root leaves its options behind
        select.set_inner_html("");
        for layer in config.layers() {
            let value = layer.to_string();
            let option = HtmlOptionElement::new_with_text_and_value(&value, &value)?;
            select.append_child(&option)?;
        }
        select.set_value(&this.viz.state().layer_value().to_string());
        select
    };

    let weak = Rc::downgrade(view);
    let source = select.clone();
    let listener = Closure::wrap(Box::new(move |_: Event| {
        let Some(view) = weak.upgrade() else {
            return;
        };
        match events::layer_change(&source.value()) {
            Some(event) => dispatch(&view, event),
            None => log(&format!("attention view: bad layer value '{}'", source.value())),
        }
    }) as Box<dyn FnMut(Event)>);

    select.add_event_listener_with_callback(CHANGE, listener.as_ref().unchecked_ref())?;
    view.borrow_mut().layer_listener.push(select.into(), CHANGE, listener);
    Ok(())
}
