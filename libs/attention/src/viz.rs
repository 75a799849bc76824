//! The visualization: configuration, selection state and the current scene,
//! driven by typed events.

use crate::colour::head_colour;
use crate::config::{AttentionConfig, ConfigError, TokenBox};
use crate::highlight;
use crate::layout::{canvas_size, observer_offset, pack_tokens, TextMeasure};
use crate::scene::{HeadStrip, PanelScene, Scene};
use crate::state::{Panel, RenderState, StateError};
use tracing::{debug, warn};

/// A user interaction, as seen by the visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizEvent {
    /// Pointer entered token `index` of `panel`
    PointerEnter { panel: Panel, index: usize },
    /// Pointer left `panel`
    PointerLeave { panel: Panel },
    /// Double-click anywhere on `panel`
    DoubleClick { panel: Panel },
    /// Double-click on a head selection box
    HeadDoubleClick { head: usize },
    /// Layer selector now holds `value`
    LayerChange { value: usize },
}

/// What the front-end has to refresh after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    Nothing,
    /// Opacities and fills of one panel's token boxes
    Panel(Panel),
    /// Fills of the head selection boxes
    HeadStrip,
    /// Everything: call [`Visualization::render`] again
    Full,
}

pub struct Visualization {
    config: AttentionConfig,
    state: RenderState,
    scene: Option<Scene>,
}

impl Visualization {
    pub fn new(config: AttentionConfig) -> Self {
        let state = RenderState::new(&config);
        Self {
            config,
            state,
            scene: None,
        }
    }

    /// Build from a JSON parameter bundle.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        AttentionConfig::from_json(json).map(Self::new)
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Scene of the last render, if any
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Rebuild the scene from scratch for the current layer and head.
    ///
    /// Both pins are released. Safe to call any number of times.
    pub fn render(&mut self, measure: &mut impl TextMeasure) -> Result<&Scene, StateError> {
        self.state.check(&self.config)?;
        self.state.reset_pins();

        let config = &self.config;
        let (width, height) = canvas_size(config.dy_total());
        let shift = observer_offset(config.dy_total());
        let lowered: Vec<TokenBox> = config.layout().iter().map(|b| b.shifted(shift)).collect();

        let observed = pack_tokens(config.tokens(), config.layout(), config.prompt_length(), measure);
        let observer = pack_tokens(config.tokens(), &lowered, config.prompt_length(), measure);

        let head_strip = (config.head_count() > 1).then(|| {
            HeadStrip::new(self.state.head_visibility(), config.head_start_index(), 0.0)
        });

        debug!(
            layer = self.state.layer_value(),
            head = self.state.head(),
            tokens = config.tokens().len(),
            "rendering attention view"
        );

        let scene = Scene {
            width,
            height,
            observed: PanelScene::new(Panel::Observed, config.tokens(), observed, config.prompt_length()),
            observer: PanelScene::new(Panel::Observer, config.tokens(), observer, config.prompt_length()),
            head_strip,
        };
        Ok(&*self.scene.insert(scene))
    }

    /// Apply an event to the state and scene.
    pub fn handle(&mut self, event: VizEvent) -> Result<Redraw, StateError> {
        match event {
            VizEvent::PointerEnter { panel, index } => Ok(self.hover(panel, index)),
            VizEvent::PointerLeave { panel } => {
                if self.state.is_pinned(panel) {
                    return Ok(Redraw::Nothing);
                }
                match self.scene.as_mut() {
                    Some(scene) => {
                        scene.panel_mut(panel).clear();
                        Ok(Redraw::Panel(panel))
                    }
                    None => Ok(Redraw::Nothing),
                }
            }
            VizEvent::DoubleClick { panel } => {
                let pinned = self.state.toggle_pin(panel);
                debug!(panel = panel.id(), pinned, "toggled pin");
                Ok(Redraw::Nothing)
            }
            VizEvent::HeadDoubleClick { head } => {
                if !self.state.select_head(head)? {
                    warn!(head, "ignored head selection");
                    return Ok(Redraw::Nothing);
                }
                debug!(head, "selected head");
                if let Some(strip) = self.scene.as_mut().and_then(|s| s.head_strip.as_mut()) {
                    strip.refresh(self.state.head_visibility());
                }
                Ok(Redraw::HeadStrip)
            }
            VizEvent::LayerChange { value } => {
                self.state.select_layer(&self.config, value)?;
                debug!(layer = value, "selected layer");
                Ok(Redraw::Full)
            }
        }
    }

    fn hover(&mut self, panel: Panel, index: usize) -> Redraw {
        if self.state.is_pinned(panel) {
            return Redraw::Nothing;
        }
        let Some(scene) = self.scene.as_mut() else {
            return Redraw::Nothing;
        };
        let head = self.state.head();
        let Some(matrix) = self.config.head_matrix(self.state.layer_index(), head) else {
            return Redraw::Nothing;
        };

        let lit = highlight::intensities(
            panel,
            matrix,
            self.config.prompt_length(),
            self.config.tokens().len(),
            index,
        );
        match lit {
            Some(intensities) => {
                scene.panel_mut(panel).light(&intensities, index, head_colour(head));
                Redraw::Panel(panel)
            }
            None => Redraw::Nothing,
        }
    }
}
