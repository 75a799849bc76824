//! Self-Attention Token View
//!
//! DOM-free model of an interactive attention visualization: two token
//! panels ("Observed" above, "Observer" below) lit by the attention weights of
//! one selected head, a head selection strip, and a layer selector.
//! Front-ends build a [`Visualization`], render it with their own text
//! measurement and forward user input as [`VizEvent`]s.

pub mod bundle;
pub mod colour;
pub mod config;
pub mod highlight;
pub mod layout;
pub mod page;
pub mod scene;
pub mod state;
pub mod viz;

pub use bundle::{aggregate, prettify_tokens, token_layout, Aggregation, LayoutOptions, HEAD_CHUNK};
pub use config::{AttentionBundle, AttentionConfig, AttentionParams, AttentionTensor, ConfigError, TokenBox};
pub use layout::TextMeasure;
pub use page::host_page;
pub use scene::{Fill, HeadStrip, PanelScene, Scene, TokenNode};
pub use state::{Panel, RenderState, StateError};
pub use viz::{Redraw, Visualization, VizEvent};
