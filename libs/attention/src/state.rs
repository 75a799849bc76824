//! Mutable selection state: active layer, active head and the per-panel pins.

use crate::config::AttentionConfig;
use thiserror::Error;

/// One of the two token panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    /// Top panel: hovering a token shows which later tokens attend to it
    Observed,
    /// Bottom panel: hovering a completion token shows what it attends to
    Observer,
}

impl Panel {
    pub const ALL: [Panel; 2] = [Panel::Observed, Panel::Observer];

    /// Element id of the panel group
    pub fn id(self) -> &'static str {
        match self {
            Panel::Observed => "observed",
            Panel::Observer => "observer",
        }
    }

    fn slot(self) -> usize {
        match self {
            Panel::Observed => 0,
            Panel::Observer => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("head {head} is out of range ({heads} heads)")]
    HeadOutOfRange { head: usize, heads: usize },

    #[error("layer {value} is not one of the {layers} layers")]
    UnknownLayer { value: usize, layers: usize },

    #[error("layer index {index} is out of range ({layers} layers)")]
    LayerOutOfRange { index: usize, layers: usize },
}

/// Selection state of one visualization.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    layer_index: usize,
    layer_value: usize,
    head: usize,
    head_visibility: Vec<bool>,
    pinned: [bool; 2],
}

impl RenderState {
    /// First layer, first head, nothing pinned.
    pub fn new(config: &AttentionConfig) -> Self {
        let mut head_visibility = vec![false; config.head_count()];
        head_visibility[0] = true;

        Self {
            layer_index: 0,
            layer_value: config.layers()[0],
            head: 0,
            head_visibility,
            pinned: [false; 2],
        }
    }

    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    pub fn layer_value(&self) -> usize {
        self.layer_value
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn head_visibility(&self) -> &[bool] {
        &self.head_visibility
    }

    /// Number of heads currently marked visible
    pub fn active_heads(&self) -> usize {
        self.head_visibility.iter().filter(|&&visible| visible).count()
    }

    pub fn is_pinned(&self, panel: Panel) -> bool {
        self.pinned[panel.slot()]
    }

    /// Flip a panel's pin and return the new value.
    pub fn toggle_pin(&mut self, panel: Panel) -> bool {
        let pin = &mut self.pinned[panel.slot()];
        *pin = !*pin;
        *pin
    }

    pub fn reset_pins(&mut self) {
        self.pinned = [false; 2];
    }

    /// Make `head` the only visible head.
    ///
    /// Only honoured when `head` is not already visible and exactly one head
    /// is. Returns whether the selection changed.
    pub fn select_head(&mut self, head: usize) -> Result<bool, StateError> {
        let heads = self.head_visibility.len();
        if head >= heads {
            return Err(StateError::HeadOutOfRange { head, heads });
        }
        if self.head_visibility[head] || self.active_heads() != 1 {
            return Ok(false);
        }

        self.head_visibility.fill(false);
        self.head_visibility[head] = true;
        self.head = head;
        self.reset_pins();
        Ok(true)
    }

    /// Switch to the layer whose value is `value`; the head is kept.
    pub fn select_layer(&mut self, config: &AttentionConfig, value: usize) -> Result<(), StateError> {
        let index = config
            .layer_position(value)
            .ok_or(StateError::UnknownLayer {
                value,
                layers: config.layer_count(),
            })?;

        self.layer_index = index;
        self.layer_value = value;
        self.reset_pins();
        Ok(())
    }

    /// Check the indices still address `config`.
    pub fn check(&self, config: &AttentionConfig) -> Result<(), StateError> {
        if self.layer_index >= config.layer_count() {
            return Err(StateError::LayerOutOfRange {
                index: self.layer_index,
                layers: config.layer_count(),
            });
        }
        if self.head >= config.head_count() {
            return Err(StateError::HeadOutOfRange {
                head: self.head,
                heads: config.head_count(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttentionBundle, AttentionParams, TokenBox};

    fn config(layers: usize, heads: usize) -> AttentionConfig {
        let bundle = AttentionBundle {
            name: None,
            num_layers: layers,
            num_heads: heads,
            tokens: vec!["a".into(), "b".into()],
            prompt_length: 1,
            attn: vec![vec![vec![vec![0.5]]; heads]; layers],
            pos: vec![TokenBox::new(0.0, 0.0, 20.0, 0.0); 2],
            head_start_idx: 0,
            dy_total: 0.0,
        };
        AttentionConfig::from_params(AttentionParams::new(bundle, "root")).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = RenderState::new(&config(3, 4));

        assert_eq!(state.layer_index(), 0);
        assert_eq!(state.layer_value(), 0);
        assert_eq!(state.head(), 0);
        assert_eq!(state.head_visibility(), &[true, false, false, false]);
        assert_eq!(state.active_heads(), 1);
        assert!(!state.is_pinned(Panel::Observed));
        assert!(!state.is_pinned(Panel::Observer));
    }

    #[test]
    fn test_pins_are_independent() {
        let mut state = RenderState::new(&config(1, 1));

        assert!(state.toggle_pin(Panel::Observer));
        assert!(state.is_pinned(Panel::Observer));
        assert!(!state.is_pinned(Panel::Observed));

        assert!(!state.toggle_pin(Panel::Observer));
        assert!(!state.is_pinned(Panel::Observer));
    }

    #[test]
    fn test_selecting_current_head_is_noop() {
        let mut state = RenderState::new(&config(1, 3));
        state.toggle_pin(Panel::Observed);
        let before = state.clone();

        assert_eq!(state.select_head(0), Ok(false));
        assert_eq!(state, before);
    }

    #[test]
    fn test_selecting_other_head_transfers_selection() {
        let mut state = RenderState::new(&config(1, 3));
        state.toggle_pin(Panel::Observed);
        state.toggle_pin(Panel::Observer);

        assert_eq!(state.select_head(2), Ok(true));
        assert_eq!(state.head(), 2);
        assert_eq!(state.head_visibility(), &[false, false, true]);
        assert!(!state.is_pinned(Panel::Observed));
        assert!(!state.is_pinned(Panel::Observer));
    }

    #[test]
    fn test_select_head_out_of_range() {
        let mut state = RenderState::new(&config(1, 2));
        assert_eq!(
            state.select_head(2),
            Err(StateError::HeadOutOfRange { head: 2, heads: 2 })
        );
        assert_eq!(state.active_heads(), 1);
    }

    #[test]
    fn test_select_layer_keeps_head() {
        let config = config(3, 2);
        let mut state = RenderState::new(&config);
        state.select_head(1).unwrap();
        state.toggle_pin(Panel::Observer);

        state.select_layer(&config, 2).unwrap();
        assert_eq!(state.layer_index(), 2);
        assert_eq!(state.layer_value(), 2);
        assert_eq!(state.head(), 1);
        assert!(!state.is_pinned(Panel::Observer));
    }

    #[test]
    fn test_select_unknown_layer() {
        let config = config(2, 1);
        let mut state = RenderState::new(&config);

        assert_eq!(
            state.select_layer(&config, 7),
            Err(StateError::UnknownLayer { value: 7, layers: 2 })
        );
        assert_eq!(state.layer_index(), 0);
    }

    #[test]
    fn test_check_against_smaller_config() {
        let big = config(3, 3);
        let mut state = RenderState::new(&big);
        state.select_head(2).unwrap();

        assert!(state.check(&big).is_ok());
        assert_eq!(
            state.check(&config(3, 2)),
            Err(StateError::HeadOutOfRange { head: 2, heads: 2 })
        );
    }
}
