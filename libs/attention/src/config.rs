//! Parameter bundle handed over by the embedding host, and its validated form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attention weights indexed `[layer][head][observer_row][observed_col]`.
///
/// Row `r` belongs to the completion token at index `prompt_length + r` and
/// holds one column per earlier token.
pub type AttentionTensor = Vec<Vec<Vec<Vec<f64>>>>;

/// Placement hint for one token: `(x, y, box width, kerning factor)`.
///
/// Serialized as a 4-element array, which is how the host emits it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct TokenBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub kerning: f64,
}

impl TokenBox {
    pub fn new(x: f64, y: f64, width: f64, kerning: f64) -> Self {
        Self { x, y, width, kerning }
    }

    /// Same box moved down by `dy`.
    pub fn shifted(self, dy: f64) -> Self {
        Self { y: self.y + dy, ..self }
    }
}

impl From<[f64; 4]> for TokenBox {
    fn from([x, y, width, kerning]: [f64; 4]) -> Self {
        Self { x, y, width, kerning }
    }
}

impl From<TokenBox> for [f64; 4] {
    fn from(b: TokenBox) -> Self {
        [b.x, b.y, b.width, b.kerning]
    }
}

/// The `attention` part of the parameter bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionBundle {
    /// Display name, e.g. `Layer-3__Chunk-0` for chunked views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub num_layers: usize,
    pub num_heads: usize,
    pub tokens: Vec<String>,
    pub prompt_length: usize,
    pub attn: AttentionTensor,
    pub pos: Vec<TokenBox>,
    /// Offset added to head labels when the heads are a slice of a larger set
    #[serde(default)]
    pub head_start_idx: usize,
    /// Vertical extent of the token layout
    #[serde(default)]
    pub dy_total: f64,
}

/// Everything the front-end receives at initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionParams {
    pub attention: AttentionBundle,
    pub root_div_id: String,
}

impl AttentionParams {
    pub fn new(attention: AttentionBundle, root_div_id: impl Into<String>) -> Self {
        Self {
            attention,
            root_div_id: root_div_id.into(),
        }
    }
}

/// Reasons a parameter bundle is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid parameter bundle: {0}")]
    Json(#[from] serde_json::Error),

    #[error("root container id is empty")]
    EmptyRootId,

    #[error("bundle declares no layers")]
    NoLayers,

    #[error("bundle declares no heads")]
    NoHeads,

    #[error("num_layers is {expected} but attn holds {found} layers")]
    LayerCount { expected: usize, found: usize },

    #[error("layer {layer}: num_heads is {expected} but attn holds {found} heads")]
    HeadCount {
        layer: usize,
        expected: usize,
        found: usize,
    },

    #[error("prompt_length {prompt_length} exceeds the {tokens} tokens")]
    PromptLength { prompt_length: usize, tokens: usize },

    #[error("pos has {layout} entries for {tokens} tokens")]
    LayoutLength { tokens: usize, layout: usize },

    #[error("layer {layer} head {head}: expected {expected} completion rows, found {found}")]
    RowCount {
        layer: usize,
        head: usize,
        expected: usize,
        found: usize,
    },

    #[error("layer {layer} head {head} row {row}: expected at least {expected} columns, found {found}")]
    RowLength {
        layer: usize,
        head: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("layer {layer} head {head} row {row} col {col}: weight is not finite")]
    NonFinite {
        layer: usize,
        head: usize,
        row: usize,
        col: usize,
    },
}

/// Validated, immutable view configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionConfig {
    name: Option<String>,
    root_id: String,
    layers: Vec<usize>,
    head_count: usize,
    tokens: Vec<String>,
    prompt_length: usize,
    attn: AttentionTensor,
    layout: Vec<TokenBox>,
    head_start_index: usize,
    dy_total: f64,
}

impl AttentionConfig {
    /// Parse and validate a JSON parameter bundle.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: AttentionParams = serde_json::from_str(json)?;
        Self::from_params(params)
    }

    /// Validate a parameter bundle.
    pub fn from_params(params: AttentionParams) -> Result<Self, ConfigError> {
        let AttentionParams {
            attention: bundle,
            root_div_id,
        } = params;

        if root_div_id.trim().is_empty() {
            return Err(ConfigError::EmptyRootId);
        }
        validate(&bundle)?;

        Ok(Self {
            name: bundle.name,
            root_id: root_div_id,
            layers: (0..bundle.num_layers).collect(),
            head_count: bundle.num_heads,
            tokens: bundle.tokens,
            prompt_length: bundle.prompt_length,
            attn: bundle.attn,
            layout: bundle.pos,
            head_start_index: bundle.head_start_idx,
            dy_total: bundle.dy_total,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Selectable layer values, in display order
    pub fn layers(&self) -> &[usize] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn head_count(&self) -> usize {
        self.head_count
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn prompt_length(&self) -> usize {
        self.prompt_length
    }

    pub fn layout(&self) -> &[TokenBox] {
        &self.layout
    }

    pub fn head_start_index(&self) -> usize {
        self.head_start_index
    }

    pub fn dy_total(&self) -> f64 {
        self.dy_total
    }

    /// Position of a layer value in [`Self::layers`].
    pub fn layer_position(&self, value: usize) -> Option<usize> {
        self.layers.iter().position(|&layer| layer == value)
    }

    /// Rows of one head: `[observer_row][observed_col]`.
    pub fn head_matrix(&self, layer: usize, head: usize) -> Option<&[Vec<f64>]> {
        self.attn
            .get(layer)
            .and_then(|heads| heads.get(head))
            .map(Vec::as_slice)
    }
}

fn validate(bundle: &AttentionBundle) -> Result<(), ConfigError> {
    if bundle.num_layers == 0 {
        return Err(ConfigError::NoLayers);
    }
    if bundle.num_heads == 0 {
        return Err(ConfigError::NoHeads);
    }
    if bundle.attn.len() != bundle.num_layers {
        return Err(ConfigError::LayerCount {
            expected: bundle.num_layers,
            found: bundle.attn.len(),
        });
    }

    let tokens = bundle.tokens.len();
    if bundle.prompt_length > tokens {
        return Err(ConfigError::PromptLength {
            prompt_length: bundle.prompt_length,
            tokens,
        });
    }
    if bundle.pos.len() != tokens {
        return Err(ConfigError::LayoutLength {
            tokens,
            layout: bundle.pos.len(),
        });
    }

    let completion_rows = tokens - bundle.prompt_length;
    for (layer, heads) in bundle.attn.iter().enumerate() {
        if heads.len() != bundle.num_heads {
            return Err(ConfigError::HeadCount {
                layer,
                expected: bundle.num_heads,
                found: heads.len(),
            });
        }
        for (head, rows) in heads.iter().enumerate() {
            if rows.len() != completion_rows {
                return Err(ConfigError::RowCount {
                    layer,
                    head,
                    expected: completion_rows,
                    found: rows.len(),
                });
            }
            for (row, cols) in rows.iter().enumerate() {
                let expected = bundle.prompt_length + row;
                if cols.len() < expected {
                    return Err(ConfigError::RowLength {
                        layer,
                        head,
                        row,
                        expected,
                        found: cols.len(),
                    });
                }
                if let Some(col) = cols.iter().position(|w| !w.is_finite()) {
                    return Err(ConfigError::NonFinite {
                        layer,
                        head,
                        row,
                        col,
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_JSON: &str = r#"{
        "attention": {
            "num_layers": 1,
            "num_heads": 1,
            "tokens": ["The", " cat"],
            "prompt_length": 1,
            "attn": [[[[0.9]]]],
            "pos": [[20, 30, 27.3, 0], [47.3, 30, 40, 1]],
            "head_start_idx": 0,
            "dy_total": 0
        },
        "root_div_id": "AttViz-test"
    }"#;

    fn cat_params() -> AttentionParams {
        serde_json::from_str(CAT_JSON).unwrap()
    }

    #[test]
    fn test_parses_host_bundle() {
        let config = AttentionConfig::from_json(CAT_JSON).unwrap();

        assert_eq!(config.root_id(), "AttViz-test");
        assert_eq!(config.layers(), &[0]);
        assert_eq!(config.head_count(), 1);
        assert_eq!(config.tokens(), &["The".to_string(), " cat".to_string()]);
        assert_eq!(config.prompt_length(), 1);
        assert_eq!(config.layout()[1], TokenBox::new(47.3, 30.0, 40.0, 1.0));
        assert_eq!(config.head_matrix(0, 0).unwrap(), &[vec![0.9]]);
        assert!(config.name().is_none());
    }

    #[test]
    fn test_token_box_serializes_as_array() {
        let json = serde_json::to_string(&TokenBox::new(1.0, 2.0, 3.0, 0.0)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,0.0]");
    }

    #[test]
    fn test_rejects_short_layout() {
        let mut params = cat_params();
        params.attention.pos.pop();

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::LayoutLength { tokens: 2, layout: 1 }));
    }

    #[test]
    fn test_rejects_layer_count_mismatch() {
        let mut params = cat_params();
        params.attention.num_layers = 2;

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::LayerCount { expected: 2, found: 1 }));
    }

    #[test]
    fn test_rejects_head_count_mismatch() {
        let mut params = cat_params();
        params.attention.num_heads = 3;

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::HeadCount { layer: 0, expected: 3, found: 1 }));
    }

    #[test]
    fn test_rejects_truncated_row() {
        let mut params = cat_params();
        params.attention.attn[0][0][0].clear();

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::RowLength { row: 0, expected: 1, found: 0, .. }));
    }

    #[test]
    fn test_rejects_missing_rows() {
        let mut params = cat_params();
        params.attention.prompt_length = 0;

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::RowCount { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_rejects_oversized_prompt() {
        let mut params = cat_params();
        params.attention.prompt_length = 5;

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::PromptLength { prompt_length: 5, tokens: 2 }));
    }

    #[test]
    fn test_rejects_non_finite_weight() {
        let mut params = cat_params();
        params.attention.attn[0][0][0][0] = f64::NAN;

        let err = AttentionConfig::from_params(params).unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { col: 0, .. }));
    }

    #[test]
    fn test_rejects_empty_root_id() {
        let mut params = cat_params();
        params.root_div_id = "  ".into();

        assert!(matches!(
            AttentionConfig::from_params(params),
            Err(ConfigError::EmptyRootId)
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = AttentionConfig::from_json("{\"attention\": 3}").unwrap_err();
        assert!(err.to_string().starts_with("invalid parameter bundle"));
    }

    #[test]
    fn test_layer_position() {
        let config = AttentionConfig::from_json(CAT_JSON).unwrap();
        assert_eq!(config.layer_position(0), Some(0));
        assert_eq!(config.layer_position(4), None);
    }
}
