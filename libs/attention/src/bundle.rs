//! Host-side preparation of parameter bundles from tokens and a formatted
//! attention tensor.

use crate::config::{AttentionBundle, AttentionTensor, TokenBox};
use serde::{Deserialize, Serialize};

/// Heads per view when a layer is split into chunks
pub const HEAD_CHUNK: usize = 8;

/// Display name of an unchunked bundle
pub const WHOLE_NAME: &str = "Response -> Prompt";

/// How heads are combined before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Every head is kept
    #[default]
    None,
    /// Heads of a layer are averaged into one
    HeadwiseAveraging,
}

/// Combine the heads of `attn` by `method`, optionally zeroing the attention
/// every row pays to the first token.
///
/// Averaged rows are as long as the shortest row among the heads, so every
/// row keeps the columns all heads agree on.
pub fn aggregate(mut attn: AttentionTensor, method: Aggregation, zero_first_attention: bool) -> AttentionTensor {
    if zero_first_attention {
        for row in attn.iter_mut().flatten().flatten() {
            if let Some(first) = row.first_mut() {
                *first = 0.0;
            }
        }
    }

    match method {
        Aggregation::None => attn,
        Aggregation::HeadwiseAveraging => attn.into_iter().map(|heads| vec![head_mean(&heads)]).collect(),
    }
}

fn head_mean(heads: &[Vec<Vec<f64>>]) -> Vec<Vec<f64>> {
    let rows = heads.iter().map(Vec::len).min().unwrap_or(0);
    let count = heads.len() as f64;

    (0..rows)
        .map(|r| {
            let width = heads.iter().map(|h| h[r].len()).min().unwrap_or(0);
            (0..width)
                .map(|c| heads.iter().map(|h| h[r][c]).sum::<f64>() / count)
                .collect()
        })
        .collect()
}

/// Token layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Where tokens start on the y axis
    pub y_margin: f64,
    /// Where tokens start on the x axis
    pub x_margin: f64,
    /// Line length after which a row wraps
    pub line_length: f64,
    /// Characters that fit in a `token_width` box
    pub num_chars_block: f64,
    pub token_width: f64,
    pub min_token_width: f64,
    /// Row height
    pub token_height: f64,
    pub matrix_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            y_margin: 30.0,
            x_margin: 20.0,
            line_length: 770.0,
            num_chars_block: 11.0,
            token_width: 110.0,
            min_token_width: 20.0,
            token_height: 22.5,
            matrix_width: 115.0,
        }
    }
}

/// Replace tokenizer markers with the characters they stand for.
pub fn prettify_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            t.as_ref()
                .replace(['Ġ', '▁'], " ")
                .replace("</w>", "")
                .replace('Ċ', ",")
                .replace("<0x0A>", "\n")
        })
        .collect()
}

/// Lay tokens out left to right, wrapping rows.
///
/// Returns the boxes and the total height added by wrapping.
pub fn token_layout(tokens: &[String], options: &LayoutOptions) -> (Vec<TokenBox>, f64) {
    let mut boxes = Vec::with_capacity(tokens.len());
    let mut dx = 0.0;
    let mut dy = 0.0;

    for token in tokens {
        let chars = token.chars().count() as f64;
        let width = (chars * options.token_width / options.num_chars_block)
            .max(options.min_token_width)
            .min(options.token_width);
        let kerning = if token.starts_with(' ') { 1.0 } else { 0.0 };

        boxes.push(TokenBox::new(
            options.x_margin + dx,
            options.y_margin + dy,
            width,
            kerning,
        ));

        dx += width;
        if dx > options.line_length || token == "\n" {
            dx = 0.0;
            dy += options.token_height;
        }
    }

    (boxes, dy)
}

fn base_bundle(tokens: Vec<String>, prompt_length: usize, options: &LayoutOptions) -> AttentionBundle {
    let (pos, dy_total) = token_layout(&tokens, options);
    AttentionBundle {
        name: None,
        num_layers: 0,
        num_heads: 0,
        tokens,
        prompt_length,
        attn: Vec::new(),
        pos,
        head_start_idx: 0,
        dy_total,
    }
}

impl AttentionBundle {
    /// One bundle holding every layer and head.
    pub fn whole(tokens: Vec<String>, prompt_length: usize, attn: AttentionTensor, options: &LayoutOptions) -> Self {
        let mut bundle = base_bundle(tokens, prompt_length, options);
        bundle.name = Some(WHOLE_NAME.to_string());
        bundle.num_layers = attn.len();
        bundle.num_heads = attn.first().map_or(0, Vec::len);
        bundle.attn = attn;
        bundle
    }

    /// One single-layer bundle per layer and run of `chunk` heads, named
    /// `Layer-{layer}__Chunk-{chunk}`.
    pub fn chunked(
        tokens: Vec<String>,
        prompt_length: usize,
        attn: &AttentionTensor,
        chunk: usize,
        options: &LayoutOptions,
    ) -> Vec<Self> {
        let base = base_bundle(tokens, prompt_length, options);
        let chunk = chunk.max(1);

        attn.iter()
            .enumerate()
            .flat_map(|(layer, heads)| {
                let base = &base;
                heads.chunks(chunk).enumerate().map(move |(index, slice)| {
                    let mut bundle = base.clone();
                    bundle.name = Some(format!("Layer-{layer}__Chunk-{index}"));
                    bundle.num_layers = 1;
                    bundle.num_heads = slice.len();
                    bundle.head_start_idx = index * chunk;
                    bundle.attn = vec![slice.to_vec()];
                    bundle
                })
            })
            .collect()
    }

    /// Bundles for one formatted tensor: chunks of [`HEAD_CHUNK`] heads when
    /// `in_chunks` is set and heads are kept, otherwise a single bundle.
    pub fn prepare(
        tokens: Vec<String>,
        prompt_length: usize,
        attn: AttentionTensor,
        aggregation: Aggregation,
        in_chunks: bool,
        options: &LayoutOptions,
    ) -> Vec<Self> {
        if in_chunks && aggregation == Aggregation::None {
            Self::chunked(tokens, prompt_length, &attn, HEAD_CHUNK, options)
        } else {
            vec![Self::whole(tokens, prompt_length, attn, options)]
        }
    }
}
