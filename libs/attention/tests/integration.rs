//! End-to-end tests: prepare a bundle, load it, render and interact

use attention::{
    prettify_tokens, AttentionBundle, AttentionParams, LayoutOptions, Panel, Redraw, Visualization,
    VizEvent, HEAD_CHUNK,
};

/// Each character is 7px wide.
fn measure(text: &str, _bold: bool) -> f64 {
    7.0 * text.chars().count() as f64
}

/// Rows of a causal tensor where row `r` spreads weight evenly over the
/// `prompt_length + r` earlier tokens, scaled per layer and head.
fn tensor(layers: usize, heads: usize, tokens: usize, prompt_length: usize) -> attention::AttentionTensor {
    (0..layers)
        .map(|l| {
            (0..heads)
                .map(|h| {
                    (0..tokens - prompt_length)
                        .map(|r| {
                            let cols = prompt_length + r;
                            let scale = 1.0 / (1 + l + h) as f64;
                            vec![scale / cols as f64; cols]
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

fn load(bundle: AttentionBundle) -> Visualization {
    let json = serde_json::to_string(&AttentionParams::new(bundle, "AttViz-it")).unwrap();
    let mut viz = Visualization::from_json(&json).expect("Should accept prepared bundle");
    viz.render(&mut measure).expect("Should render");
    viz
}

#[test]
fn test_cat_example_end_to_end() {
    let tokens = vec!["The".to_string(), "cat".to_string()];
    let bundle = AttentionBundle::whole(tokens, 1, vec![vec![vec![vec![0.9]]]], &LayoutOptions::default());
    let mut viz = load(bundle);

    // Single head: no strip
    assert!(viz.scene().unwrap().head_strip.is_none());

    viz.handle(VizEvent::PointerEnter { panel: Panel::Observed, index: 0 })
        .unwrap();
    assert_eq!(viz.scene().unwrap().observed.tokens[1].opacity, 0.9);

    viz.handle(VizEvent::PointerEnter { panel: Panel::Observer, index: 1 })
        .unwrap();
    assert_eq!(viz.scene().unwrap().observer.tokens[0].opacity, 0.9);
}

#[test]
fn test_prettified_tokens_pack_on_one_row() {
    let tokens = prettify_tokens(&["The", "Ġquick", "Ġfox"]);
    let bundle = AttentionBundle::whole(tokens, 1, tensor(1, 1, 3, 1), &LayoutOptions::default());
    let viz = load(bundle);

    let placed: Vec<_> = viz
        .scene()
        .unwrap()
        .observed
        .tokens
        .iter()
        .map(|t| t.place)
        .collect();

    assert_eq!(placed[0].x, 20.0);
    assert!((placed[1].x - (placed[0].x + placed[0].width)).abs() < 1e-9);
    assert!((placed[2].x - (placed[1].x + placed[1].width)).abs() < 1e-9);
    // " quick" carries kerning 1
    assert!((placed[1].dx - 5.625).abs() < 1e-9);
}

#[test]
fn test_every_chunk_renders_and_interacts() {
    let tokens: Vec<String> = ["a", "b", "c", "d"].iter().map(|t| t.to_string()).collect();
    let attn = tensor(2, 12, 4, 2);

    let bundles = AttentionBundle::chunked(tokens, 2, &attn, HEAD_CHUNK, &LayoutOptions::default());
    assert_eq!(bundles.len(), 4);

    for bundle in bundles {
        let start = bundle.head_start_idx;
        let heads = bundle.num_heads;
        let mut viz = load(bundle);

        let strip = viz.scene().unwrap().head_strip.clone().unwrap();
        assert_eq!(strip.boxes.len(), heads);
        assert_eq!(strip.boxes[0].label, start.to_string());

        let last = heads - 1;
        assert_eq!(
            viz.handle(VizEvent::HeadDoubleClick { head: last }).unwrap(),
            Redraw::HeadStrip
        );
        assert_eq!(viz.state().active_heads(), 1);
        assert_eq!(viz.state().head(), last);
    }
}

#[test]
fn test_layer_switch_uses_new_slice() {
    let tokens: Vec<String> = ["a", "b", "c"].iter().map(|t| t.to_string()).collect();
    let mut viz = load(AttentionBundle::whole(tokens, 1, tensor(3, 2, 3, 1), &LayoutOptions::default()));

    viz.handle(VizEvent::PointerEnter { panel: Panel::Observer, index: 1 })
        .unwrap();
    assert_eq!(viz.scene().unwrap().observer.tokens[0].opacity, 1.0);

    assert_eq!(viz.handle(VizEvent::LayerChange { value: 2 }).unwrap(), Redraw::Full);
    viz.render(&mut measure).unwrap();
    viz.handle(VizEvent::PointerEnter { panel: Panel::Observer, index: 1 })
        .unwrap();

    // layer 2, head 0: scale 1/3 over one earlier token
    let lit = viz.scene().unwrap().observer.tokens[0].opacity;
    assert!((lit - 1.0 / 3.0).abs() < 1e-9);
}
