//! Standalone host page embedding one visualization.

use crate::config::AttentionParams;

const FONT_STACK: &str = "'Helvetica Neue', Helvetica, Arial, sans-serif";

/// Escape HTML special characters
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize `params` so it can sit inside a `<script>` element.
fn script_json(params: &AttentionParams) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(params)?.replace("</", "<\\/"))
}

/// HTML page with the root container (layer selector + drawing element) and a
/// module script that loads the wasm package at `script_url` and renders
/// `params` into it.
pub fn host_page(params: &AttentionParams, script_url: &str) -> Result<String, serde_json::Error> {
    let title = params.attention.name.as_deref().unwrap_or("att_viz");
    let root_id = html_escape(&params.root_div_id);
    let script_url = html_escape(script_url);
    let json = script_json(params)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<div id="{root_id}" style="font-family:{FONT_STACK};">
    <span style="user-select:none">
        Layer: <select id="layer"></select>
    </span>
    <div id="vis"></div>
</div>
<script type="module">
import init, {{ renderAttention }} from "{script_url}";
await init();
renderAttention({json});
</script>
</body>
</html>
"#,
        title = html_escape(title),
    ))
}
