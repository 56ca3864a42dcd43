//! Audio preview discovery from the public track embed page.
//!
//! The Web API no longer returns preview URLs for most tracks, but the embed player ships its
//! initial state as an inline JSON script that still contains an `audioPreview` node.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static INLINE_JSON_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<script[^>]*>(\{[^<]+\})</script>").expect("inline script pattern is valid")
});

/// Extract the preview URL from an embed page, if it exposes a usable one.
pub fn extract_preview_url(html: &str) -> Option<String> {
    let script = INLINE_JSON_SCRIPT.captures(html)?.get(1)?.as_str();
    let state: Value = serde_json::from_str(script).ok()?;
    let preview = find_audio_preview(&state)?;

    preview
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| is_http_url(url))
        .map(str::to_owned)
}

/// Depth-first search for the first non-null `audioPreview` node.
pub fn find_audio_preview(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if let Some(preview) = map.get("audioPreview").filter(|v| !v.is_null()) {
                return Some(preview);
            }
            map.values().find_map(find_audio_preview)
        }
        Value::Array(items) => items.iter().find_map(find_audio_preview),
        _ => None,
    }
}

fn is_http_url(url: &str) -> bool {
    (url.starts_with("https://") || url.starts_with("http://")) && !url.contains(char::is_whitespace)
}
