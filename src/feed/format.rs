//! Text shaping for "/me" status messages.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<p>/me does a thing</p>` with the paragraph wrapper captured around the body.
static ME_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<p>/me\s?(.*)</p>$").expect("/me regex pattern is valid"));

/// Body of a "/me" message without the command prefix and paragraph wrapper.
///
/// Content that does not look like rendered "/me" markup is returned as-is.
pub fn status_message_text(content: &str) -> String {
    match ME_MESSAGE.captures(content) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).to_string(),
        None => content.to_string(),
    }
}
