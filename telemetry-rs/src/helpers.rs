use crate::constants::BODY_SNIPPET_MAX_CHARS;
use crate::models::errors::TelemetryError;

/// Percent-encodes every character of `value` except `A-Z a-z 0-9 - _ . ~`.
/// Reserved characters such as `+`, `/`, `=` and `&` are always escaped.
pub(crate) fn encode_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Percent-decodes `value`. Fails with InvalidInput if the decoded bytes are not UTF-8.
pub(crate) fn decode_component(value: &str) -> Result<String, TelemetryError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| TelemetryError::InvalidInput(format!("Path is not valid UTF-8: {e}")))
}

/// Returns at most `BODY_SNIPPET_MAX_CHARS` characters of a response body.
pub(crate) fn body_snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
