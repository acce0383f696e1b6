//! Parsing model output into horoscope details.

use horoscope_core::{GenerationError, HoroscopeDetail};

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse a model reply into a complete [`HoroscopeDetail`].
///
/// Fails with [`GenerationError::InvalidResponse`] when the reply is not the
/// expected JSON object or any section is blank.
pub fn parse_detail(content: &str) -> Result<HoroscopeDetail, GenerationError> {
    let json = strip_code_fence(content);
    let detail: HoroscopeDetail = serde_json::from_str(json)
        .map_err(|e| GenerationError::InvalidResponse(format!("Malformed horoscope JSON: {}", e)))?;

    if !detail.is_complete() {
        return Err(GenerationError::InvalidResponse(
            "Horoscope has empty sections".to_string(),
        ));
    }
    Ok(detail)
}
