//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in extra text, so these helpers pull out
//! the outermost object before deserializing.

use crate::error::{Error, Result};

use super::types::CategoryGuess;

fn truncate(s: &str) -> String {
    if s.len() > 200 {
        let mut end = 200;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

/// Slice the outermost `{...}` out of a model response
fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response)
        ))),
    }
}

/// Parse a category guess, snapping the label onto the candidate set
///
/// Labels outside the candidate set are rejected; scores are clamped to [0, 1].
pub fn parse_category_guess(response: &str, labels: &[&str]) -> Result<CategoryGuess> {
    let json_str = extract_json(response)?;
    let guess: CategoryGuess = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let label = labels
        .iter()
        .find(|l| l.eq_ignore_ascii_case(guess.label.trim()))
        .ok_or_else(|| {
            Error::InvalidData(format!("AI returned unknown label: {}", guess.label))
        })?;

    let score = if guess.score.is_finite() {
        guess.score.clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(CategoryGuess {
        label: label.to_string(),
        score,
    })
}

/// Clean up free text from a model (strip quotes and surrounding whitespace)
pub fn parse_narrative(response: &str) -> Result<String> {
    let text = response.trim().trim_matches('"').trim();
    if text.is_empty() {
        return Err(Error::InvalidData("Empty narrative from AI".into()));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[&str] = &["Food", "Transport", "Other"];

    #[test]
    fn test_parse_guess_with_surrounding_text() {
        let response = r#"Sure! {"label": "transport", "score": 0.82} Hope that helps."#;
        let guess = parse_category_guess(response, LABELS).unwrap();
        assert_eq!(guess.label, "Transport");
        assert!((guess.score - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_parse_guess_clamps_score() {
        let guess = parse_category_guess(r#"{"label": "Food", "score": 3.5}"#, LABELS).unwrap();
        assert_eq!(guess.score, 1.0);
    }

    #[test]
    fn test_parse_guess_rejects_unknown_label() {
        assert!(parse_category_guess(r#"{"label": "Pets", "score": 0.9}"#, LABELS).is_err());
    }

    #[test]
    fn test_parse_guess_no_json() {
        assert!(parse_category_guess("I think it's food", LABELS).is_err());
    }

    #[test]
    fn test_parse_narrative() {
        assert_eq!(parse_narrative("  \"Nice work.\"  ").unwrap(), "Nice work.");
        assert!(parse_narrative("   ").is_err());
    }
}
