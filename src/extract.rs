use regex::Regex;
use serde::Deserialize;

/// Confidence for a free-text answer in manual/autonomous mode.
pub const TRUSTED_CONFIDENCE: f64 = 1.0;
/// Confidence when a smart-mode answer was not the requested JSON.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;
/// Confidence when the provider said nothing.
pub const EMPTY_CONFIDENCE: f64 = 0.0;

/// How the provider text was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Smart mode, JSON object parsed.
    Structured,
    /// Manual/autonomous mode, command taken from free text.
    FreeText,
    /// Smart mode, JSON parse failed; free text used instead.
    Fallback,
    /// Blank response.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub command: String,
    pub confidence: f64,
    pub raw_text: String,
    pub outcome: ParseOutcome,
}

impl Suggestion {
    pub fn is_empty(&self) -> bool {
        self.command.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct StructuredReply {
    command: String,
    confidence: f64,
}

/// Pulls a bare command out of free text: backticks, then double quotes, then the text itself.
pub struct Sanitizer {
    patterns: Vec<Regex>,
    command_field: Option<Regex>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        let mut patterns = Vec::new();
        for pattern in [r"`([^`]+)`", r#""([^"]+)""#] {
            if let Ok(regex) = Regex::new(pattern) {
                patterns.push(regex);
            }
        }
        let command_field = Regex::new(r#""command"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok();
        Self { patterns, command_field }
    }
}

impl Sanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract_command(&self, text: &str) -> String {
        for pattern in &self.patterns {
            let captured = pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .find(|s| !s.is_empty());
            if let Some(command) = captured {
                return command.to_string();
            }
        }
        text.trim().to_string()
    }

    /// Best-effort `"command"` value from a JSON-looking reply that did not parse.
    pub fn command_field(&self, text: &str) -> Option<String> {
        let caps = self.command_field.as_ref()?.captures(text)?;
        let literal = caps.get(1)?.as_str();
        let value = serde_json::from_str::<String>(&format!("\"{}\"", literal))
            .unwrap_or_else(|_| literal.to_string());
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Strips one pair of backticks or double quotes wrapping the whole command.
fn unwrap_command(command: &str) -> &str {
    let command = command.trim();
    for delimiter in ['`', '"'] {
        if let Some(inner) = command
            .strip_prefix(delimiter)
            .and_then(|rest| rest.strip_suffix(delimiter))
        {
            if !inner.contains(delimiter) {
                return inner.trim();
            }
        }
    }
    command
}

/// Turns raw provider text into a suggestion with a resolved confidence.
pub fn parse_response(raw: &str, smart: bool, sanitizer: &Sanitizer) -> Suggestion {
    let text = raw.trim();

    if text.is_empty() {
        return empty_suggestion(raw);
    }

    if !smart {
        return Suggestion {
            command: sanitizer.extract_command(text),
            confidence: TRUSTED_CONFIDENCE,
            raw_text: raw.to_string(),
            outcome: ParseOutcome::FreeText,
        };
    }

    match parse_structured(text) {
        Some(reply) => {
            let command = unwrap_command(&reply.command);
            if command.is_empty() {
                return empty_suggestion(raw);
            }
            Suggestion {
                command: command.to_string(),
                confidence: clamp_confidence(reply.confidence),
                raw_text: raw.to_string(),
                outcome: ParseOutcome::Structured,
            }
        }
        None => {
            log::debug!("Structured parse failed, treating response as free text");
            // Quote extraction would pick up JSON keys
            let command = if text.starts_with('{') {
                sanitizer
                    .command_field(text)
                    .unwrap_or_else(|| text.to_string())
            } else {
                sanitizer.extract_command(text)
            };
            Suggestion {
                command,
                confidence: FALLBACK_CONFIDENCE,
                raw_text: raw.to_string(),
                outcome: ParseOutcome::Fallback,
            }
        }
    }
}

fn empty_suggestion(raw: &str) -> Suggestion {
    Suggestion {
        command: String::new(),
        confidence: EMPTY_CONFIDENCE,
        raw_text: raw.to_string(),
        outcome: ParseOutcome::Empty,
    }
}

fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        EMPTY_CONFIDENCE
    }
}

fn parse_structured(text: &str) -> Option<StructuredReply> {
    let json = extract_json(text)?;
    serde_json::from_str::<StructuredReply>(json).ok()
}

/// Finds a JSON object in the text: whole text, fenced block, or outermost braces.
fn extract_json(content: &str) -> Option<&str> {
    if serde_json::from_str::<serde_json::Value>(content).is_ok() {
        return Some(content);
    }

    // Fenced block, with or without a language tag
    if let Some(start) = content.find("```") {
        let after_fence = start + 3;
        let body_start = match content[after_fence..].find('\n') {
            Some(newline) => after_fence + newline + 1,
            None => after_fence,
        };
        if let Some(end) = content[body_start..].find("```") {
            let extracted = content[body_start..body_start + end].trim();
            if serde_json::from_str::<serde_json::Value>(extracted).is_ok() {
                return Some(extracted);
            }
        }
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            let extracted = &content[start..=end];
            if serde_json::from_str::<serde_json::Value>(extracted).is_ok() {
                return Some(extracted);
            }
        }
    }

    None
}
