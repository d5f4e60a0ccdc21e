//! Parsing of the model's textual answer.

use serde_json::Value;

use crate::error::ClassifierError;

/// Confidence assumed when the answer omits the `confidence` key.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// The model's answer before taxonomy validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnswer {
    /// `topic` value if it was a JSON string
    pub topic: Option<String>,
    /// `confidence` value, not yet clamped
    pub confidence: f64,
}

/// Remove a surrounding markdown code fence, if present.
///
/// The opening fence line (including any language tag) and everything from
/// the last closing fence onward are dropped. Content without a leading
/// fence is only trimmed.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.split_once('\n') {
        Some((_, rest)) => rest,
        None => trimmed,
    };
    let body = match body.rfind("```") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

/// Parse the answer content into a [`ModelAnswer`].
///
/// The content must be a JSON object (optionally fenced). A missing or
/// non-string `topic` is reported as `None` and left to taxonomy
/// validation. A missing `confidence` defaults to [`DEFAULT_CONFIDENCE`];
/// anything that is neither a number nor a numeric string is an error.
pub fn parse_answer(content: &str) -> Result<ModelAnswer, ClassifierError> {
    let json_str = strip_code_fence(content);

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ClassifierError::Parse(format!("Answer is not valid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ClassifierError::Parse("Answer is not a JSON object".to_string()))?;

    let topic = object
        .get("topic")
        .and_then(Value::as_str)
        .map(str::to_string);

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ClassifierError::Parse(format!("Unrepresentable confidence {}", n)))?,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            ClassifierError::Parse(format!("Confidence is not numeric: {:?}", s))
        })?,
        Some(other) => {
            return Err(ClassifierError::Parse(format!(
                "Confidence is not numeric: {}",
                other
            )))
        }
    };

    Ok(ModelAnswer { topic, confidence })
}
