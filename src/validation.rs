use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// FieldError
///
/// One rejected input field. A request collects every failing field before answering
/// with a single 400 so the admin form can highlight all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FieldError {
    pub path: String,
    pub msg: String,
    pub location: String,
}

impl FieldError {
    pub fn new(path: &str, msg: &str) -> Self {
        Self {
            path: path.to_string(),
            msg: msg.to_string(),
            location: "body".to_string(),
        }
    }
}

/// Validate
///
/// Implemented by request payloads. `validate` yields the cleaned, typed value the
/// repository operates on, or every field error found.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Collects field errors while a payload is being checked.
#[derive(Debug, Default)]
pub struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, path: &str, msg: &str) {
        self.errors.push(FieldError::new(path, msg));
    }

    /// Required text that must not be blank. Returns the trimmed value.
    pub fn required_text(&mut self, path: &str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.fail(path, &format!("{path} is required"));
                String::new()
            }
        }
    }

    /// Optional text that, when present, must not be blank.
    pub fn optional_text(&mut self, path: &str, value: Option<String>) -> Option<String> {
        let value = value?.trim().to_string();
        if value.is_empty() {
            self.fail(path, &format!("{path} must not be empty"));
            return None;
        }
        Some(value)
    }

    /// Required e-mail address. Returns the normalized (trimmed, lowercase) form.
    pub fn email(&mut self, path: &str, value: Option<String>) -> String {
        let normalized = value.map(|v| normalize_email(&v)).unwrap_or_default();
        if !is_email(&normalized) {
            self.fail(path, "A valid email is required");
        }
        normalized
    }

    /// Integer in `min..=max`. Accepts JSON numbers (including whole floats like `50.0`)
    /// and numeric strings.
    pub fn int_in_range(
        &mut self,
        path: &str,
        value: Option<&serde_json::Value>,
        min: i64,
        max: i64,
    ) -> Option<i32> {
        let parsed = match value {
            Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(f))
                    .map(|f| f as i64)
            }),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if (min..=max).contains(&n) => i32::try_from(n).ok(),
            _ => {
                self.fail(path, &format!("{path} must be an integer between {min} and {max}"));
                None
            }
        }
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Structural e-mail check: one `@`, a non-empty local part, and a dotted domain
/// without empty labels or whitespace.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && labels.last().is_some_and(|tld| tld.len() >= 2)
}

/// Interprets a form checkbox value the way the admin client sends it.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Parses a JSON array of strings as sent in multipart form fields (`["Rust","Axum"]`).
/// Each tag is trimmed and empty tags are dropped.
pub fn parse_tags(raw: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = serde_json::from_str(raw).ok()?;
    Some(
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
    )
}
