use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 200;
pub const SUMMARY_MAX: usize = 500;
pub const CONTENT_MIN: usize = 10;
pub const AUTHOR_MAX: usize = 100;

/// Field name -> violated constraint
pub type FieldErrors = BTreeMap<String, String>;

/// Payload accepted by `POST /news`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Payload accepted by `PATCH /news/:id`. Absent and `null` fields are both
/// treated as "not provided" and never reach the upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Representation returned to clients, decoded from upstream rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsOut {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewsCreate {
    /// Decode and validate a request body
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        let draft: Self = decode_body(body, &["title", "content"])?;
        draft.validate()?;
        Ok(draft)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_title(&self.title, &mut errors);
        check_content(&self.content, &mut errors);
        check_optional(&self.summary, "summary", &mut errors, check_summary);
        check_optional(&self.author, "author", &mut errors, check_author);
        check_optional(&self.image_url, "image_url", &mut errors, check_image_url);
        into_result(errors)
    }
}

impl NewsUpdate {
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        let patch: Self = decode_body(body, &[])?;
        patch.validate()?;
        Ok(patch)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_title(title, &mut errors);
        }
        if let Some(content) = &self.content {
            check_content(content, &mut errors);
        }
        check_optional(&self.summary, "summary", &mut errors, check_summary);
        check_optional(&self.author, "author", &mut errors, check_author);
        check_optional(&self.image_url, "image_url", &mut errors, check_image_url);
        into_result(errors)
    }

    /// True when no field was supplied
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.content.is_none()
            && self.author.is_none()
            && self.image_url.is_none()
    }
}

/// Shape check ahead of the constraint checks: required fields must be
/// present and non-null, and every field must have the right JSON type.
fn decode_body<T: serde::de::DeserializeOwned>(body: Value, required: &[&str]) -> Result<T, ApiError> {
    let Some(object) = body.as_object() else {
        return Err(ApiError::validation_error("Request body must be a JSON object", None));
    };

    let mut errors = FieldErrors::new();
    for field in required {
        if object.get(*field).map_or(true, Value::is_null) {
            errors.insert(field.to_string(), "field required".to_string());
        }
    }
    into_result(errors)?;

    serde_path_to_error::deserialize(body).map_err(|e| {
        let field = e.path().to_string();
        let message = format!("Invalid fields: {}", field);
        let mut errors = FieldErrors::new();
        errors.insert(field, e.inner().to_string());
        ApiError::validation_error(message, Some(errors))
    })
}

fn into_result(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        let message = format!("Invalid fields: {}", fields.join(", "));
        Err(ApiError::validation_error(message, Some(errors)))
    }
}

fn check_optional(
    value: &Option<String>,
    field: &str,
    errors: &mut FieldErrors,
    check: fn(&str) -> Option<String>,
) {
    if let Some(problem) = value.as_deref().and_then(check) {
        errors.insert(field.to_string(), problem);
    }
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        errors.insert(
            "title".to_string(),
            format!("must be between {} and {} characters", TITLE_MIN, TITLE_MAX),
        );
    }
}

fn check_content(content: &str, errors: &mut FieldErrors) {
    if content.chars().count() < CONTENT_MIN {
        errors.insert(
            "content".to_string(),
            format!("must be at least {} characters", CONTENT_MIN),
        );
    }
}

fn check_summary(summary: &str) -> Option<String> {
    (summary.chars().count() > SUMMARY_MAX)
        .then(|| format!("must be at most {} characters", SUMMARY_MAX))
}

fn check_author(author: &str) -> Option<String> {
    (author.chars().count() > AUTHOR_MAX)
        .then(|| format!("must be at most {} characters", AUTHOR_MAX))
}

fn check_image_url(raw: &str) -> Option<String> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => None,
        Ok(_) => Some("must be an http or https URL".to_string()),
        Err(e) => Some(format!("must be a valid URL ({})", e)),
    }
}

/// PostgREST renders `timestamptz` with an offset and `timestamp` without one
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
