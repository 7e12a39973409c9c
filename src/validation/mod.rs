//! Schema Validator
//! Declarative per-entity field rules applied to every inbound body before it
//! is turned into a typed DTO.

pub mod schemas;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Key used for errors that concern the body as a whole.
pub const BODY_FIELD: &str = "_body";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

const MAX_EMAIL_LENGTH: usize = 254;

// ============================================================================
// Rules
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Text { min: usize, max: usize },
    Email,
    Url,
    UrlList { min_items: usize },
    Bool,
    Integer,
    Uuid,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub required: bool,
}

impl Field {
    pub const fn text(name: &'static str, min: usize, max: usize) -> Self {
        Self::new(name, Kind::Text { min, max })
    }

    pub const fn email(name: &'static str) -> Self {
        Self::new(name, Kind::Email)
    }

    pub const fn url(name: &'static str) -> Self {
        Self::new(name, Kind::Url)
    }

    pub const fn url_list(name: &'static str, min_items: usize) -> Self {
        Self::new(name, Kind::UrlList { min_items })
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, Kind::Bool)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, Kind::Integer)
    }

    pub const fn uuid(name: &'static str) -> Self {
        Self::new(name, Kind::Uuid)
    }

    pub const fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, Kind::OneOf(values))
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// Check one raw value. `Ok(None)` means the field is absent after
    /// normalization; the first failing rule produces the error.
    fn check(&self, value: Option<&Value>) -> Result<Option<Value>, String> {
        let value = match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some(v),
        };

        let Some(value) = value else {
            return if self.required {
                Err("is required".to_string())
            } else {
                Ok(None)
            };
        };

        match self.kind {
            Kind::Text { min, max } => {
                let s = value.as_str().ok_or("must be a string")?;
                let len = s.chars().count();
                if len < min {
                    return Err(format!("must be at least {} characters", min));
                }
                if len > max {
                    return Err(format!("must be at most {} characters", max));
                }
            }
            Kind::Email => {
                let s = value.as_str().ok_or("must be a string")?;
                if s.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(s) {
                    return Err("must be a valid email address".to_string());
                }
            }
            Kind::Url => {
                let s = value.as_str().ok_or("must be a string")?;
                if !is_http_url(s) {
                    return Err("must be a valid URL".to_string());
                }
            }
            Kind::UrlList { min_items } => {
                let items = value.as_array().ok_or("must be a list of URLs")?;
                if let Some(index) = items
                    .iter()
                    .position(|item| !item.as_str().is_some_and(is_http_url))
                {
                    return Err(format!("item {} must be a valid URL", index + 1));
                }
                if items.len() < min_items {
                    return Err(format!("must contain at least {} item(s)", min_items));
                }
            }
            Kind::Bool => {
                if !value.is_boolean() {
                    return Err("must be true or false".to_string());
                }
            }
            Kind::Integer => {
                let fits = value
                    .as_i64()
                    .is_some_and(|n| i32::try_from(n).is_ok());
                if !fits {
                    return Err("must be a whole number".to_string());
                }
            }
            Kind::Uuid => {
                let s = value.as_str().ok_or("must be a string")?;
                if Uuid::parse_str(s).is_err() {
                    return Err("must be a valid id".to_string());
                }
            }
            Kind::OneOf(allowed) => {
                let s = value.as_str().ok_or("must be a string")?;
                if !allowed.contains(&s) {
                    return Err(format!("must be one of: {}", allowed.join(", ")));
                }
            }
        }

        Ok(Some(value.clone()))
    }
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

// ============================================================================
// Errors
// ============================================================================

/// Field name -> message, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("validation failed for {} field(s)", .0.len())]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

// ============================================================================
// Schema
// ============================================================================

#[derive(Debug)]
pub struct Schema {
    pub entity: &'static str,
    pub fields: &'static [Field],
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check every field and return the normalized object: unknown keys are
    /// dropped, absent optional fields are left out.
    pub fn normalize(&self, raw: &Value) -> Result<Map<String, Value>, ValidationErrors> {
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationErrors::single(BODY_FIELD, "must be a JSON object"))?;

        let mut normalized = Map::new();
        let mut errors = ValidationErrors::new();

        for field in self.fields {
            match field.check(object.get(field.name)) {
                Ok(Some(value)) => {
                    normalized.insert(field.name.to_string(), value);
                }
                Ok(None) => {}
                Err(message) => errors.insert(field.name, message),
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    /// Check only the named fields. Names the schema does not know are ignored.
    pub fn check_fields(&self, raw: &Map<String, Value>, names: &[&str]) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for name in names {
            if let Some(field) = self.field(name) {
                if let Err(message) = field.check(raw.get(*name)) {
                    errors.insert(name, message);
                }
            }
        }
        errors
    }

    /// Validate a raw body and produce the typed DTO.
    pub fn validate<T: DeserializeOwned>(&self, raw: &Value) -> Result<T, ValidationErrors> {
        let normalized = self.normalize(raw)?;
        serde_json::from_value(Value::Object(normalized)).map_err(|e| {
            tracing::warn!(entity = self.entity, error = %e, "validated body did not match DTO");
            ValidationErrors::single(BODY_FIELD, "has an unexpected shape")
        })
    }
}

/// A DTO that can only be produced through its schema.
pub trait Validate: DeserializeOwned {
    fn schema() -> &'static Schema;

    fn from_json(raw: &Value) -> Result<Self, ValidationErrors> {
        Self::schema().validate(raw)
    }
}
