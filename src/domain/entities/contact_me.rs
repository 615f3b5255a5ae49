use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::validation::{validate_email, validate_message, validate_name, validate_subject};

/// The fields a visitor is composing. `website` is the honeypot: hidden from
/// people, so anything in it came from a bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactMeForm {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "validate_subject"))]
    pub subject: String,

    #[serde(default)]
    #[validate(custom(function = "validate_message"))]
    pub message: String,

    #[serde(default, rename = "website")]
    pub honeypot: String,
}

impl ContactMeForm {
    pub fn apply(&mut self, patch: DraftPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(subject) = patch.subject {
            self.subject = subject;
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(honeypot) = patch.honeypot {
            self.honeypot = honeypot;
        }
    }

    pub fn clear(&mut self) {
        *self = ContactMeForm::default();
    }

    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Partial update of a draft, one keystroke's worth or more.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "website")]
    pub honeypot: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldName {
    Name,
    Email,
    Subject,
    Message,
}

impl FieldName {
    pub const ALL: [FieldName; 4] = [FieldName::Name, FieldName::Email, FieldName::Subject, FieldName::Message];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Email => "email",
            FieldName::Subject => "subject",
            FieldName::Message => "message",
        }
    }
}

/// Every field's verdict from one validation pass: `None` means the field is fine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationOutcome(BTreeMap<FieldName, Option<String>>);

impl ValidationOutcome {
    pub fn of(form: &ContactMeForm) -> Self {
        match form.validate() {
            Ok(()) => ValidationOutcome(FieldName::ALL.iter().map(|f| (*f, None)).collect()),
            Err(errors) => ValidationOutcome::from(&errors),
        }
    }

    pub fn error(&self, field: FieldName) -> Option<&str> {
        self.0.get(&field).and_then(|e| e.as_deref())
    }

    pub fn has_errors(&self) -> bool {
        self.0.values().any(Option::is_some)
    }
}

impl From<&ValidationErrors> for ValidationOutcome {
    fn from(errors: &ValidationErrors) -> Self {
        let by_field = errors.field_errors();
        let outcome = FieldName::ALL
            .iter()
            .map(|field| {
                let message = by_field
                    .get(field.as_str())
                    .and_then(|errs| errs.first())
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Invalid value".to_string())
                    });
                (*field, message)
            })
            .collect();
        ValidationOutcome(outcome)
    }
}

/// What the email relay receives. Field values are already trimmed and stripped of markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPayload {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
    pub title: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMeResponse {
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub cooldown_secs: u64,
}
