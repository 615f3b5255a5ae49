use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 50;
const EMAIL_MAX: usize = 100;
const SUBJECT_MIN: usize = 5;
const SUBJECT_MAX: usize = 100;
const MESSAGE_MIN: usize = 10;
const MESSAGE_MAX: usize = 1000;

static NAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z\s]+$").expect("name pattern is valid")
});

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Minimum lengths apply to the trimmed value, maximums to the raw value.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(field_error("required", "Name is required"));
    }
    if char_len(trimmed) < NAME_MIN {
        return Err(field_error("name_length", "Name must be at least 2 characters"));
    }
    if char_len(name) > NAME_MAX {
        return Err(field_error("name_length", "Name is too long"));
    }
    if !NAME_CHARS.is_match(name) {
        return Err(field_error("name_charset", "Name can only contain letters and spaces"));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(field_error("required", "Email is required"));
    }
    if !EMAIL_SHAPE.is_match(email) {
        return Err(field_error("email_format", "Enter a valid email address"));
    }
    if char_len(email) > EMAIL_MAX {
        return Err(field_error("email_length", "Email is too long"));
    }
    Ok(())
}

pub fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    let trimmed = subject.trim();
    if trimmed.is_empty() {
        return Err(field_error("required", "Subject is required"));
    }
    if char_len(trimmed) < SUBJECT_MIN {
        return Err(field_error("subject_length", "Subject must be at least 5 characters"));
    }
    if char_len(subject) > SUBJECT_MAX {
        return Err(field_error("subject_length", "Subject is too long"));
    }
    Ok(())
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(field_error("required", "Message is required"));
    }
    if char_len(trimmed) < MESSAGE_MIN {
        return Err(field_error("message_length", "Message must be at least 10 characters"));
    }
    if char_len(message) > MESSAGE_MAX {
        return Err(field_error("message_length", "Message is too long (max 1000 characters)"));
    }
    Ok(())
}
