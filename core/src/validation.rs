//! Form checks run before any request is sent.

use std::collections::BTreeMap;
use std::fmt;

use helpdesk_protocol::requests::CreateTicketRequest;
use helpdesk_protocol::requests::LoginRequest;
use helpdesk_protocol::requests::RegisterRequest;

/// Field-level errors keyed by the field's wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` for `field` unless it already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn min_chars(&mut self, field: &'static str, value: &str, min: usize, message: &str) {
        if value.chars().count() < min {
            self.add(field, message);
        }
    }

    fn email(&mut self, field: &'static str, value: &str) {
        if !is_valid_email(value) {
            self.add(field, "Invalid email address");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.email("email", &self.email);
        errors.min_chars("password", &self.password, 1, "Password is required");
        errors.into_result()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.email("email", &self.email);
        errors.min_chars(
            "password",
            &self.password,
            8,
            "Password must be at least 8 characters",
        );
        errors.min_chars("name", &self.name, 2, "Name must be at least 2 characters");
        errors.into_result()
    }
}

impl Validate for CreateTicketRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.email("guestEmail", &self.guest_email);
        errors.min_chars(
            "guestName",
            &self.guest_name,
            2,
            "Name must be at least 2 characters",
        );
        errors.min_chars(
            "subject",
            &self.subject,
            5,
            "Subject must be at least 5 characters",
        );
        errors.min_chars(
            "initialMessage",
            &self.initial_message,
            10,
            "Message must be at least 10 characters",
        );
        errors.into_result()
    }
}

/// Reply body check.
pub fn validate_message(content: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    errors.min_chars("content", content, 1, "Message cannot be empty");
    errors.into_result()
}

/// `local@domain.tld` with no whitespace and a dotted domain.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("sam@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("sam@localhost"));
        assert!(!is_valid_email("sam example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("sam@@example.com"));
        assert!(!is_valid_email("sam@example..com"));
    }

    #[test]
    fn ticket_form_reports_every_short_field() {
        let form = CreateTicketRequest {
            guest_email: "nope".to_string(),
            guest_name: "S".to_string(),
            subject: "Help".to_string(),
            initial_message: "broken".to_string(),
        };
        let errors = form.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|(field, _)| field).collect();
        assert_eq!(fields, vec!["guestEmail", "guestName", "initialMessage", "subject"]);
        assert_eq!(errors.get("subject"), Some("Subject must be at least 5 characters"));
    }

    #[test]
    fn valid_ticket_passes() {
        let form = CreateTicketRequest {
            guest_email: "sam@example.com".to_string(),
            guest_name: "Sam".to_string(),
            subject: "Cannot log in".to_string(),
            initial_message: "The login page spins forever.".to_string(),
        };
        assert_eq!(form.validate(), Ok(()));
    }

    #[test]
    fn register_needs_eight_char_password() {
        let form = RegisterRequest {
            email: "pat@example.com".to_string(),
            password: "short".to_string(),
            name: "Pat".to_string(),
            role: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            "password: Password must be at least 8 characters"
        );
    }

    #[test]
    fn empty_reply_is_rejected() {
        assert!(validate_message("").is_err());
        assert!(validate_message("ok").is_ok());
    }
}
