use std::sync::Arc;

use shared::{
    domain::{ContactMessageId, NewContactMessage},
    error::{ApiError, ErrorCode},
    protocol::{ContactRequest, FieldError},
};
use storage::ContactStore;
use thiserror::Error;
use tracing::{error, info, warn};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_SUBJECT_CHARS: usize = 5;
pub const MIN_MESSAGE_CHARS: usize = 10;

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn ContactStore>,
}

impl ApiContext {
    pub fn new(store: impl ContactStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("invalid contact submission")]
    Invalid(Vec<FieldError>),
    #[error("failed to store contact message: {0}")]
    Storage(#[source] anyhow::Error),
}

impl ContactSubmitError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ContactSubmitError::Invalid(errors) => errors,
            ContactSubmitError::Storage(_) => &[],
        }
    }
}

/// Checks every field and reports all failures at once. Values are trimmed
/// before their length is counted, and the trimmed values are what get stored.
pub fn validate_contact(req: &ContactRequest) -> Result<NewContactMessage, Vec<FieldError>> {
    let name = req.name.trim();
    let email = req.email.trim();
    let subject = req.subject.trim();
    let message = req.message.trim();

    let mut errors = Vec::new();
    if name.chars().count() < MIN_NAME_CHARS {
        errors.push(field_error("name", "Name must be at least 2 characters"));
    }
    if !is_valid_email(email) {
        errors.push(field_error("email", "Please enter a valid email address"));
    }
    if subject.chars().count() < MIN_SUBJECT_CHARS {
        errors.push(field_error("subject", "Subject must be at least 5 characters"));
    }
    if message.chars().count() < MIN_MESSAGE_CHARS {
        errors.push(field_error("message", "Message must be at least 10 characters"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewContactMessage {
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
    })
}

pub async fn submit_contact(
    ctx: &ApiContext,
    req: &ContactRequest,
) -> Result<ContactMessageId, ContactSubmitError> {
    let record = validate_contact(req).map_err(|errors| {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        warn!(?fields, "rejected contact submission");
        ContactSubmitError::Invalid(errors)
    })?;

    let id = ctx.store.save(&record).await.map_err(|err| {
        error!(error = %err, "contact form submission could not be stored");
        ContactSubmitError::Storage(err)
    })?;

    info!(contact_message_id = id.0, "stored contact message");
    Ok(id)
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.health_check().await.map_err(internal)
}

/// Single `@`, a dot-separated domain with a 2+ letter top-level label, and
/// no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic));

    labels_ok && tld_ok
}

fn field_error(field: &str, message: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
