use serde::{Deserialize, Serialize};

pub const CONTACT_SUCCESS_MESSAGE: &str = "Your message has been sent successfully.";
pub const CONTACT_FAILURE_MESSAGE: &str = "Failed to send message. Please try again.";

/// Raw body of `POST /api/contact`. Missing fields deserialize as empty
/// strings so they are reported as validation failures instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ContactResponse {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: CONTACT_SUCCESS_MESSAGE.to_string(),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: CONTACT_FAILURE_MESSAGE.to_string(),
            errors,
        }
    }
}
