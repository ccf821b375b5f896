use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::sanitize::{is_valid_email, normalize_email, strip_control_chars};

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 254;
pub const MESSAGE_MIN_LEN: usize = 10;
pub const MESSAGE_MAX_LEN: usize = 5000;

pub const SUCCESS_MSG: &str = "Email enviado com sucesso!";

/// Contact form exactly as submitted. A field that is absent or not a JSON
/// string is `None`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContactSubmission {
    #[serde(default, deserialize_with = "text_field")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "text_field")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "text_field")]
    pub message: Option<String>,
}

/// A submission that passed every check and is safe to put in an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: String,
    pub id: String,
}

fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

impl ContactSubmission {
    /// Build a submission from the raw request body.
    ///
    /// A body that is itself a JSON string is parsed once more. Documents
    /// that are not objects carry no fields.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let mut value: Value = serde_json::from_slice(body)?;

        if let Value::String(raw) = &value {
            value = serde_json::from_str(raw)?;
        }

        match value {
            Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(ContactSubmission::default()),
        }
    }
}

impl TryFrom<ContactSubmission> for SanitizedContactSubmission {
    type Error = AppError;

    fn try_from(submission: ContactSubmission) -> Result<Self, Self::Error> {
        let name = validate_name(submission.name.as_deref())?;
        let email = validate_email(submission.email.as_deref())?;
        let message = validate_message(submission.message.as_deref())?;

        Ok(SanitizedContactSubmission { name, email, message })
    }
}

pub fn validate_name(name: Option<&str>) -> Result<String, AppError> {
    let name = name.ok_or_else(|| AppError::invalid("name", "Nome é obrigatório."))?;
    let trimmed = name.trim();
    let len = trimmed.chars().count();

    if len < NAME_MIN_LEN {
        return Err(AppError::invalid(
            "name",
            format!("Nome deve ter pelo menos {} caracteres.", NAME_MIN_LEN),
        ));
    }
    if len > NAME_MAX_LEN {
        return Err(AppError::invalid(
            "name",
            format!("Nome não pode exceder {} caracteres.", NAME_MAX_LEN),
        ));
    }

    let sanitized = strip_control_chars(trimmed);
    // Stripping can expose whitespace that sat next to a control character
    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return Err(AppError::invalid("name", "Nome inválido."));
    }

    Ok(sanitized.to_string())
}

pub fn validate_email(email: Option<&str>) -> Result<String, AppError> {
    let email = email.ok_or_else(|| AppError::invalid("email", "Email é obrigatório."))?;
    let trimmed = email.trim();

    if trimmed.chars().count() > EMAIL_MAX_LEN {
        return Err(AppError::invalid("email", "Email muito longo."));
    }
    if !is_valid_email(trimmed) {
        return Err(AppError::invalid("email", "Email inválido."));
    }

    let normalized = normalize_email(trimmed)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| trimmed.to_lowercase());
    if normalized.is_empty() {
        return Err(AppError::invalid("email", "Email inválido."));
    }

    Ok(normalized)
}

pub fn validate_message(message: Option<&str>) -> Result<String, AppError> {
    let message = message.ok_or_else(|| AppError::invalid("message", "Mensagem é obrigatória."))?;
    let trimmed = message.trim();
    let len = trimmed.chars().count();

    if len < MESSAGE_MIN_LEN {
        return Err(AppError::invalid(
            "message",
            format!("Mensagem deve ter pelo menos {} caracteres.", MESSAGE_MIN_LEN),
        ));
    }
    if len > MESSAGE_MAX_LEN {
        return Err(AppError::invalid(
            "message",
            format!("Mensagem não pode exceder {} caracteres.", MESSAGE_MAX_LEN),
        ));
    }

    Ok(trimmed.to_string())
}
