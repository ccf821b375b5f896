use ammonia::clean_text;
use serde::{Deserialize, Serialize};

use crate::entities::contact::SanitizedContactSubmission;

pub const SUBJECT_SUFFIX: &str = "entrou em contato via Web Portfólio";

/// Sender and recipient used for every contact message.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub from: String,
    pub to: String,
}

/// Message handed to the mail provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: String,
}

/// Identifier the provider assigned to an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MailReceipt {
    pub id: String,
}

impl OutboundEmail {
    pub fn from_submission(settings: &MailSettings, submission: &SanitizedContactSubmission) -> Self {
        OutboundEmail {
            from: settings.from.clone(),
            to: vec![settings.to.clone()],
            subject: format!("{} {}", submission.name, SUBJECT_SUFFIX),
            html: render_html(submission),
            text: render_text(submission),
            reply_to: submission.email.clone(),
        }
    }
}

/// HTML body. Every user-supplied value is escaped.
fn render_html(submission: &SanitizedContactSubmission) -> String {
    let message = clean_text(&submission.message).replace("&#10;", "<br />");
    format!(
        "<div><b>Email: {email} </b><b>Nome: {name}</b><hr /><p>{message}</p></div>",
        email = clean_text(&submission.email),
        name = clean_text(&submission.name),
        message = message,
    )
}

fn render_text(submission: &SanitizedContactSubmission) -> String {
    format!(
        "Email: {}\nNome: {}\n\n{}",
        submission.email, submission.name, submission.message
    )
}
