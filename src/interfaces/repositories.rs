pub mod mailer;
pub mod quota;
