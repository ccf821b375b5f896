pub mod entities;
pub mod sanitize;
pub mod use_cases;
