//! External service integrations

pub mod google;
pub mod openai;

pub use google::{GoogleCalendarClient, GoogleCredentialManager};
pub use openai::OpenAIClient;
