//! Natural-language event creation.

pub mod ports;
pub mod service;

pub use service::NaturalLanguageEventService;
