//! Configuration file and client preference persistence.

mod service;

pub use service::{SettingsService, SERVER_URL_ENV};
