// Service module exports

pub mod api;
pub mod event_manager;
pub mod event_store;
pub mod overlay;
pub mod schedule;
pub mod settings;
pub mod timeline;
pub mod users;
