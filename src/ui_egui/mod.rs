mod app;
pub mod drag;
mod event_dialog;
mod views;

pub use app::SchedulerApp;
