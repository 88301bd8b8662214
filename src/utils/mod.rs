// Utility module exports

pub mod date;
pub mod debounce;
pub mod time;
