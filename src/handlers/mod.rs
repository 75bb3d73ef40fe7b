//! Command handlers, one module per top-level command.

pub mod account;
pub mod admin;
pub mod download;
pub mod play;
