pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod metadata;
pub mod output;
pub mod query;
pub mod source;
pub mod version;
