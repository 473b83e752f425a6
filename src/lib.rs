pub mod app;
pub mod citation;
pub mod clipboard;
pub mod collection;
pub mod config;
pub mod domain;
pub mod error;
pub mod generation;
pub mod output;
pub mod prompt;
pub mod schema;
pub mod validate;
pub mod works;
