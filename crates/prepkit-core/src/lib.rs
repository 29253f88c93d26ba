//! Core types, config, errors, and interview storage for PrepKit.

pub mod config;
pub mod covers;
pub mod error;
pub mod interview_store;
pub mod prompt;
pub mod types;
