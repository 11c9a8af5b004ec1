//! Core domain types shared across the pipeline

pub mod error;
pub mod model;
pub mod question;
