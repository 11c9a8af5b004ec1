//! Model provider adapters

pub mod openrouter;
