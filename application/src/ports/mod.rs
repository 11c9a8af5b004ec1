//! Ports - interfaces implemented by infrastructure adapters

pub mod model_invoker;
pub mod search_provider;
