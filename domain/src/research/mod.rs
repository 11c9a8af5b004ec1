//! Research evidence types

pub mod evidence;
