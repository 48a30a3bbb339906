//! Event dispatch installer
//!
//! One OS callback serves every registration; events are demultiplexed by
//! the id carried in each hotkey event.

mod installer;

pub use installer::EventDispatcher;
