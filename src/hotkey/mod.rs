//! Value model for shortcuts: physical keys, modifier sets and names

mod keys;
mod modifiers;
mod name;

pub use keys::Key;
pub use modifiers::{flags, Modifier, Modifiers};
pub use name::Name;
