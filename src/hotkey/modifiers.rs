//! Modifier key definitions and canonical modifier sets
//!
//! Modifiers always combine and render in the order
//! control, option, shift, command, whatever order they were supplied in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HotkeyError;

/// Carbon modifier masks (these differ from the CGEvent flag masks)
pub mod flags {
    /// cmdKey
    pub const COMMAND: u32 = 1 << 8;
    /// shiftKey
    pub const SHIFT: u32 = 1 << 9;
    /// optionKey
    pub const OPTION: u32 = 1 << 11;
    /// controlKey
    pub const CONTROL: u32 = 1 << 12;
}

/// A modifier key
///
/// Declaration order is the canonical order, so the derived `Ord` sorts
/// modifiers the way they are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Control,
    Option,
    Shift,
    Command,
}

impl Modifier {
    /// All modifiers in canonical order
    pub const ALL: [Modifier; 4] = [
        Modifier::Control,
        Modifier::Option,
        Modifier::Shift,
        Modifier::Command,
    ];

    /// Carbon modifier mask for this key
    pub fn carbon_flag(self) -> u32 {
        match self {
            Modifier::Control => flags::CONTROL,
            Modifier::Option => flags::OPTION,
            Modifier::Shift => flags::SHIFT,
            Modifier::Command => flags::COMMAND,
        }
    }

    /// Menu-style symbol
    pub fn symbol(self) -> &'static str {
        match self {
            Modifier::Control => "⌃",
            Modifier::Option => "⌥",
            Modifier::Shift => "⇧",
            Modifier::Command => "⌘",
        }
    }

    /// Parse a modifier name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "control" | "ctrl" => Some(Modifier::Control),
            "option" | "alt" | "opt" => Some(Modifier::Option),
            "shift" => Some(Modifier::Shift),
            "command" | "cmd" => Some(Modifier::Command),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl FromStr for Modifier {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modifier::from_name(s)
            .ok_or_else(|| HotkeyError::InvalidShortcut(format!("unknown modifier '{s}'")))
    }
}

/// An unordered set of modifiers that always iterates in canonical order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    /// The empty set
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Check if no modifier is set
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of modifiers in the set
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.bits & modifier.bit() != 0
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.bits |= modifier.bit();
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.bits &= !modifier.bit();
    }

    /// Iterate in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.contains(*m))
    }

    /// Combined Carbon modifier mask
    pub fn carbon_flags(&self) -> u32 {
        self.iter().fold(0, |mask, m| mask | m.carbon_flag())
    }

    /// Build a set from a Carbon modifier mask, ignoring unknown bits
    pub fn from_carbon_flags(mask: u32) -> Self {
        Modifier::ALL
            .into_iter()
            .filter(|m| mask & m.carbon_flag() != 0)
            .collect()
    }

    /// Symbols concatenated in canonical order, e.g. `⌃⇧`
    pub fn display(&self) -> String {
        self.iter().map(Modifier::symbol).collect()
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Modifiers::empty();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl<const N: usize> From<[Modifier; N]> for Modifiers {
    fn from(modifiers: [Modifier; N]) -> Self {
        modifiers.into_iter().collect()
    }
}

impl From<Modifier> for Modifiers {
    fn from(modifier: Modifier) -> Self {
        [modifier].into()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Serialize for Modifiers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Modifier>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let set = Modifiers::default();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.carbon_flags(), 0);
        assert_eq!(set.display(), "");
    }

    #[test]
    fn test_canonical_display_is_order_independent() {
        let a = Modifiers::from([Modifier::Shift, Modifier::Control]);
        let b = Modifiers::from([Modifier::Control, Modifier::Shift]);
        assert_eq!(a.display(), b.display());
        assert_eq!(a.display(), "⌃⇧");
        assert_eq!(a, b);
    }

    #[test]
    fn test_carbon_flags_are_order_independent() {
        let a = Modifiers::from([Modifier::Command, Modifier::Option]);
        let b = Modifiers::from([Modifier::Option, Modifier::Command]);
        assert_eq!(a.carbon_flags(), b.carbon_flags());
        assert_eq!(a.carbon_flags(), flags::COMMAND | flags::OPTION);
    }

    #[test]
    fn test_iteration_order() {
        let set = Modifiers::from([
            Modifier::Command,
            Modifier::Shift,
            Modifier::Option,
            Modifier::Control,
        ]);
        let order: Vec<Modifier> = set.iter().collect();
        assert_eq!(order, Modifier::ALL.to_vec());
        assert_eq!(set.display(), "⌃⌥⇧⌘");
    }

    #[test]
    fn test_from_carbon_flags() {
        let mask = flags::CONTROL | flags::SHIFT | 0x1;
        let set = Modifiers::from_carbon_flags(mask);
        assert_eq!(set, Modifiers::from([Modifier::Control, Modifier::Shift]));
    }

    #[test]
    fn test_insert_remove() {
        let mut set = Modifiers::from(Modifier::Option);
        set.insert(Modifier::Option);
        assert_eq!(set.len(), 1);
        set.remove(Modifier::Option);
        assert!(set.is_empty());
    }

    #[test]
    fn test_modifier_names() {
        assert_eq!(Modifier::from_name("Ctrl"), Some(Modifier::Control));
        assert_eq!(Modifier::from_name("alt"), Some(Modifier::Option));
        assert_eq!(Modifier::from_name("cmd"), Some(Modifier::Command));
        assert!("hyper".parse::<Modifier>().is_err());
    }

    #[test]
    fn test_serializes_as_canonical_list() {
        let set = Modifiers::from([Modifier::Command, Modifier::Control]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["control","command"]"#);
        let back: Modifiers = serde_json::from_str(r#"["command","control"]"#).unwrap();
        assert_eq!(back, set);
    }
}
