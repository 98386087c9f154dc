//! Computed per-element render state - status aggregates and icon info.

use serde::{Deserialize, Serialize};

use crate::IconId;

/// Trigger severity, lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    #[default]
    NotClassified,
    Information,
    Warning,
    Average,
    High,
    Disaster,
}

/// An RGB color, serialized as an `RRGGBB` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse an `RRGGBB` hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&s[0..2], 16).ok()?;
        let g = u8::from_str_radix(&s[2..4], 16).ok()?;
        let b = u8::from_str_radix(&s[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> String {
        color.hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s).ok_or_else(|| format!("invalid color {s:?}"))
    }
}

/// Aggregate status of one element. Derived, never persisted; recomputed on
/// every render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    /// Contributing hosts that are not monitored.
    pub disabled_hosts: u32,
    /// Contributing hosts currently in maintenance.
    pub maintenance_hosts: u32,
    /// Triggers in problem state at or above the severity floor.
    pub problems: u32,
    /// Problem triggers whose last event is unacknowledged.
    pub problems_unack: u32,
    /// Triggers that are administratively disabled.
    pub triggers_disabled: u32,
    /// Highest severity among problem triggers.
    pub severity: Severity,
    /// Any considered trigger changed within the blink window.
    pub lately_changed: bool,
    /// All observed problem events are acknowledged. `false` when no event
    /// was observed at all.
    pub acknowledged: bool,
    /// Resolved trigger name, set when the map expands a single problem.
    pub problem_title: Option<String>,
    /// Maintenance window name, set for host elements with exactly one host
    /// in maintenance.
    pub maintenance_title: Option<String>,
}

/// Which of an element's per-state icons is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IconKind {
    #[default]
    Off,
    On,
    Maintenance,
    Disabled,
}

/// Category of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoKind {
    Problem,
    Unacknowledged,
    Maintenance,
    Disabled,
    Ok,
}

/// One status line shown next to an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoLine {
    pub kind: InfoKind,
    pub message: String,
    pub color: Color,
}

impl InfoLine {
    pub fn new(kind: InfoKind, message: impl Into<String>, color: Color) -> Self {
        Self {
            kind,
            message: message.into(),
            color,
        }
    }
}

/// Render state of one element: chosen icon, status lines and display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub icon: IconId,
    pub icon_kind: IconKind,
    /// Ordered status lines.
    pub info: Vec<InfoLine>,
    /// Display name, when the label policy asks for element names.
    pub name: Option<String>,
    pub severity: Severity,
    pub lately_changed: bool,
    pub acknowledged: bool,
    /// Trigger elements only: the raw trigger expression, for the label layer.
    pub expression: Option<String>,
}

impl ElementInfo {
    /// First status line of the given kind, if present.
    pub fn line(&self, kind: InfoKind) -> Option<&InfoLine> {
        self.info.iter().find(|line| line.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Disaster > Severity::High);
        assert!(Severity::Information > Severity::NotClassified);
        assert_eq!(Severity::default(), Severity::NotClassified);
    }

    #[test]
    fn test_color_hex_round_trip() {
        let c = Color::from_hex("EE6000").unwrap();
        assert_eq!(c, Color::new(0xEE, 0x60, 0x00));
        assert_eq!(c.hex(), "EE6000");
        assert!(Color::from_hex("GG0000").is_none());
        assert!(Color::from_hex("FF00").is_none());
    }
}
