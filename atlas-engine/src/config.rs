//! Engine configuration, injected by the host application.

use std::collections::BTreeMap;

use atlas_api::{Color, Severity};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Colors used for element status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Problem lines for severities above [`Severity::Average`].
    pub problem_high: Color,
    /// Problem, unacknowledged and disabled lines.
    pub problem: Color,
    pub maintenance: Color,
    pub ok: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            problem_high: Color::new(0xFF, 0x00, 0x00),
            problem: Color::new(0x96, 0x00, 0x00),
            maintenance: Color::new(0xEE, 0x60, 0x00),
            ok: Color::new(0x00, 0x96, 0x00),
        }
    }
}

/// Global settings the engine depends on. Passed in explicitly; the engine
/// never reads ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether event acknowledgement is enabled at all. When off, every map
    /// behaves as if its problem display were
    /// [`atlas_api::ProblemDisplay::All`].
    pub ack_enabled: bool,
    /// Window after a trigger's last change during which its elements are
    /// marked as lately changed (and blink in the renderer).
    pub blink_period_secs: i64,
    /// Event retention horizon, consumed by datastore implementations when
    /// they look up last events.
    pub event_expire_days: u32,
    /// Highlight ring color per severity.
    pub severity_colors: BTreeMap<Severity, Color>,
    pub palette: Palette,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let severity_colors = [
            (Severity::NotClassified, Color::new(0xDB, 0xDB, 0xDB)),
            (Severity::Information, Color::new(0xD6, 0xF6, 0xFF)),
            (Severity::Warning, Color::new(0xFF, 0xF6, 0xA5)),
            (Severity::Average, Color::new(0xFF, 0xB6, 0x89)),
            (Severity::High, Color::new(0xFF, 0x99, 0x99)),
            (Severity::Disaster, Color::new(0xFF, 0x38, 0x38)),
        ]
        .into_iter()
        .collect();

        Self {
            ack_enabled: true,
            blink_period_secs: 1800,
            event_expire_days: 365,
            severity_colors,
            palette: Palette::default(),
        }
    }
}

impl EngineConfig {
    /// Highlight ring color for a severity.
    pub fn severity_color(&self, severity: Severity) -> Color {
        self.severity_colors
            .get(&severity)
            .copied()
            .unwrap_or(Color::new(0x97, 0xAA, 0xB3))
    }

    pub(crate) fn blink_window(&self) -> Duration {
        Duration::seconds(self.blink_period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_color_lookup() {
        let config = EngineConfig::default();
        assert_eq!(
            config.severity_color(Severity::Disaster),
            Color::new(0xFF, 0x38, 0x38)
        );

        let empty = EngineConfig {
            severity_colors: BTreeMap::new(),
            ..EngineConfig::default()
        };
        assert_eq!(
            empty.severity_color(Severity::High),
            Color::new(0x97, 0xAA, 0xB3)
        );
    }
}
