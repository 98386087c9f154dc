//! Link appearance resolution.
//!
//! A link's color and line style can be overridden by its attached triggers.
//! Candidates are walked in ascending trigger-id order; an enabled trigger
//! in problem state takes over when its severity is at least the running
//! maximum, so among equals the highest trigger id wins.

use atlas_api::{Color, Link, LinkDraw, TriggerId};
use indexmap::IndexMap;

use crate::datastore::TriggerRow;

/// Resolved visual style of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStyle {
    pub color: Color,
    pub draw: LinkDraw,
}

/// Resolve the style of one link against the current trigger state.
pub fn resolve_style(link: &Link, triggers: &IndexMap<TriggerId, TriggerRow>) -> LinkStyle {
    let mut style = LinkStyle {
        color: link.color,
        draw: link.draw,
    };

    let mut candidates = link.triggers.clone();
    candidates.sort_by_key(|candidate| candidate.trigger_id);

    let mut max_severity = None;
    for candidate in &candidates {
        let Some(trigger) = triggers.get(&candidate.trigger_id) else {
            continue;
        };
        if !trigger.enabled || !trigger.problem {
            continue;
        }
        if max_severity.is_none_or(|max| trigger.severity >= max) {
            style = LinkStyle {
                color: candidate.color,
                draw: candidate.draw,
            };
            max_severity = Some(trigger.severity);
        }
    }

    style
}
