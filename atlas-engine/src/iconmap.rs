//! Automatic icon selection from host inventory.
//!
//! An icon map is an ordered list of rules, each matching a regular
//! expression against one inventory field. The first matching rule picks the
//! icon; rules with invalid expressions are skipped; without a match the
//! icon map's default icon is used.

use std::collections::HashMap;

use atlas_api::IconId;
use regex::Regex;
use thiserror::Error;

use crate::datastore::{IconMap, IconMapping};

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid mapping expression {expression:?}: {source}")]
    BadExpression {
        expression: String,
        source: regex::Error,
    },
}

/// Evaluate one mapping against an inventory. A missing inventory field is
/// matched as an empty string.
fn try_match(
    mapping: &IconMapping,
    inventory: &HashMap<String, String>,
) -> Result<bool, MappingError> {
    let regex = Regex::new(&mapping.expression).map_err(|source| MappingError::BadExpression {
        expression: mapping.expression.clone(),
        source,
    })?;
    let value = inventory
        .get(&mapping.inventory_field)
        .map(String::as_str)
        .unwrap_or("");
    Ok(regex.is_match(value))
}

/// Pick the icon for a host from its inventory.
pub fn resolve(icon_map: &IconMap, inventory: &HashMap<String, String>) -> IconId {
    if inventory.is_empty() {
        return icon_map.default_icon;
    }

    for mapping in &icon_map.mappings {
        match try_match(mapping, inventory) {
            Ok(true) => return mapping.icon,
            Ok(false) => {}
            Err(err) => {
                tracing::debug!("skipping icon mapping: {err}");
            }
        }
    }

    icon_map.default_icon
}
