//! Sub-map expansion and membership indexing.
//!
//! Walks every map element's nested maps level by level and records which
//! top-level element each nested host group, host and trigger belongs to.
//! Downstream stages use these indices instead of re-querying per element.

use std::collections::HashSet;

use atlas_api::{ElementId, ElementKind, HostGroupId, HostId, Map, MapId, TriggerId};
use indexmap::{IndexMap, IndexSet};

use crate::datastore::{Datastore, or_empty};
use crate::error::EngineError;

/// Membership indices of one map, including everything reachable through
/// nested maps.
#[derive(Debug, Default)]
pub(crate) struct MembershipIndex {
    /// Host group -> top-level elements it contributes to.
    pub group_elements: IndexMap<HostGroupId, IndexSet<ElementId>>,
    /// Host -> top-level elements it contributes to. Extended later with
    /// hosts resolved from groups.
    pub host_elements: IndexMap<HostId, IndexSet<ElementId>>,
    /// Directly placed trigger elements.
    pub trigger_elements: IndexMap<TriggerId, IndexSet<ElementId>>,
    /// Trigger elements found inside nested maps. These triggers are exempt
    /// from application filtering.
    pub submap_trigger_elements: IndexMap<TriggerId, IndexSet<ElementId>>,
    /// Expanded nested maps per map element, in expansion order.
    pub submaps: IndexMap<ElementId, Vec<Map>>,
    /// Hosts whose inventory is needed for icon mapping.
    pub inventory_hosts: IndexSet<HostId>,
}

/// Build the membership index for a map.
///
/// Nested maps are resolved breadth-first per map element. A nested map that
/// cannot be fetched contributes nothing; a nested map that leads back to an
/// already visited one fails with [`EngineError::CyclicMapReference`].
pub(crate) fn index_map(
    store: &dyn Datastore,
    map: &Map,
) -> Result<MembershipIndex, EngineError> {
    let mut index = MembershipIndex::default();
    let collect_inventory = map.icon_map.is_some();

    for (&element_id, element) in &map.elements {
        match &element.kind {
            ElementKind::Host(host) => {
                index
                    .host_elements
                    .entry(host.host_id)
                    .or_default()
                    .insert(element_id);
                if collect_inventory && host.use_icon_map {
                    index.inventory_hosts.insert(host.host_id);
                }
            }
            ElementKind::HostGroup(group) => {
                index
                    .group_elements
                    .entry(group.group_id)
                    .or_default()
                    .insert(element_id);
            }
            ElementKind::Trigger(trigger_id) => {
                index
                    .trigger_elements
                    .entry(*trigger_id)
                    .or_default()
                    .insert(element_id);
            }
            ElementKind::Map(map_id) => {
                expand_into(store, map.id, element_id, *map_id, &mut index)?;
            }
            ElementKind::Image => {}
        }
    }

    Ok(index)
}

/// Walk the nested maps below one map element, level by level.
fn expand_into(
    store: &dyn Datastore,
    root_id: Option<MapId>,
    element_id: ElementId,
    start: MapId,
    index: &mut MembershipIndex,
) -> Result<(), EngineError> {
    let mut visited: HashSet<MapId> = HashSet::new();
    if let Some(root) = root_id {
        visited.insert(root);
    }

    let mut level: IndexSet<MapId> = IndexSet::new();
    level.insert(start);
    while !level.is_empty() {
        for &map_id in &level {
            if !visited.insert(map_id) {
                return Err(EngineError::CyclicMapReference(map_id));
            }
        }

        let ids: Vec<MapId> = level.iter().copied().collect();
        let submaps = or_empty("nested map", store.maps(&ids));
        level.clear();

        for submap in submaps {
            for nested in submap.elements.values() {
                match &nested.kind {
                    ElementKind::Map(nested_map) => {
                        level.insert(*nested_map);
                    }
                    ElementKind::HostGroup(group) => {
                        index
                            .group_elements
                            .entry(group.group_id)
                            .or_default()
                            .insert(element_id);
                    }
                    ElementKind::Host(host) => {
                        index
                            .host_elements
                            .entry(host.host_id)
                            .or_default()
                            .insert(element_id);
                    }
                    ElementKind::Trigger(trigger_id) => {
                        index
                            .submap_trigger_elements
                            .entry(*trigger_id)
                            .or_default()
                            .insert(element_id);
                    }
                    ElementKind::Image => {}
                }
            }
            index.submaps.entry(element_id).or_default().push(submap);
        }
    }

    Ok(())
}
