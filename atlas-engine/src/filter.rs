//! Application filtering of inherited triggers.
//!
//! Host and host-group elements can declare an application filter. Triggers
//! that reached an element through its hosts are dropped when none of their
//! items belong to a filtered application. Triggers placed explicitly as
//! elements of a nested map are never filtered.

use atlas_api::{ElementId, ElementKind, HostGroupId, HostId, ItemId, Map, TriggerId};
use indexmap::{IndexMap, IndexSet};

use crate::datastore::{Datastore, or_empty};
use crate::expand::MembershipIndex;
use crate::resolve::Resolved;

/// Application filters per (element, host) pair. A missing entry means no
/// restriction.
pub(crate) type HostApplicationFilters = IndexMap<ElementId, IndexMap<HostId, Vec<String>>>;

/// Derive the application filters each element applies to each of its hosts.
///
/// Direct host and host-group elements contribute their own filter to every
/// host they resolve to. Map elements are derived from their expanded nested
/// maps: host elements and filtered host-group elements add filters, while a
/// host-group element without a filter clears whatever earlier elements of
/// the same nested map set for its hosts (element order wins).
pub(crate) fn host_application_filters(
    map: &Map,
    index: &MembershipIndex,
    resolved: &Resolved,
) -> HostApplicationFilters {
    // group -> hosts, from the hosts that arrived through groups
    let mut group_host_ids: IndexMap<HostGroupId, IndexSet<HostId>> = IndexMap::new();
    for host in &resolved.group_hosts {
        for &group_id in &host.groups {
            group_host_ids.entry(group_id).or_default().insert(host.id);
        }
    }

    let mut filters = HostApplicationFilters::new();

    for (&element_id, element) in &map.elements {
        match &element.kind {
            ElementKind::Host(_) | ElementKind::HostGroup(_) => {
                let Some(application) = element.application() else {
                    continue;
                };
                let Some(host_ids) = resolved.element_hosts.get(&element_id) else {
                    continue;
                };
                for &host_id in host_ids {
                    filters
                        .entry(element_id)
                        .or_default()
                        .entry(host_id)
                        .or_default()
                        .push(application.to_string());
                }
            }
            ElementKind::Map(_) => {
                let Some(submaps) = index.submaps.get(&element_id) else {
                    continue;
                };
                for submap in submaps {
                    derive_from_submap(element_id, submap, &group_host_ids, &mut filters);
                }
            }
            ElementKind::Trigger(_) | ElementKind::Image => {}
        }
    }

    filters
}

/// Apply one nested map's host and host-group elements to the filter table
/// of the owning map element.
fn derive_from_submap(
    element_id: ElementId,
    submap: &Map,
    group_host_ids: &IndexMap<HostGroupId, IndexSet<HostId>>,
    filters: &mut HostApplicationFilters,
) {
    let mut filtered_groups = Vec::new();
    let mut unfiltered_groups = Vec::new();

    for nested in submap.elements.values() {
        match &nested.kind {
            ElementKind::Host(host) => {
                if let Some(application) = &host.application {
                    filters
                        .entry(element_id)
                        .or_default()
                        .entry(host.host_id)
                        .or_default()
                        .push(application.clone());
                }
            }
            ElementKind::HostGroup(group) => {
                if group.application.is_some() {
                    filtered_groups.push(group);
                } else {
                    unfiltered_groups.push(group);
                }
            }
            _ => {}
        }
    }

    for group in filtered_groups {
        let Some(host_ids) = group_host_ids.get(&group.group_id) else {
            continue;
        };
        let application = group.application.as_ref().expect("filtered group");
        for &host_id in host_ids {
            filters
                .entry(element_id)
                .or_default()
                .entry(host_id)
                .or_default()
                .push(application.clone());
        }
    }

    // a group element without a filter clears filters set above for its hosts
    for group in unfiltered_groups {
        let Some(host_ids) = group_host_ids.get(&group.group_id) else {
            continue;
        };
        if let Some(host_filters) = filters.get_mut(&element_id) {
            for host_id in host_ids {
                host_filters.shift_remove(host_id);
            }
        }
    }
}

/// Drop filtered-out triggers from each element's trigger set.
pub(crate) fn apply(
    store: &dyn Datastore,
    resolved: &mut Resolved,
    index: &MembershipIndex,
    filters: &HostApplicationFilters,
) {
    let Resolved {
        element_hosts,
        element_triggers,
        monitored_triggers,
        ..
    } = resolved;

    let filterable: Vec<ElementId> = element_triggers
        .keys()
        .copied()
        .filter(|id| filters.contains_key(id))
        .collect();

    // triggers that may get removed: inherited through a host that has a
    // filter recorded for the element
    let mut candidates: IndexMap<TriggerId, IndexSet<HostId>> = IndexMap::new();
    for &element_id in &filterable {
        for trigger_id in &element_triggers[&element_id] {
            let Some(trigger) = monitored_triggers.get(trigger_id) else {
                continue;
            };
            let element_filters = &filters[&element_id];
            if trigger
                .hosts
                .iter()
                .any(|host_id| element_filters.contains_key(host_id))
            {
                candidates
                    .entry(*trigger_id)
                    .or_default()
                    .extend(trigger.hosts.iter().copied());
            }
        }
    }

    if candidates.is_empty() {
        return;
    }

    // applications per candidate trigger, via its items
    let item_ids: IndexSet<ItemId> = candidates
        .keys()
        .flat_map(|id| monitored_triggers[id].items.iter().copied())
        .collect();
    let item_ids: Vec<ItemId> = item_ids.into_iter().collect();
    let item_applications = or_empty("item applications", store.item_applications(&item_ids));

    let mut trigger_applications: IndexMap<TriggerId, IndexSet<String>> = IndexMap::new();
    let mut host_triggers: IndexMap<HostId, IndexSet<TriggerId>> = IndexMap::new();
    for (&trigger_id, host_ids) in &candidates {
        let applications = trigger_applications.entry(trigger_id).or_default();
        for item_id in &monitored_triggers[&trigger_id].items {
            if let Some(names) = item_applications.get(item_id) {
                applications.extend(names.iter().cloned());
            }
        }
        for &host_id in host_ids {
            host_triggers.entry(host_id).or_default().insert(trigger_id);
        }
    }

    for &element_id in &filterable {
        let element_filters = &filters[&element_id];
        let Some(host_ids) = element_hosts.get(&element_id) else {
            continue;
        };
        for host_id in host_ids {
            let (Some(filter), Some(trigger_ids)) =
                (element_filters.get(host_id), host_triggers.get(host_id))
            else {
                continue;
            };
            for trigger_id in trigger_ids {
                // explicitly placed nested-map triggers stay
                if index
                    .submap_trigger_elements
                    .get(trigger_id)
                    .is_some_and(|ids| ids.contains(&element_id))
                {
                    continue;
                }
                let empty = IndexSet::new();
                let applications = trigger_applications.get(trigger_id).unwrap_or(&empty);
                if !applications.iter().any(|name| filter.contains(name)) {
                    if let Some(triggers) = element_triggers.get_mut(&element_id) {
                        triggers.shift_remove(trigger_id);
                    }
                }
            }
        }
    }
}
