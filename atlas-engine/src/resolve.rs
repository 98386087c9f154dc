//! Entity resolution - fetch host and trigger rows and attach them to the
//! elements they contribute to.

use atlas_api::{ElementId, HostId, Map, TriggerId};
use indexmap::{IndexMap, IndexSet};

use crate::datastore::{Datastore, HostRow, TriggerRow, or_empty};
use crate::expand::MembershipIndex;

/// Hosts and triggers resolved for one render, plus per-element membership.
#[derive(Debug, Default)]
pub(crate) struct Resolved {
    /// Every host contributing to the map.
    pub hosts: IndexMap<HostId, HostRow>,
    /// Every trigger contributing to the map.
    pub triggers: IndexMap<TriggerId, TriggerRow>,
    /// Hosts contributing to each element.
    pub element_hosts: IndexMap<ElementId, IndexSet<HostId>>,
    /// Triggers contributing to each element. Mutated by application
    /// filtering.
    pub element_triggers: IndexMap<ElementId, IndexSet<TriggerId>>,
    /// Hosts that arrived through host groups, `groups` field filled.
    pub group_hosts: Vec<HostRow>,
    /// Problem triggers of monitored hosts, `hosts` and `items` filled.
    /// Only these are candidates for application filtering.
    pub monitored_triggers: IndexMap<TriggerId, TriggerRow>,
}

/// Resolve hosts and triggers for a map.
///
/// Hosts found through groups are added to `index.host_elements` so their
/// triggers attach to the group elements as well.
pub(crate) fn resolve(
    store: &dyn Datastore,
    map: &Map,
    index: &mut MembershipIndex,
) -> Resolved {
    let mut resolved = Resolved::default();
    for &element_id in map.elements.keys() {
        resolved.element_hosts.entry(element_id).or_default();
        resolved.element_triggers.entry(element_id).or_default();
    }

    // hosts referenced directly or through nested maps
    if !index.host_elements.is_empty() {
        let ids: Vec<HostId> = index.host_elements.keys().copied().collect();
        for host in or_empty("host", store.hosts(&ids)) {
            let Some(element_ids) = index.host_elements.get(&host.id) else {
                continue;
            };
            for &element_id in element_ids {
                resolved
                    .element_hosts
                    .entry(element_id)
                    .or_default()
                    .insert(host.id);
            }
            resolved.hosts.insert(host.id, host);
        }
    }

    // hosts that come in through host groups
    if !index.group_elements.is_empty() {
        let ids: Vec<_> = index.group_elements.keys().copied().collect();
        for host in or_empty("group host", store.group_hosts(&ids)) {
            for group_id in &host.groups {
                let Some(element_ids) = index.group_elements.get(group_id) else {
                    continue;
                };
                for &element_id in element_ids {
                    resolved
                        .element_hosts
                        .entry(element_id)
                        .or_default()
                        .insert(host.id);
                    index
                        .host_elements
                        .entry(host.id)
                        .or_default()
                        .insert(element_id);
                }
            }
            resolved.group_hosts.push(host.clone());
            resolved.hosts.insert(host.id, host);
        }
    }

    // triggers placed directly on the map, in any state
    if !index.trigger_elements.is_empty() {
        let ids: Vec<_> = index.trigger_elements.keys().copied().collect();
        for trigger in or_empty("trigger", store.triggers(&ids)) {
            let Some(element_ids) = index.trigger_elements.get(&trigger.id) else {
                continue;
            };
            for &element_id in element_ids {
                resolved
                    .element_triggers
                    .entry(element_id)
                    .or_default()
                    .insert(trigger.id);
            }
            resolved.triggers.insert(trigger.id, trigger);
        }
    }

    // trigger elements of nested maps, problems only
    if !index.submap_trigger_elements.is_empty() {
        let ids: Vec<_> = index.submap_trigger_elements.keys().copied().collect();
        for trigger in or_empty("nested map trigger", store.problem_triggers(&ids)) {
            let Some(element_ids) = index.submap_trigger_elements.get(&trigger.id) else {
                continue;
            };
            for &element_id in element_ids {
                resolved
                    .element_triggers
                    .entry(element_id)
                    .or_default()
                    .insert(trigger.id);
            }
            resolved.triggers.insert(trigger.id, trigger);
        }
    }

    // problem triggers of every monitored host
    let monitored: Vec<HostId> = resolved
        .hosts
        .values()
        .filter(|host| host.monitored)
        .map(|host| host.id)
        .collect();
    if !monitored.is_empty() {
        for trigger in or_empty("host trigger", store.host_problem_triggers(&monitored)) {
            for host_id in &trigger.hosts {
                let Some(element_ids) = index.host_elements.get(host_id) else {
                    continue;
                };
                for &element_id in element_ids {
                    resolved
                        .element_triggers
                        .entry(element_id)
                        .or_default()
                        .insert(trigger.id);
                }
            }
            resolved
                .monitored_triggers
                .insert(trigger.id, trigger.clone());
            resolved.triggers.insert(trigger.id, trigger);
        }
    }

    resolved
}
