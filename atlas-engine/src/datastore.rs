//! Collaborator seams - the object-query datastore, macro resolution and
//! icon metrics.
//!
//! The engine never talks to a database or an image library directly.
//! Everything it needs arrives through the traits in this module; the host
//! application wires them to its API layer. Lookup failures are not fatal:
//! callers degrade to empty results (see [`or_empty`]) and the affected
//! elements simply contribute nothing to the render.

use std::collections::HashMap;

use atlas_api::{
    HostGroupId, HostId, IconId, IconMapId, ItemId, MaintenanceId, Map, MapId, Severity, TriggerId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A host as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRow {
    pub id: HostId,
    pub name: String,
    /// Administratively monitored. Unmonitored hosts count as disabled.
    pub monitored: bool,
    pub in_maintenance: bool,
    pub maintenance: Option<MaintenanceId>,
    /// Host groups the host belongs to. Filled by [`Datastore::group_hosts`].
    pub groups: Vec<HostGroupId>,
}

impl HostRow {
    pub fn new(id: HostId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            monitored: true,
            in_maintenance: false,
            maintenance: None,
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<HostGroupId>) -> Self {
        self.groups = groups;
        self
    }

    pub fn unmonitored(mut self) -> Self {
        self.monitored = false;
        self
    }

    pub fn in_maintenance(mut self, maintenance: MaintenanceId) -> Self {
        self.in_maintenance = true;
        self.maintenance = Some(maintenance);
        self
    }
}

/// Most recent event of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub acknowledged: bool,
}

/// A trigger as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRow {
    pub id: TriggerId,
    /// Administratively enabled.
    pub enabled: bool,
    /// Currently in problem state.
    pub problem: bool,
    pub severity: Severity,
    pub last_change: DateTime<Utc>,
    pub description: String,
    pub expression: String,
    pub last_event: Option<EventRow>,
    /// Owning hosts. Filled by [`Datastore::host_problem_triggers`].
    pub hosts: Vec<HostId>,
    /// Items the expression references. Filled by
    /// [`Datastore::host_problem_triggers`].
    pub items: Vec<ItemId>,
}

impl TriggerRow {
    pub fn new(id: TriggerId, severity: Severity) -> Self {
        Self {
            id,
            enabled: true,
            problem: false,
            severity,
            last_change: DateTime::UNIX_EPOCH,
            description: String::new(),
            expression: String::new(),
            last_event: None,
            hosts: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_problem(mut self) -> Self {
        self.problem = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_event(mut self, acknowledged: bool) -> Self {
        self.last_event = Some(EventRow { acknowledged });
        self
    }

    pub fn with_hosts(mut self, hosts: Vec<HostId>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_items(mut self, items: Vec<ItemId>) -> Self {
        self.items = items;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_last_change(mut self, at: DateTime<Utc>) -> Self {
        self.last_change = at;
        self
    }
}

/// One icon-map rule: a regular expression matched against an inventory
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconMapping {
    pub inventory_field: String,
    pub expression: String,
    pub icon: IconId,
}

/// Inventory-based automatic icon selection, assigned per map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconMap {
    pub id: IconMapId,
    pub default_icon: IconId,
    /// Ordered rules; the first match wins.
    pub mappings: Vec<IconMapping>,
}

/// The object-query API the engine reads from.
///
/// Implementations are expected to enforce the caller's read permissions:
/// ids the caller may not see are simply absent from the result, which the
/// engine treats the same as ids that do not exist.
pub trait Datastore {
    /// Map definitions with their elements, for sub-map expansion.
    fn maps(&self, ids: &[MapId]) -> anyhow::Result<Vec<Map>>;

    /// Hosts by id.
    fn hosts(&self, ids: &[HostId]) -> anyhow::Result<Vec<HostRow>>;

    /// Hosts belonging to any of the given groups, with their `groups` field
    /// filled in.
    fn group_hosts(&self, groups: &[HostGroupId]) -> anyhow::Result<Vec<HostRow>>;

    /// Triggers by id, in any state, including disabled ones.
    fn triggers(&self, ids: &[TriggerId]) -> anyhow::Result<Vec<TriggerRow>>;

    /// Triggers by id, restricted to enabled triggers currently in problem
    /// state whose dependencies are not themselves in problem state.
    fn problem_triggers(&self, ids: &[TriggerId]) -> anyhow::Result<Vec<TriggerRow>>;

    /// Problem triggers of the given (monitored) hosts, with `hosts` and
    /// `items` filled in. Same dependency and state rules as
    /// [`Datastore::problem_triggers`].
    fn host_problem_triggers(&self, hosts: &[HostId]) -> anyhow::Result<Vec<TriggerRow>>;

    /// Application names per item.
    fn item_applications(&self, items: &[ItemId]) -> anyhow::Result<HashMap<ItemId, Vec<String>>>;

    /// Display name of a maintenance window.
    fn maintenance_name(&self, id: MaintenanceId) -> anyhow::Result<Option<String>>;

    fn icon_map(&self, id: IconMapId) -> anyhow::Result<Option<IconMap>>;

    /// Inventory fields per host, keyed by field name.
    fn host_inventory(
        &self,
        hosts: &[HostId],
    ) -> anyhow::Result<HashMap<HostId, HashMap<String, String>>>;

    /// Display names of maps, for element labels.
    fn map_names(&self, ids: &[MapId]) -> anyhow::Result<HashMap<MapId, String>>;

    /// Display names of host groups, for element labels.
    fn group_names(&self, ids: &[HostGroupId]) -> anyhow::Result<HashMap<HostGroupId, String>>;
}

/// Expands macros in trigger names for display.
pub trait MacroResolver {
    fn trigger_name(&self, trigger: &TriggerRow) -> String;
}

/// Fallback resolver that returns descriptions untouched. Macro expansion is
/// the host application's concern.
pub struct PlainResolver;

impl MacroResolver for PlainResolver {
    fn trigger_name(&self, trigger: &TriggerRow) -> String {
        trigger.description.clone()
    }
}

/// Pixel dimensions of icon images, consumed by the area layout.
pub trait IconMetrics {
    fn icon_size(&self, icon: IconId) -> (u32, u32);
}

/// Fixed-size metrics used when no image backend is wired up.
pub struct DefaultIconMetrics;

/// Stock icon size of the default image set.
pub const DEFAULT_ICON_SIZE: (u32, u32) = (48, 48);

impl IconMetrics for DefaultIconMetrics {
    fn icon_size(&self, _icon: IconId) -> (u32, u32) {
        DEFAULT_ICON_SIZE
    }
}

/// Unwrap a datastore result, degrading to an empty value on failure.
pub(crate) fn or_empty<T: Default>(what: &str, result: anyhow::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("{what} lookup failed: {err:#}");
            T::default()
        }
    }
}

/// In-memory [`Datastore`], used by tests and map previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub maps: HashMap<MapId, Map>,
    pub hosts: HashMap<HostId, HostRow>,
    pub triggers: HashMap<TriggerId, TriggerRow>,
    pub item_applications: HashMap<ItemId, Vec<String>>,
    pub maintenances: HashMap<MaintenanceId, String>,
    pub icon_maps: HashMap<IconMapId, IconMap>,
    pub inventories: HashMap<HostId, HashMap<String, String>>,
    pub group_names: HashMap<HostGroupId, String>,
}

impl MemoryStore {
    pub fn insert_host(&mut self, host: HostRow) {
        self.hosts.insert(host.id, host);
    }

    pub fn insert_trigger(&mut self, trigger: TriggerRow) {
        self.triggers.insert(trigger.id, trigger);
    }

    pub fn insert_map(&mut self, map: Map) {
        if let Some(id) = map.id {
            self.maps.insert(id, map);
        }
    }
}

impl Datastore for MemoryStore {
    fn maps(&self, ids: &[MapId]) -> anyhow::Result<Vec<Map>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.maps.get(id).cloned())
            .collect())
    }

    fn hosts(&self, ids: &[HostId]) -> anyhow::Result<Vec<HostRow>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.hosts.get(id).cloned())
            .collect())
    }

    fn group_hosts(&self, groups: &[HostGroupId]) -> anyhow::Result<Vec<HostRow>> {
        let mut rows: Vec<HostRow> = self
            .hosts
            .values()
            .filter(|host| host.groups.iter().any(|g| groups.contains(g)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    fn triggers(&self, ids: &[TriggerId]) -> anyhow::Result<Vec<TriggerRow>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.triggers.get(id).cloned())
            .collect())
    }

    fn problem_triggers(&self, ids: &[TriggerId]) -> anyhow::Result<Vec<TriggerRow>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.triggers.get(id).cloned())
            .filter(|t| t.enabled && t.problem)
            .collect())
    }

    fn host_problem_triggers(&self, hosts: &[HostId]) -> anyhow::Result<Vec<TriggerRow>> {
        let mut rows: Vec<TriggerRow> = self
            .triggers
            .values()
            .filter(|t| t.enabled && t.problem && t.hosts.iter().any(|h| hosts.contains(h)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    fn item_applications(&self, items: &[ItemId]) -> anyhow::Result<HashMap<ItemId, Vec<String>>> {
        Ok(items
            .iter()
            .filter_map(|id| {
                self.item_applications
                    .get(id)
                    .map(|apps| (*id, apps.clone()))
            })
            .collect())
    }

    fn maintenance_name(&self, id: MaintenanceId) -> anyhow::Result<Option<String>> {
        Ok(self.maintenances.get(&id).cloned())
    }

    fn icon_map(&self, id: IconMapId) -> anyhow::Result<Option<IconMap>> {
        Ok(self.icon_maps.get(&id).cloned())
    }

    fn host_inventory(
        &self,
        hosts: &[HostId],
    ) -> anyhow::Result<HashMap<HostId, HashMap<String, String>>> {
        Ok(hosts
            .iter()
            .filter_map(|id| self.inventories.get(id).map(|inv| (*id, inv.clone())))
            .collect())
    }

    fn map_names(&self, ids: &[MapId]) -> anyhow::Result<HashMap<MapId, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.maps.get(id).map(|m| (*id, m.name.clone())))
            .collect())
    }

    fn group_names(&self, ids: &[HostGroupId]) -> anyhow::Result<HashMap<HostGroupId, String>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.group_names.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}
