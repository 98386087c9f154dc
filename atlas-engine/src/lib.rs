//! Atlas Engine - the map status computation core.
//!
//! Turns a map definition plus live monitoring data into per-element render
//! state:
//! - host-group areas expand into per-host elements
//! - nested maps are walked and their memberships indexed
//! - triggers inherited through hosts are filtered by application
//! - host and trigger state folds into per-element status and icon records
//! - area elements are placed on a grid and link styles are resolved
//!
//! The engine is synchronous and request-scoped: one call to
//! [`Engine::render_model`] reads everything it needs through the
//! [`Datastore`] seam and returns a fresh [`RenderModel`]. Nothing is cached
//! across calls, and collaborator failures degrade to empty data instead of
//! aborting the render.

pub mod datastore;
pub mod iconmap;
pub mod layout;
pub mod links;

mod config;
mod error;
mod expand;
mod filter;
mod resolve;
mod status;

pub use config::{EngineConfig, Palette};
pub use datastore::{
    Datastore, DefaultIconMetrics, IconMetrics, MacroResolver, MemoryStore, PlainResolver,
};
pub use error::EngineError;
pub use layout::Area;
pub use links::LinkStyle;

use std::collections::HashMap;

use atlas_api::{
    ElementId, ElementInfo, ElementKind, HostId, LabelKind, LinkId, Map, ProblemDisplay,
    Severity, TriggerId,
};
use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};

use crate::datastore::{TriggerRow, or_empty};
use crate::resolve::Resolved;

/// Per-render options.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Triggers below this severity are ignored. Inclusive.
    pub severity_min: Severity,
    /// Render timestamp; drives the lately-changed blink window.
    pub now: DateTime<Utc>,
}

impl RenderOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            severity_min: Severity::NotClassified,
            now,
        }
    }

    pub fn with_severity_min(mut self, severity_min: Severity) -> Self {
        self.severity_min = severity_min;
        self
    }
}

/// Everything the renderer and menu builder need for one map.
#[derive(Debug)]
pub struct RenderModel {
    /// Render state per element, in element order.
    pub info: IndexMap<ElementId, ElementInfo>,
    /// Hosts contributing to each element, after area expansion.
    pub element_hosts: IndexMap<ElementId, Vec<HostId>>,
    /// Triggers contributing to each element, after filtering.
    pub element_triggers: IndexMap<ElementId, Vec<TriggerId>>,
    /// Expanded host-group areas with their bounding geometry.
    pub areas: Vec<Area>,
    /// Resolved visual style per link.
    pub link_styles: IndexMap<LinkId, LinkStyle>,
}

/// The map status engine. Borrows its collaborators; owns only config.
pub struct Engine<'a> {
    store: &'a dyn Datastore,
    resolver: &'a dyn MacroResolver,
    metrics: &'a dyn IconMetrics,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(store: &'a dyn Datastore, config: EngineConfig) -> Self {
        Self {
            store,
            resolver: &PlainResolver,
            metrics: &DefaultIconMetrics,
            config,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn MacroResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_metrics(mut self, metrics: &'a dyn IconMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compute the render model for a map.
    ///
    /// Mutates the map: host-group areas are expanded into synthesized host
    /// elements with grid coordinates. Fails only on a cyclic nested-map
    /// reference.
    pub fn render_model(
        &self,
        map: &mut Map,
        options: &RenderOptions,
    ) -> Result<RenderModel, EngineError> {
        let areas = layout::populate_areas(self.store, map);
        let mut index = expand::index_map(self.store, map)?;
        let mut resolved = resolve::resolve(self.store, map, &mut index);

        let filters = filter::host_application_filters(map, &index, &resolved);
        filter::apply(self.store, &mut resolved, &index, &filters);

        let display = if self.config.ack_enabled {
            map.problem_display
        } else {
            ProblemDisplay::All
        };

        let icon_map = map
            .icon_map
            .and_then(|id| or_empty("icon map", self.store.icon_map(id)));
        let inventories = if icon_map.is_some() && !index.inventory_hosts.is_empty() {
            let ids: Vec<HostId> = index.inventory_hosts.iter().copied().collect();
            or_empty("host inventory", self.store.host_inventory(&ids))
        } else {
            HashMap::new()
        };

        let mut info: IndexMap<ElementId, ElementInfo> =
            IndexMap::with_capacity(map.elements.len());
        for (&element_id, element) in &map.elements {
            let summary = status::summarize(
                element,
                map,
                &resolved,
                self.store,
                self.resolver,
                &self.config,
                options,
            );
            let mut element_info =
                status::element_info(element, &summary, display, &self.config.palette);

            match &element.kind {
                ElementKind::Host(host) if host.use_icon_map => {
                    if let Some(icon_map) = &icon_map {
                        let empty = HashMap::new();
                        let inventory = inventories.get(&host.host_id).unwrap_or(&empty);
                        element_info.icon = iconmap::resolve(icon_map, inventory);
                    }
                }
                ElementKind::Trigger(trigger_id) => {
                    element_info.expression = resolved
                        .triggers
                        .get(trigger_id)
                        .map(|trigger| trigger.expression.clone());
                }
                _ => {}
            }

            info.insert(element_id, element_info);
        }

        self.resolve_names(map, &resolved, &mut info);
        layout::place_area_elements(map, &areas, &info, self.metrics);
        let link_styles = self.resolve_link_styles(map);

        Ok(RenderModel {
            info,
            element_hosts: resolved
                .element_hosts
                .into_iter()
                .map(|(id, hosts)| (id, hosts.into_iter().collect()))
                .collect(),
            element_triggers: resolved
                .element_triggers
                .into_iter()
                .map(|(id, triggers)| (id, triggers.into_iter().collect()))
                .collect(),
            areas,
            link_styles,
        })
    }

    /// Fill in display names for elements whose label policy wants them.
    fn resolve_names(
        &self,
        map: &Map,
        resolved: &Resolved,
        info: &mut IndexMap<ElementId, ElementInfo>,
    ) {
        let mut group_ids = Vec::new();
        let mut map_ids = Vec::new();
        for element in map.elements.values() {
            if map.labels.for_kind(&element.kind) != LabelKind::ElementName {
                continue;
            }
            match &element.kind {
                ElementKind::HostGroup(group) => group_ids.push(group.group_id),
                ElementKind::Map(map_id) => map_ids.push(*map_id),
                _ => {}
            }
        }

        let group_names = if group_ids.is_empty() {
            HashMap::new()
        } else {
            or_empty("group names", self.store.group_names(&group_ids))
        };
        let map_names = if map_ids.is_empty() {
            HashMap::new()
        } else {
            or_empty("map names", self.store.map_names(&map_ids))
        };

        for (element_id, element) in &map.elements {
            if map.labels.for_kind(&element.kind) != LabelKind::ElementName {
                continue;
            }
            let Some(entry) = info.get_mut(element_id) else {
                continue;
            };
            match &element.kind {
                ElementKind::Host(host) => {
                    entry.name = resolved
                        .hosts
                        .get(&host.host_id)
                        .map(|row| row.name.clone());
                }
                ElementKind::HostGroup(group) => {
                    entry.name = group_names.get(&group.group_id).cloned();
                }
                ElementKind::Map(map_id) => {
                    entry.name = map_names.get(map_id).cloned();
                }
                ElementKind::Trigger(trigger_id) => {
                    entry.name = resolved
                        .triggers
                        .get(trigger_id)
                        .map(|trigger| self.resolver.trigger_name(trigger));
                }
                // image elements are always named by their info record
                ElementKind::Image => {}
            }
        }
    }

    fn resolve_link_styles(&self, map: &Map) -> IndexMap<LinkId, LinkStyle> {
        let mut trigger_ids: IndexSet<TriggerId> = IndexSet::new();
        for link in map.links.values() {
            trigger_ids.extend(link.triggers.iter().map(|t| t.trigger_id));
        }

        let rows: IndexMap<TriggerId, TriggerRow> = if trigger_ids.is_empty() {
            IndexMap::new()
        } else {
            let ids: Vec<TriggerId> = trigger_ids.into_iter().collect();
            or_empty("link trigger", self.store.triggers(&ids))
                .into_iter()
                .map(|row| (row.id, row))
                .collect()
        };

        map.links
            .values()
            .map(|link| (link.id, links::resolve_style(link, &rows)))
            .collect()
    }
}
