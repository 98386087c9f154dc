//! Status aggregation and icon state selection.
//!
//! Folds the hosts and triggers contributing to an element into a
//! [`StatusSummary`], then picks the icon and status lines per element kind.
//! The precedence ladders differ: hosts let maintenance and disabled
//! override the icon even when a problem ring was chosen, host groups and
//! maps keep the problem ring and only add a status line, triggers and
//! images use simpler rules.

use atlas_api::{
    Element, ElementKind, ElementInfo, IconKind, InfoKind, InfoLine, Map, ProblemDisplay,
    Severity, StatusSummary,
};

use crate::RenderOptions;
use crate::config::{EngineConfig, Palette};
use crate::datastore::{Datastore, MacroResolver, or_empty};
use crate::resolve::Resolved;

/// Fold host and trigger state into one element's status summary.
pub(crate) fn summarize(
    element: &Element,
    map: &Map,
    resolved: &Resolved,
    store: &dyn Datastore,
    resolver: &dyn MacroResolver,
    config: &EngineConfig,
    options: &RenderOptions,
) -> StatusSummary {
    let mut summary = StatusSummary::default();

    let mut maintenance_host = None;
    if let Some(host_ids) = resolved.element_hosts.get(&element.id) {
        for host_id in host_ids {
            let Some(host) = resolved.hosts.get(host_id) else {
                continue;
            };
            if !host.monitored {
                summary.disabled_hosts += 1;
            } else if host.in_maintenance {
                summary.maintenance_hosts += 1;
                maintenance_host = Some(host);
            }
        }
    }

    let mut saw_event = false;
    let mut last_problem = None;
    if let Some(trigger_ids) = resolved.element_triggers.get(&element.id) {
        for trigger_id in trigger_ids {
            let Some(trigger) = resolved.triggers.get(trigger_id) else {
                continue;
            };
            if trigger.severity < options.severity_min {
                continue;
            }
            if !trigger.enabled {
                summary.triggers_disabled += 1;
                continue;
            }
            if trigger.problem {
                summary.problems += 1;
                last_problem = Some(trigger);
                if summary.severity < trigger.severity {
                    summary.severity = trigger.severity;
                }
                if let Some(event) = trigger.last_event {
                    if !event.acknowledged {
                        summary.problems_unack += 1;
                    }
                    saw_event = true;
                }
            }
            summary.lately_changed |=
                options.now - trigger.last_change < config.blink_window();
        }
    }

    // without events, problems cannot be unacknowledged; hide the marker
    summary.acknowledged = saw_event && summary.problems_unack == 0;

    if map.expand_single_problem && summary.problems == 1 {
        if let Some(trigger) = last_problem {
            summary.problem_title = Some(resolver.trigger_name(trigger));
        }
    }

    if matches!(element.kind, ElementKind::Host(_)) && summary.maintenance_hosts == 1 {
        if let Some(id) = maintenance_host.and_then(|host| host.maintenance) {
            summary.maintenance_title =
                or_empty("maintenance", store.maintenance_name(id));
        }
    }

    summary
}

/// Pick the icon and status lines for an element from its summary.
pub(crate) fn element_info(
    element: &Element,
    summary: &StatusSummary,
    display: ProblemDisplay,
    palette: &Palette,
) -> ElementInfo {
    match &element.kind {
        ElementKind::Host(_) => host_info(element, summary, display, palette),
        ElementKind::HostGroup(_) | ElementKind::Map(_) => {
            container_info(element, summary, display, palette)
        }
        ElementKind::Trigger(_) => trigger_info(element, summary, display, palette),
        ElementKind::Image => image_info(element, summary),
    }
}

fn base_info(element: &Element, summary: &StatusSummary) -> ElementInfo {
    ElementInfo {
        icon: element.icon(IconKind::Off),
        icon_kind: IconKind::Off,
        info: Vec::new(),
        name: None,
        severity: summary.severity,
        lately_changed: summary.lately_changed,
        acknowledged: summary.acknowledged,
        expression: None,
    }
}

fn problem_color(severity: Severity, palette: &Palette) -> atlas_api::Color {
    if severity > Severity::Average {
        palette.problem_high
    } else {
        palette.problem
    }
}

/// Problem and unacknowledged lines shared by host, host-group and map
/// elements. Empty when the display policy hides everything.
fn problem_lines(
    summary: &StatusSummary,
    display: ProblemDisplay,
    palette: &Palette,
) -> Vec<InfoLine> {
    let mut lines = Vec::new();
    if summary.problems == 0 {
        return lines;
    }

    if matches!(display, ProblemDisplay::All | ProblemDisplay::Separated) {
        let message = if summary.problems > 1 {
            format!("{} Problems", summary.problems)
        } else if let Some(title) = &summary.problem_title {
            title.clone()
        } else {
            "1 Problem".to_string()
        };
        lines.push(InfoLine::new(
            InfoKind::Problem,
            message,
            problem_color(summary.severity, palette),
        ));
    }

    if matches!(
        display,
        ProblemDisplay::Unacknowledged | ProblemDisplay::Separated
    ) && summary.problems_unack > 0
    {
        lines.push(InfoLine::new(
            InfoKind::Unacknowledged,
            format!("{} Unacknowledged", summary.problems_unack),
            palette.problem,
        ));
    }

    lines
}

fn host_info(
    element: &Element,
    summary: &StatusSummary,
    display: ProblemDisplay,
    palette: &Palette,
) -> ElementInfo {
    let mut info = base_info(element, summary);

    info.info = problem_lines(summary, display, palette);
    let has_problem = !info.info.is_empty();
    if has_problem {
        info.icon = element.icon(IconKind::On);
        info.icon_kind = IconKind::On;
    }

    if summary.maintenance_hosts > 0 {
        info.icon = element.icon(IconKind::Maintenance);
        info.icon_kind = IconKind::Maintenance;
        let message = match &summary.maintenance_title {
            Some(title) => format!("MAINTENANCE ({title})"),
            None => "MAINTENANCE".to_string(),
        };
        info.info
            .push(InfoLine::new(InfoKind::Maintenance, message, palette.maintenance));
    } else if summary.disabled_hosts > 0 {
        info.icon = element.icon(IconKind::Disabled);
        info.icon_kind = IconKind::Disabled;
        info.info
            .push(InfoLine::new(InfoKind::Disabled, "DISABLED", palette.problem));
    } else if !has_problem {
        info.info
            .push(InfoLine::new(InfoKind::Ok, "OK", palette.ok));
    }

    info
}

/// Host-group and map elements: the problem ring survives a maintenance or
/// disabled status, which only adds its own line.
fn container_info(
    element: &Element,
    summary: &StatusSummary,
    display: ProblemDisplay,
    palette: &Palette,
) -> ElementInfo {
    let mut info = base_info(element, summary);

    info.info = problem_lines(summary, display, palette);
    let has_problem = !info.info.is_empty();
    if has_problem {
        info.icon = element.icon(IconKind::On);
        info.icon_kind = IconKind::On;
    }

    let mut has_status = false;
    if summary.maintenance_hosts > 0 {
        if !has_problem {
            info.icon = element.icon(IconKind::Maintenance);
            info.icon_kind = IconKind::Maintenance;
        }
        info.info.push(InfoLine::new(
            InfoKind::Maintenance,
            format!("{} Maintenance", summary.maintenance_hosts),
            palette.maintenance,
        ));
        has_status = true;
    } else if summary.disabled_hosts > 0 {
        if !has_problem {
            info.icon = element.icon(IconKind::Disabled);
            info.icon_kind = IconKind::Disabled;
        }
        info.info
            .push(InfoLine::new(InfoKind::Disabled, "DISABLED", palette.problem));
        has_status = true;
    }

    if !has_status && !has_problem {
        info.info.push(InfoLine::new(InfoKind::Ok, "OK", palette.ok));
    }

    info
}

fn trigger_info(
    element: &Element,
    summary: &StatusSummary,
    display: ProblemDisplay,
    palette: &Palette,
) -> ElementInfo {
    let mut info = base_info(element, summary);

    let unack_shown =
        display == ProblemDisplay::Unacknowledged && summary.problems_unack > 0;
    let all_shown = matches!(display, ProblemDisplay::All | ProblemDisplay::Separated);

    if summary.problems > 0 && (unack_shown || all_shown) {
        info.icon = element.icon(IconKind::On);
        info.icon_kind = IconKind::On;
        info.info.push(InfoLine::new(
            InfoKind::Problem,
            "PROBLEM",
            problem_color(summary.severity, palette),
        ));
    } else if summary.triggers_disabled > 0 {
        info.icon = element.icon(IconKind::Disabled);
        info.icon_kind = IconKind::Disabled;
        info.info
            .push(InfoLine::new(InfoKind::Disabled, "DISABLED", palette.problem));
    } else {
        info.info.push(InfoLine::new(InfoKind::Ok, "OK", palette.ok));
    }

    info
}

fn image_info(element: &Element, summary: &StatusSummary) -> ElementInfo {
    let mut info = base_info(element, summary);
    info.name = Some("Image".to_string());
    info.lately_changed = false;
    info.acknowledged = true;
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_api::{
        Color, ElementId, HostElement, HostId, IconId, MaintenanceId, MapId, TriggerId,
    };
    use chrono::{TimeZone, Utc};
    use indexmap::IndexSet;

    use crate::datastore::{HostRow, MemoryStore, PlainResolver, TriggerRow};

    fn options() -> RenderOptions {
        RenderOptions::new(Utc.with_ymd_and_hms(2016, 5, 1, 12, 0, 0).unwrap())
    }

    fn host_element() -> Element {
        Element::new(
            ElementId(1),
            ElementKind::Host(HostElement::new(HostId(1))),
            0,
            0,
            IconId(1),
        )
    }

    struct Fixture {
        store: MemoryStore,
        map: Map,
        resolved: Resolved,
        config: EngineConfig,
    }

    impl Fixture {
        fn new(element: &Element) -> Self {
            let mut map = Map::new(Some(MapId(1)), 800, 600);
            map.insert_element(element.clone());
            let mut resolved = Resolved::default();
            resolved.element_hosts.insert(element.id, IndexSet::new());
            resolved
                .element_triggers
                .insert(element.id, IndexSet::new());
            Self {
                store: MemoryStore::default(),
                map,
                resolved,
                config: EngineConfig::default(),
            }
        }

        fn add_host(&mut self, element: ElementId, host: HostRow) {
            self.resolved.element_hosts[&element].insert(host.id);
            self.resolved.hosts.insert(host.id, host);
        }

        fn add_trigger(&mut self, element: ElementId, trigger: TriggerRow) {
            self.resolved.element_triggers[&element].insert(trigger.id);
            self.resolved.triggers.insert(trigger.id, trigger);
        }

        fn summarize(&self, element: &Element, options: &RenderOptions) -> StatusSummary {
            summarize(
                element,
                &self.map,
                &self.resolved,
                &self.store,
                &PlainResolver,
                &self.config,
                options,
            )
        }
    }

    #[test]
    fn test_single_problem_host() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::Average).with_problem(),
        );

        let summary = fixture.summarize(&element, &options());
        assert_eq!(summary.problems, 1);
        assert_eq!(summary.severity, Severity::Average);
        assert_eq!(summary.disabled_hosts, 0);
        assert_eq!(summary.maintenance_hosts, 0);

        let palette = Palette::default();
        let info = element_info(&element, &summary, ProblemDisplay::All, &palette);
        assert_eq!(info.icon_kind, IconKind::On);
        let line = info.line(InfoKind::Problem).unwrap();
        assert_eq!(line.message, "1 Problem");
        // at Average and below the problem line uses the dark shade
        assert_eq!(line.color, Color::new(0x96, 0x00, 0x00));
    }

    #[test]
    fn test_high_severity_uses_bright_problem_color() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High).with_problem(),
        );

        let summary = fixture.summarize(&element, &options());
        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        let line = info.line(InfoKind::Problem).unwrap();
        assert_eq!(line.color, Color::new(0xFF, 0x00, 0x00));
    }

    #[test]
    fn test_host_maintenance_overrides_icon_but_keeps_problem_line() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(
            element.id,
            HostRow::new(HostId(1), "web-1").in_maintenance(MaintenanceId(5)),
        );
        fixture
            .store
            .maintenances
            .insert(MaintenanceId(5), "Weekend window".to_string());
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High).with_problem(),
        );

        let summary = fixture.summarize(&element, &options());
        assert_eq!(summary.maintenance_hosts, 1);
        assert_eq!(summary.maintenance_title.as_deref(), Some("Weekend window"));

        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon_kind, IconKind::Maintenance);
        assert!(info.line(InfoKind::Problem).is_some());
        let line = info.line(InfoKind::Maintenance).unwrap();
        assert_eq!(line.message, "MAINTENANCE (Weekend window)");
    }

    #[test]
    fn test_host_disabled_and_maintenance_are_exclusive() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        // an unmonitored host never counts as in maintenance
        fixture.add_host(
            element.id,
            HostRow::new(HostId(1), "web-1")
                .in_maintenance(MaintenanceId(5))
                .unmonitored(),
        );

        let summary = fixture.summarize(&element, &options());
        assert_eq!(summary.disabled_hosts, 1);
        assert_eq!(summary.maintenance_hosts, 0);
        assert!(summary.disabled_hosts + summary.maintenance_hosts <= 1);

        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon_kind, IconKind::Disabled);
        assert_eq!(info.line(InfoKind::Disabled).unwrap().message, "DISABLED");
    }

    #[test]
    fn test_severity_floor_is_inclusive() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::Warning).with_problem(),
        );
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(2), Severity::Information).with_problem(),
        );

        let mut opts = options();
        opts.severity_min = Severity::Warning;
        let summary = fixture.summarize(&element, &opts);
        assert_eq!(summary.problems, 1);
        assert_eq!(summary.severity, Severity::Warning);
    }

    #[test]
    fn test_acknowledged_requires_an_event() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High).with_problem(),
        );

        // no event at all: not acknowledged
        let summary = fixture.summarize(&element, &options());
        assert!(!summary.acknowledged);

        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_problem()
                .with_event(true),
        );
        let summary = fixture.summarize(&element, &options());
        assert!(summary.acknowledged);
        assert_eq!(summary.problems_unack, 0);

        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_problem()
                .with_event(false),
        );
        let summary = fixture.summarize(&element, &options());
        assert!(!summary.acknowledged);
        assert_eq!(summary.problems_unack, 1);
    }

    #[test]
    fn test_lately_changed_within_blink_window() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        let opts = options();

        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_last_change(opts.now - chrono::Duration::seconds(60)),
        );
        let summary = fixture.summarize(&element, &opts);
        assert!(summary.lately_changed);

        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_last_change(opts.now - chrono::Duration::seconds(7200)),
        );
        let summary = fixture.summarize(&element, &opts);
        assert!(!summary.lately_changed);
    }

    #[test]
    fn test_expand_single_problem_title() {
        let element = host_element();
        let mut fixture = Fixture::new(&element);
        fixture.map.expand_single_problem = true;
        fixture.add_host(element.id, HostRow::new(HostId(1), "web-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_problem()
                .with_description("Load too high on web-1"),
        );

        let summary = fixture.summarize(&element, &options());
        assert_eq!(
            summary.problem_title.as_deref(),
            Some("Load too high on web-1")
        );

        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(
            info.line(InfoKind::Problem).unwrap().message,
            "Load too high on web-1"
        );
    }

    #[test]
    fn test_disabled_trigger_element() {
        let element = Element::new(
            ElementId(1),
            ElementKind::Trigger(TriggerId(1)),
            0,
            0,
            IconId(1),
        );
        let mut fixture = Fixture::new(&element);
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_problem()
                .disabled(),
        );

        let summary = fixture.summarize(&element, &options());
        assert_eq!(summary.problems, 0);
        assert_eq!(summary.triggers_disabled, 1);

        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon_kind, IconKind::Disabled);
        assert!(info.line(InfoKind::Problem).is_none());
        assert_eq!(info.line(InfoKind::Disabled).unwrap().message, "DISABLED");
    }

    #[test]
    fn test_trigger_element_problem_line() {
        let element = Element::new(
            ElementId(1),
            ElementKind::Trigger(TriggerId(1)),
            0,
            0,
            IconId(1),
        );
        let mut fixture = Fixture::new(&element);
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::Disaster).with_problem(),
        );

        let summary = fixture.summarize(&element, &options());
        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon_kind, IconKind::On);
        let line = info.line(InfoKind::Problem).unwrap();
        assert_eq!(line.message, "PROBLEM");
        assert_eq!(line.color, Color::new(0xFF, 0x00, 0x00));
    }

    #[test]
    fn test_trigger_element_unack_policy_hides_acknowledged_problem() {
        let element = Element::new(
            ElementId(1),
            ElementKind::Trigger(TriggerId(1)),
            0,
            0,
            IconId(1),
        );
        let mut fixture = Fixture::new(&element);
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High)
                .with_problem()
                .with_event(true),
        );

        let summary = fixture.summarize(&element, &options());
        let info = element_info(
            &element,
            &summary,
            ProblemDisplay::Unacknowledged,
            &Palette::default(),
        );
        assert_eq!(info.icon_kind, IconKind::Off);
        assert!(info.line(InfoKind::Problem).is_none());
        assert_eq!(info.line(InfoKind::Ok).unwrap().message, "OK");
    }

    #[test]
    fn test_container_keeps_problem_ring_with_maintenance_line() {
        let element = Element::new(
            ElementId(1),
            ElementKind::Map(MapId(2)),
            0,
            0,
            IconId(1),
        );
        let mut fixture = Fixture::new(&element);
        fixture.add_host(
            element.id,
            HostRow::new(HostId(1), "web-1").in_maintenance(MaintenanceId(5)),
        );
        fixture.add_host(element.id, HostRow::new(HostId(2), "db-1"));
        fixture.add_trigger(
            element.id,
            TriggerRow::new(TriggerId(1), Severity::High).with_problem(),
        );

        let summary = fixture.summarize(&element, &options());
        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        // the ring shows the problem; maintenance only contributes a line
        assert_eq!(info.icon_kind, IconKind::On);
        assert_eq!(
            info.line(InfoKind::Maintenance).unwrap().message,
            "1 Maintenance"
        );
        assert!(info.line(InfoKind::Ok).is_none());
    }

    #[test]
    fn test_container_ok_when_idle() {
        let element = Element::new(
            ElementId(1),
            ElementKind::Map(MapId(2)),
            0,
            0,
            IconId(1),
        );
        let fixture = Fixture::new(&element);
        let summary = fixture.summarize(&element, &options());
        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon_kind, IconKind::Off);
        assert_eq!(info.line(InfoKind::Ok).unwrap().message, "OK");
    }

    #[test]
    fn test_image_element_is_static() {
        let element = Element::new(ElementId(1), ElementKind::Image, 0, 0, IconId(9));
        let fixture = Fixture::new(&element);
        let summary = fixture.summarize(&element, &options());
        let info = element_info(&element, &summary, ProblemDisplay::All, &Palette::default());
        assert_eq!(info.icon, IconId(9));
        assert_eq!(info.icon_kind, IconKind::Off);
        assert_eq!(info.name.as_deref(), Some("Image"));
        assert!(!info.lately_changed);
        assert!(info.info.is_empty());
    }
}
