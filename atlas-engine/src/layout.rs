//! Host-group area layout.
//!
//! Areas are host-group elements rendered as one icon per member host. The
//! member elements are synthesized at render time, linked like the original
//! element, laid out in a square grid inside the area rectangle, and
//! discarded with the render.

use atlas_api::{
    AreaSize, Element, ElementId, ElementInfo, ElementKind, GroupPlacement, HostElement,
    LabelLocation, LinkId, Map,
};
use indexmap::IndexMap;

use crate::datastore::{Datastore, IconMetrics, or_empty};

/// Pixels between the area border and the outermost icon highlight rings.
const BORDER_OFFSET: f64 = 20.0;

/// Inset of the usable grid from the area rectangle.
const AREA_INSET: f64 = 5.0;

/// A host-group area expanded for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    /// The originating host-group element.
    pub origin: ElementId,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Synthesized host elements, in host-name order.
    pub elements: Vec<ElementId>,
}

/// Hands out fresh element and link ids for one render, starting past the
/// highest id the map already uses. Never collides by construction.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next_element: u64,
    next_link: u64,
}

impl IdAllocator {
    pub(crate) fn for_map(map: &Map) -> Self {
        let next_element = map.elements.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        let next_link = map.links.keys().map(|id| id.0).max().unwrap_or(0) + 1;
        Self {
            next_element,
            next_link,
        }
    }

    fn element_id(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        id
    }

    fn link_id(&mut self) -> LinkId {
        let id = LinkId(self.next_link);
        self.next_link += 1;
        id
    }
}

/// Expand every host-group area of a map into per-host elements.
///
/// Links touching the original area element are cloned to every synthesized
/// element; links between two areas are left alone. Groups without hosts are
/// skipped entirely.
pub(crate) fn populate_areas(store: &dyn Datastore, map: &mut Map) -> Vec<Area> {
    let mut allocator = IdAllocator::for_map(map);
    let mut areas = Vec::new();

    let area_ids: Vec<ElementId> = map
        .elements
        .values()
        .filter(|element| element.is_area())
        .map(|element| element.id)
        .collect();

    for origin_id in area_ids {
        let origin = map.elements[&origin_id].clone();
        let ElementKind::HostGroup(group) = &origin.kind else {
            continue;
        };
        let GroupPlacement::Area(size) = group.placement else {
            continue;
        };

        let mut hosts = or_empty("area hosts", store.group_hosts(&[group.group_id]));
        hosts.sort_by(|a, b| a.name.cmp(&b.name));
        if hosts.is_empty() {
            continue;
        }

        let mut area = match size {
            AreaSize::Custom { width, height } => Area {
                origin: origin_id,
                x: origin.x,
                y: origin.y,
                width,
                height,
                elements: Vec::new(),
            },
            AreaSize::WholeMap => Area {
                origin: origin_id,
                x: 0,
                y: 0,
                width: map.width,
                height: map.height,
                elements: Vec::new(),
            },
        };

        for host in hosts {
            let id = allocator.element_id();
            let mut synthesized = origin.clone();
            synthesized.id = id;
            synthesized.kind = ElementKind::Host(HostElement {
                host_id: host.id,
                application: group.application.clone(),
                use_icon_map: group.use_icon_map,
            });
            synthesized.from_area = Some(origin_id);
            map.insert_element(synthesized);
            area.elements.push(id);
        }

        let links: Vec<_> = map.links.values().cloned().collect();
        for link in links {
            // never multiply links between two areas
            let from_area = map.elements.get(&link.from).is_some_and(Element::is_area);
            let to_area = map.elements.get(&link.to).is_some_and(Element::is_area);
            if from_area && to_area {
                continue;
            }

            let replace_from = link.from == origin_id;
            let replace_to = link.to == origin_id;
            if !replace_from && !replace_to {
                continue;
            }

            for &element_id in &area.elements {
                let mut clone = link.clone();
                clone.id = allocator.link_id();
                if replace_from {
                    clone.from = element_id;
                } else {
                    clone.to = element_id;
                }
                map.insert_link(clone);
            }
        }

        areas.push(area);
    }

    areas
}

/// Place the synthesized elements of each area on a square grid inside the
/// area rectangle.
///
/// The grid has `ceil(sqrt(n))` columns; elements fill it left to right, top
/// to bottom. The first cell is offset by the resolved label location so
/// icon highlights stay inside the area.
pub(crate) fn place_area_elements(
    map: &mut Map,
    areas: &[Area],
    info: &IndexMap<ElementId, ElementInfo>,
    metrics: &dyn IconMetrics,
) {
    for area in areas {
        let columns = (area.elements.len() as f64).sqrt().ceil();

        let x = f64::from(area.x) + AREA_INSET;
        let y = f64::from(area.y) + AREA_INSET;
        let width = f64::from(area.width) - AREA_INSET;
        let height = f64::from(area.height) - AREA_INSET;

        let x_offset = (width / columns).floor();
        let y_offset = (height / columns).floor();

        let mut column = 0u32;
        let mut row = 0u32;
        for element_id in &area.elements {
            let Some(element) = map.elements.get(element_id) else {
                continue;
            };
            let icon = info
                .get(element_id)
                .map(|i| i.icon)
                .unwrap_or(element.icon_off);
            let (icon_w, icon_h) = metrics.icon_size(icon);
            let icon_w = f64::from(icon_w);
            let icon_h = f64::from(icon_h);

            let location = element.label_location.unwrap_or(map.label_location);
            let (base_x, base_y) = match location {
                LabelLocation::Top => (
                    x + x_offset / 2.0 - icon_w / 2.0,
                    y + y_offset
                        - icon_h
                        - if icon_h >= icon_w {
                            0.0
                        } else {
                            (icon_w - icon_h).abs() / 2.0
                        }
                        - BORDER_OFFSET,
                ),
                LabelLocation::Left => (
                    x + x_offset - icon_w - BORDER_OFFSET,
                    y + y_offset / 2.0 - icon_h / 2.0,
                ),
                LabelLocation::Right => (x + BORDER_OFFSET, y + y_offset / 2.0 - icon_h / 2.0),
                LabelLocation::Bottom => (
                    x + x_offset / 2.0 - icon_w / 2.0,
                    y + (icon_w - icon_h).abs() / 2.0 + BORDER_OFFSET,
                ),
            };

            if let Some(element) = map.elements.get_mut(element_id) {
                element.x = (base_x + f64::from(column) * x_offset) as i32;
                element.y = (base_y + f64::from(row) * y_offset) as i32;
            }

            column += 1;
            if f64::from(column) >= columns {
                column = 0;
                row += 1;
            }
        }
    }
}

/// Center of an element's icon, or of its area rectangle for area elements.
pub fn icon_center(
    element: &Element,
    info: &ElementInfo,
    map: &Map,
    metrics: &dyn IconMetrics,
) -> (f64, f64) {
    let (width, height) = match &element.kind {
        ElementKind::HostGroup(group) => match group.placement {
            GroupPlacement::Area(AreaSize::Custom { width, height }) => (width, height),
            GroupPlacement::Area(AreaSize::WholeMap) => (map.width, map.height),
            GroupPlacement::Single => metrics.icon_size(info.icon),
        },
        _ => metrics.icon_size(info.icon),
    };

    (
        f64::from(element.x) + f64::from(width) / 2.0,
        f64::from(element.y) + f64::from(height) / 2.0,
    )
}

/// Move a link endpoint from an area's center onto the area perimeter, in
/// the direction of the other endpoint.
pub fn area_link_anchor(
    ax: f64,
    ay: f64,
    width: f64,
    height: f64,
    x2: f64,
    y2: f64,
) -> (f64, f64) {
    let dx = (x2 - ax).abs();
    let dy = (y2 - ay).abs();
    let half_width = width / 2.0;
    let half_height = height / 2.0;

    if dy == 0.0 {
        let x = if x2 < ax { ax - half_width } else { ax + half_width };
        return (x, y2);
    }
    if dx == 0.0 {
        let y = if y2 > ay { ay + half_height } else { ay - half_height };
        return (x2, y);
    }

    let c = dx * (half_height / dy);
    if c < half_width {
        // crosses the top or bottom edge
        let y = if y2 > ay { ay + half_height } else { ay - half_height };
        let x = if x2 < ax { ax - c } else { ax + c };
        (x, y)
    } else {
        // crosses the left or right edge
        let c = dy * (half_width / dx);
        let y = if y2 > ay { ay + c } else { ay - c };
        let x = if x2 < ax { ax - half_width } else { ax + half_width };
        (x, y)
    }
}
