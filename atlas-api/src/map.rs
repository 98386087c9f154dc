//! Map definitions - canvas, elements, links and display options.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Color, Element, ElementId, ElementKind, IconMapId, LabelLocation, LinkId, MapId, TriggerId};

/// Line style of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkDraw {
    #[default]
    Line,
    Bold,
    Dashed,
    Dot,
}

/// A trigger attached to a link. While the trigger is in problem state it can
/// take over the link's color and line style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTrigger {
    pub trigger_id: TriggerId,
    pub color: Color,
    pub draw: LinkDraw,
}

/// A connector between two elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub from: ElementId,
    pub to: ElementId,
    /// Label text; may contain unexpanded macros.
    pub label: String,
    pub color: Color,
    pub draw: LinkDraw,
    pub triggers: Vec<LinkTrigger>,
}

impl Link {
    pub fn new(id: LinkId, from: ElementId, to: ElementId, color: Color) -> Self {
        Self {
            id,
            from,
            to,
            label: String::new(),
            color,
            draw: LinkDraw::default(),
            triggers: Vec::new(),
        }
    }
}

/// Which problems are surfaced on element icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProblemDisplay {
    /// Every problem, acknowledged or not.
    #[default]
    All,
    /// Only unacknowledged problems.
    Unacknowledged,
    /// Problem count and unacknowledged count as separate lines.
    Separated,
}

/// What an element label displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelKind {
    /// The element's own label text.
    Label,
    /// Host elements: primary interface address.
    IpAddress,
    /// The referenced object's display name.
    #[default]
    ElementName,
    /// Status text only.
    Status,
    Nothing,
}

/// Per-element-type label overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelOverrides {
    pub host: LabelKind,
    pub host_group: LabelKind,
    pub trigger: LabelKind,
    pub map: LabelKind,
    pub image: LabelKind,
}

/// Map-wide label configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelPolicy {
    pub default: LabelKind,
    /// When set, per-type kinds win over the map-wide default.
    pub overrides: Option<LabelOverrides>,
}

impl LabelPolicy {
    /// Effective label kind for an element of the given kind.
    pub fn for_kind(&self, kind: &ElementKind) -> LabelKind {
        match &self.overrides {
            None => self.default,
            Some(overrides) => match kind {
                ElementKind::Host(_) => overrides.host,
                ElementKind::HostGroup(_) => overrides.host_group,
                ElementKind::Trigger(_) => overrides.trigger,
                ElementKind::Map(_) => overrides.map,
                ElementKind::Image => overrides.image,
            },
        }
    }
}

/// A network status map definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    /// `None` for unsaved previews.
    pub id: Option<MapId>,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub label_location: LabelLocation,
    pub labels: LabelPolicy,
    /// Replace the "1 Problem" line with the trigger name when exactly one
    /// problem is present.
    pub expand_single_problem: bool,
    pub problem_display: ProblemDisplay,
    /// Draw severity highlight rings around problem icons.
    pub highlight: bool,
    pub icon_map: Option<IconMapId>,
    pub elements: IndexMap<ElementId, Element>,
    pub links: IndexMap<LinkId, Link>,
}

impl Map {
    pub fn new(id: Option<MapId>, width: u32, height: u32) -> Self {
        Self {
            id,
            name: String::new(),
            width,
            height,
            label_location: LabelLocation::default(),
            labels: LabelPolicy::default(),
            expand_single_problem: false,
            problem_display: ProblemDisplay::default(),
            highlight: true,
            icon_map: None,
            elements: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    pub fn insert_element(&mut self, element: Element) {
        self.elements.insert(element.id, element);
    }

    pub fn insert_link(&mut self, link: Link) {
        self.links.insert(link.id, link);
    }
}
