//! Map elements - the typed objects placed on a map canvas.

use serde::{Deserialize, Serialize};

use crate::{ElementId, HostGroupId, HostId, IconId, IconKind, MapId, TriggerId};

/// Where an element's label is drawn, relative to its icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelLocation {
    #[default]
    Bottom,
    Left,
    Right,
    Top,
}

/// Size of a host-group area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaSize {
    /// The area covers the whole map canvas.
    WholeMap,
    /// A fixed rectangle anchored at the element position.
    Custom { width: u32, height: u32 },
}

/// How a host-group element is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupPlacement {
    /// One icon for the whole group.
    Single,
    /// One icon per member host, laid out inside an area.
    Area(AreaSize),
}

/// Payload of a host element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostElement {
    pub host_id: HostId,
    /// Application filter: only triggers with at least one item in this
    /// application count towards the element status. `None` means no filter.
    pub application: Option<String>,
    /// Pick the icon through the map's icon map, from host inventory.
    pub use_icon_map: bool,
}

impl HostElement {
    pub fn new(host_id: HostId) -> Self {
        Self {
            host_id,
            application: None,
            use_icon_map: false,
        }
    }
}

/// Payload of a host-group element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupElement {
    pub group_id: HostGroupId,
    /// Application filter applied to every host of the group. `None` means
    /// no filter.
    pub application: Option<String>,
    /// Carried over to the hosts synthesized from an area.
    pub use_icon_map: bool,
    pub placement: GroupPlacement,
}

impl GroupElement {
    pub fn new(group_id: HostGroupId) -> Self {
        Self {
            group_id,
            application: None,
            use_icon_map: false,
            placement: GroupPlacement::Single,
        }
    }
}

/// What an element refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Host(HostElement),
    HostGroup(GroupElement),
    Trigger(TriggerId),
    Map(MapId),
    Image,
}

/// An element placed on a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Label text; may contain unexpanded macros.
    pub label: String,
    /// `None` inherits the map-wide label location.
    pub label_location: Option<LabelLocation>,
    pub x: i32,
    pub y: i32,
    pub icon_off: IconId,
    pub icon_on: Option<IconId>,
    pub icon_maintenance: Option<IconId>,
    pub icon_disabled: Option<IconId>,
    /// Set on elements synthesized from a host-group area; points back at the
    /// originating area element.
    pub from_area: Option<ElementId>,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind, x: i32, y: i32, icon_off: IconId) -> Self {
        Self {
            id,
            kind,
            label: String::new(),
            label_location: None,
            x,
            y,
            icon_off,
            icon_on: None,
            icon_maintenance: None,
            icon_disabled: None,
            from_area: None,
        }
    }

    /// Icon for a state. States without an explicit icon fall back to the
    /// "off" icon.
    pub fn icon(&self, kind: IconKind) -> IconId {
        match kind {
            IconKind::Off => self.icon_off,
            IconKind::On => self.icon_on.unwrap_or(self.icon_off),
            IconKind::Maintenance => self.icon_maintenance.unwrap_or(self.icon_off),
            IconKind::Disabled => self.icon_disabled.unwrap_or(self.icon_off),
        }
    }

    /// True for host-group elements displayed as an area.
    pub fn is_area(&self) -> bool {
        matches!(
            &self.kind,
            ElementKind::HostGroup(group) if matches!(group.placement, GroupPlacement::Area(_))
        )
    }

    /// Application filter declared on this element, if any.
    pub fn application(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Host(host) => host.application.as_deref(),
            ElementKind::HostGroup(group) => group.application.as_deref(),
            ElementKind::Trigger(_) | ElementKind::Map(_) | ElementKind::Image => None,
        }
    }
}
