//! Identifier newtypes for the monitoring objects a map can reference.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Unique identifier of a map.
    MapId
);
id_type!(
    /// Unique identifier of an element placed on a map.
    ///
    /// Unique within one map; elements synthesized during a render get fresh
    /// ids past the highest persisted one.
    ElementId
);
id_type!(
    /// Unique identifier of a link between two map elements.
    LinkId
);
id_type!(
    /// Unique identifier of a monitored host.
    HostId
);
id_type!(
    /// Unique identifier of a host group.
    HostGroupId
);
id_type!(
    /// Unique identifier of a trigger.
    TriggerId
);
id_type!(
    /// Unique identifier of an item.
    ItemId
);
id_type!(
    /// Unique identifier of an icon image.
    IconId
);
id_type!(
    /// Unique identifier of an icon map.
    IconMapId
);
id_type!(
    /// Unique identifier of a maintenance window.
    MaintenanceId
);
