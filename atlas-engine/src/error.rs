//! Engine error types.

use atlas_api::MapId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A map is reachable from itself through nested map elements. The
    /// definition is corrupt; rendering it would never terminate.
    #[error("cyclic map reference: map {0} is nested inside itself")]
    CyclicMapReference(MapId),
}
