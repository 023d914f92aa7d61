use tracing::debug;

use crate::models::{Coordinate, EndpointRole, LatLng, PathRequest, SyncError};

/// Current source and target positions.
///
/// Positions only change through [`EndpointState::move_endpoint`]; a rejected
/// move leaves both endpoints exactly as they were.
#[derive(Debug, Clone)]
pub struct EndpointState {
    source: Coordinate,
    target: Coordinate,
    source_dirty: bool,
    target_dirty: bool,
}

impl EndpointState {
    pub fn new(source: Coordinate, target: Coordinate) -> Self {
        Self {
            source,
            target,
            source_dirty: false,
            target_dirty: false,
        }
    }

    /// Record a new position for one endpoint and mark it dirty
    pub fn move_endpoint(&mut self, role: EndpointRole, position: LatLng) -> Result<Coordinate, SyncError> {
        let coordinate = Coordinate::try_from(position)?;

        match role {
            EndpointRole::Source => {
                self.source = coordinate;
                self.source_dirty = true;
            }
            EndpointRole::Target => {
                self.target = coordinate;
                self.target_dirty = true;
            }
        }

        debug!("Moved {} to {}", role, coordinate);
        Ok(coordinate)
    }

    /// (source, target) snapshot
    pub fn current_positions(&self) -> (Coordinate, Coordinate) {
        (self.source, self.target)
    }

    pub fn position(&self, role: EndpointRole) -> Coordinate {
        match role {
            EndpointRole::Source => self.source,
            EndpointRole::Target => self.target,
        }
    }

    pub fn is_dirty(&self, role: EndpointRole) -> bool {
        match role {
            EndpointRole::Source => self.source_dirty,
            EndpointRole::Target => self.target_dirty,
        }
    }

    /// Snapshot both endpoints into a request and clear the dirty flags
    pub fn take_request(&mut self) -> PathRequest {
        self.source_dirty = false;
        self.target_dirty = false;
        PathRequest::new(self.source, self.target)
    }
}
