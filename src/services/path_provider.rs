use crate::models::{Path, PathRequest};

/// Computes the path the service hands back for a request.
///
/// Routing algorithms plug in here; the service itself only speaks the
/// protocol.
pub trait PathProvider: Send + Sync {
    fn path_between(&self, request: &PathRequest) -> Path;
}

/// Returns the straight line between the two endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineProvider;

impl PathProvider for StraightLineProvider {
    fn path_between(&self, request: &PathRequest) -> Path {
        Path::direct(request.source, request.target)
    }
}
