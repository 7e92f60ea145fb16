use crate::location::LocationResolver;

/// Shared by every request. The resolver synchronises its own cache.
pub struct AppState {
    pub resolver: LocationResolver,
}

impl AppState {
    pub fn new(resolver: LocationResolver) -> Self {
        Self { resolver }
    }
}
