use std::sync::Arc;

use crate::repo::RsvpRepository;

/// Shared handler state, built once at startup.
pub struct AppState {
    /// Guest-list operations.
    pub repo: RsvpRepository,
    /// Expected `x-admin-password` header value.
    pub admin_password: String,
}

impl AppState {
    /// Wraps the repository and wipe secret for sharing across handlers.
    pub fn new(repo: RsvpRepository, admin_password: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            repo,
            admin_password: admin_password.into(),
        })
    }
}
