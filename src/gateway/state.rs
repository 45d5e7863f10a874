use std::sync::Arc;

use crate::auth::AuthKeys;
use crate::service::{OperationService, UserService};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub operations: Arc<OperationService>,
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    pub fn new(
        users: Arc<UserService>,
        operations: Arc<OperationService>,
        auth: Arc<AuthKeys>,
    ) -> Self {
        Self {
            users,
            operations,
            auth,
        }
    }
}
