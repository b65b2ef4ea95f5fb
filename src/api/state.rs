use std::sync::Arc;

use crate::dispatch::PageAssignments;

#[derive(Clone)]
pub struct AppState {
    pub assignments: Arc<PageAssignments>,
}

impl AppState {
    pub fn new(assignments: PageAssignments) -> Self {
        Self {
            assignments: Arc::new(assignments),
        }
    }
}
