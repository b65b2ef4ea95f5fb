//! Response bodies for the read-only pages API
//!
//! `GET /pages/{page}?authenticated=true` returns a
//! [`DispatchPlan`](crate::dispatch::DispatchPlan):
//!
//! ```json
//! {
//!   "page": "mail",
//!   "authenticated": true,
//!   "handlers": [
//!     { "name": "load_user_data", "source": "core", "requires_login": false },
//!     { "name": "load_imap_folders", "source": "imap_folders", "requires_login": true }
//!   ],
//!   "outputs": [
//!     { "name": "header_start", "source": "core", "requires_login": false }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub handler_pages: usize,
    pub output_pages: usize,
    pub version: String,
}
