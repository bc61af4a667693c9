mod admin;
mod error_handler;
mod quota;

pub use admin::require_admin;
pub use error_handler::log_errors;
pub use quota::{QUOTA_REMAINING_HEADER, quota_gate};
