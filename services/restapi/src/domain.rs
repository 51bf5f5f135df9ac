// Domain layer modules
pub mod paged_response;
pub mod service_error;
pub mod throttle_setting;
pub mod user;

// Re-exports
pub use paged_response::PagedResponse;
pub use service_error::{ErrorBody, ServiceError};
pub use throttle_setting::ThrottleSetting;
pub use user::{Email, User, UserError};
