// Infrastructure layer modules
pub mod config;
pub mod logging;
pub mod user_repository;

// Re-exports
pub use config::{ConfigError, Environment, ServiceConfig};
pub use logging::{init_cli_logging, init_logging};
#[cfg(test)]
pub use logging::init_test_logging;
pub use user_repository::{RepositoryError, StubUserRepository, UserRepository};
