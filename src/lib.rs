pub mod api;
pub mod configuration;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod github;
pub mod schedule;
pub mod service;
pub mod startup;
pub mod store;

pub use configuration::Settings;
pub use error::{DispatchError, ManagementError, PersistenceError, ProviderError};
