//! Catalog admin SDK: typed client stores for the catalog administration REST
//! API, plus an in-memory backend that speaks the same protocol.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod notify;
pub mod pagination;
pub mod resource;
pub mod response;
pub mod store;

pub use auth::{Credentials, FileTokenStore, MemoryTokenStore, Session, TokenPair, TokenStore, UserProfile};
pub use catalog::Catalog;
pub use config::{load as load_config, ClientConfig};
pub use error::{ClientError, ConfigError};
pub use http::{ApiClient, Payload, Upload};
pub use mock::{MockConfig, MockServer};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use pagination::{FilterValue, PageRequest, PaginationOptions, Paginator, TablePagination};
pub use resource::{Identified, Resource};
pub use response::PaginatedResponse;
pub use store::ResourceStore;
