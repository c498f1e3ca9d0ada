mod client;
pub mod config;
mod errors;
pub mod lock;
pub mod notify;
mod refresh;
pub mod request;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::{Config, ConfigLocation};
pub use errors::{Error, ErrorKind, TransportSource};
pub use notify::{Notification, NotificationSink, Severity};
pub use request::{ApiRequest, ApiResponse, PreparedRequest, RequestBody};
pub use transport::{ReqwestTransport, Transport};
