#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod provider;
pub mod service;

pub use config::ServiceConfig;
pub use lifecycle::{Lifecycle, LifecyclePhase, ShutdownHandle};
pub use provider::HttpBlobStore;
pub use service::RelayService;
