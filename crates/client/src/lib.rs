//! `schoolops-client` — adapters from the component ports to a backend.
//!
//! [`HttpBackend`] talks to the REST service of record; [`InMemoryBackend`]
//! serves the same ports from process memory for tests and demos. Both
//! implement every port the components declare, plus
//! [`Authenticator`](schoolops_auth::Authenticator).

pub mod config;
pub mod http;
pub mod memory;
pub mod wire;

pub use config::ClientConfig;
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
