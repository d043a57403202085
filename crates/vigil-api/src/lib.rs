// vigil-api: wire-level client for the Vigil hosted security platform
//
// Session management, endpoint failover, and the query surface. The
// domain layer lives in `vigil-core`; nothing here knows what a device
// snapshot means.

pub mod endpoints;
pub mod error;
pub mod executor;
pub mod models;
pub mod query;
pub mod session;
pub mod token_store;
pub mod transport;

pub use endpoints::EndpointSet;
pub use error::Error;
pub use executor::{ApiRequest, ApiResponse, RequestExecutor, RetryPolicy};
pub use session::{Credentials, Session, SessionManager, Validity};
pub use token_store::TokenStore;
pub use transport::TransportConfig;
