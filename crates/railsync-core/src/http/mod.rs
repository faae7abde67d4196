//! HTTP collaborator boundary
//!
//! This module owns everything at the edge of the network without
//! implementing HTTP semantics itself:
//! - `transport`: the `HttpTransport` trait the dispatcher talks to, plus
//!   the `reqwest`-backed default implementation
//! - `classify`: the single response/error classification pipeline
//! - `mock`: a recording transport for tests

pub mod classify;
pub mod mock;
pub mod transport;

pub use classify::classify_response;
pub use mock::MockTransport;
pub use transport::{HttpTransport, Method, ReqwestTransport, RestRequest, RestResponse, TransportError};
