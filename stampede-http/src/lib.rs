//! HTTP transport for the Stampede dispatch/poll protocol
//!
//! [`HttpRemote`] talks to execution hosts that expose
//! `POST /executions` and `GET /executions/{id}`.

pub mod errors;
pub mod remote;

pub use errors::HttpError;
pub use remote::{DispatchResponse, HttpRemote};
