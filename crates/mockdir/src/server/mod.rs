//! HTTP hosting for a configuration directory.
//!
//! - `mock_server`: accept loop and dispatch between mock and admin paths
//! - `state`: the shared snapshot, script runtime and response log
//! - `handler`: mock request handling
//! - `router`: admin API under `/__mockdir`
//! - `types`: response helpers, header names and JSON views

mod handler;
mod mock_server;
mod router;
mod state;
mod types;

pub use mock_server::MockServer;
pub use state::ServerState;
pub use types::{
    decode_identity, encode_identity, EndpointSummary, RuleSummary, ADMIN_PREFIX, CREATOR_HEADER,
    ENDPOINT_HEADER, ERROR_HEADER, MATCHER_HEADER,
};
