//! Endpoints and request resolution.
//!
//! This module provides:
//! - `EndpointCollection`: ordered endpoints, resolved by request path
//! - `Endpoint`: ordered response rules, resolved by request body
//! - `SharedCollection`: the reloadable snapshot held by the server
//!
//! ## Module Structure
//!
//! - `types`: `endpoint.json` definitions and `EndpointError`
//! - `matcher`: request matchers
//! - `core`: `Endpoint`, `ResponseRule` and `Resolution`
//! - `collection`: `EndpointCollection` and `SharedCollection`
//! - `loader`: reading endpoints from a configuration directory

mod collection;
mod core;
mod loader;
mod matcher;
mod types;


pub use collection::{EndpointCollection, SharedCollection};
pub use core::{Endpoint, Resolution, ResponseRule};
pub use loader::load_endpoint;
pub use matcher::RequestMatcher;
pub use types::{
    EndpointDefinition, EndpointError, MatchDefinition, ResponseDefinition, RuleDefinition,
    ENDPOINT_FILE,
};
