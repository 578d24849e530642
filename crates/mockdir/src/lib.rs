//! mockdir: an HTTP mock server configured by a directory tree.
//!
//! Each endpoint directory declares a path pattern and ordered rules; a
//! request is answered by the first rule whose matcher accepts it, with a
//! body produced from literal text, a file, or a Rhai script. Test suites
//! replay canned requests and assert on the matcher, creator and body.

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod metrics;
pub mod observer;
pub mod request;
pub mod response;
pub mod scripting;
pub mod server;
pub mod testing;

pub use config::{ConfigError, ServerConfig};
pub use endpoint::{Endpoint, EndpointCollection, EndpointError, RequestMatcher, SharedCollection};
pub use observer::{NoOpObserver, ResponseLog, ResponseObserver, ResponseRecord};
pub use request::RequestInfo;
pub use response::{GenerationError, ResponseCreator};
pub use testing::{has_test_suite, load_test_suite, TestCase, TestCaseResult};
