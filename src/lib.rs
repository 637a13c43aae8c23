pub mod config;
pub mod container;
pub mod dispatcher;
pub mod exception;
pub mod middleware;
pub mod param;
pub mod pattern;
pub mod request;
pub mod response;
pub mod route;

pub use config::Config;
pub use container::{instance, Arguments, Component, Container, Dependency, Instance};
pub use dispatcher::{Dispatcher, Outcome};
pub use exception::Exception;
pub use middleware::{Middleware, MiddlewareCatalog, MiddlewareRegistry};
pub use pattern::{Params, PathPattern};
pub use request::Request;
pub use response::Response;
pub use route::{normalize_uri, RouteDefinition, RouteTable};
