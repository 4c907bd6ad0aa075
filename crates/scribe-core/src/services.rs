//! External service seam for I/O-bound built-ins
//!
//! `WEATHER`, `DISTANCE` and `ROUTE` reach outside the process. The engine
//! never talks to providers directly; the host hands an [`ExternalServices`]
//! implementation to the context builder and the evaluator awaits it under
//! its own timeout ceiling.

use futures::future::{self, BoxFuture, FutureExt};

use crate::value::Value;

/// Error returned by an external service call
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl ServiceError {
    /// Create a new service error with a message
    pub fn new<S: Into<String>>(msg: S) -> Self {
        ServiceError(msg.into())
    }
}

/// Future returned by every service call
pub type ServiceFuture<'a> = BoxFuture<'a, Result<Value, ServiceError>>;

/// Host-supplied providers for the I/O-bound contextual functions.
///
/// Implementations must be cheap to share: the context holds them behind an
/// `Arc` and concurrent evaluations may call them simultaneously.
pub trait ExternalServices: Send + Sync {
    /// Current weather for a location, as a provider-defined value
    fn weather<'a>(&'a self, location: &'a str) -> ServiceFuture<'a>;

    /// Distance between two locations, in kilometers
    fn distance<'a>(&'a self, from: &'a str, to: &'a str) -> ServiceFuture<'a>;

    /// Route summary between two locations
    fn route<'a>(&'a self, from: &'a str, to: &'a str) -> ServiceFuture<'a>;
}

/// Default provider that fails every call.
///
/// Used when the host builds a context without configuring services, so the
/// contextual functions degrade to a runtime error instead of hanging.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoServices;

impl ExternalServices for NoServices {
    fn weather<'a>(&'a self, _location: &'a str) -> ServiceFuture<'a> {
        future::ready(Err(ServiceError::new("no weather provider configured"))).boxed()
    }

    fn distance<'a>(&'a self, _from: &'a str, _to: &'a str) -> ServiceFuture<'a> {
        future::ready(Err(ServiceError::new("no distance provider configured"))).boxed()
    }

    fn route<'a>(&'a self, _from: &'a str, _to: &'a str) -> ServiceFuture<'a> {
        future::ready(Err(ServiceError::new("no route provider configured"))).boxed()
    }
}
