//! `polling` repeats a protocol request on a timer and reports only what changed.
//!
//! [`PollingService`] owns the timer and the subscribers, a [`types::PollingSource`] decides
//! what to fetch and how a response changes the observed state. Two sources ship here:
//!
//! - [`AuthorizationsSource`], the pending authorizations of every active connection
//! - [`SingleAuthorizationSource`], one authorization until it reaches a final status
pub mod types;

mod service;
pub use service::{PollingController, PollingService};

mod authorizations;
pub use authorizations::{AuthorizationEvent, AuthorizationsSource};

mod single;
pub use single::{SingleAuthorizationEvent, SingleAuthorizationSource};
