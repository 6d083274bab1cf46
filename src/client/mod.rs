//! HTTP and push-channel client.
//!
//! This module is the outbound half of the crate: one [`ApiClient`] through
//! which every request and subscription flows, enforcing consistent auth,
//! CSRF, and error semantics.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch        - ApiClient and the shared request pipeline
//! ├── endpoints    - typed wrappers for the server's API surface
//! ├── events       - incremental server-sent-event frame parser
//! └── subscription - push-channel driver, reconnect, cancellation
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ApiClient`] | Request chokepoint holding server, token, CSRF, observer |
//! | [`ApiResponse`] | Decoded success body, JSON or text |
//! | [`Subscription`] | Live handle to an open push channel |
//! | [`SubscribeOptions`] | Per-subscription reconnect behavior |
//! | [`EventParser`] | Streaming frame parser behind subscriptions |

mod endpoints;
mod events;
mod fetch;
mod subscription;

pub use events::{EventParser, SseEvent, MESSAGE_EVENT};
pub use fetch::{ApiClient, ApiResponse};
pub use subscription::{SubscribeOptions, Subscription};
