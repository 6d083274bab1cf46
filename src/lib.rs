#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Architecture
//!
//! The crate is layered leaf-first:
//!
//! 1. [`token`] - structural validation and durable single-slot persistence
//!    of the bearer credential, tolerant of unavailable storage
//! 2. [`query`] - deterministic, canonical query-string encoding
//! 3. [`client`] - the [`ApiClient`] chokepoint: verb methods, push
//!    subscriptions, dual-channel error reporting
//! 4. [`config`] - runtime configuration and the lazily-initialized shared
//!    client instance
//!
//! Everything the UI or a tool sends to the CI server goes through the one
//! [`ApiClient`]; failures reach both a registered observer (for
//! cross-cutting reactions like a global sign-out) and the caller (for
//! local handling), carrying the same `{status, message}` pair.
//!
//! ## Module Structure
//!
//! - **[client]** - HTTP verbs, typed endpoints, push subscriptions
//! - **[config]** - `RuntimeConfig` and the `ClientContext` accessor
//! - **[error]** - error types and result handling
//! - **[query]** - canonical query-string encoding
//! - **[token]** - bearer token validation and persistence
//! - **[types]** - payload types exchanged with the server

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod token;
pub mod types;

pub use client::{ApiClient, ApiResponse, SubscribeOptions, Subscription};
pub use config::{ClientContext, RuntimeConfig};
pub use error::{ApiError, ClientError, Result};
pub use query::{encode_query_string, QueryValue};
pub use token::{is_valid_token, TokenStore};
