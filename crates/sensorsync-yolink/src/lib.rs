//! YoLink vendor client for sensorsync.
//!
//! [`YoLinkConnection`] implements [`SensorConnection`] over the YoLink open
//! API. Bearer tokens are kept fresh by a [`TokenManager`], which decides
//! between reuse, refresh and reissue on every request.
//!
//! [`SensorConnection`]: sensorsync_core::sensor::SensorConnection

#![allow(async_fn_in_trait)]

mod connection;
mod flatten;

pub mod error;
pub mod packet;
pub mod token;

pub use connection::{
  BRAND, DEFAULT_API_URL, DEFAULT_TOKEN_URL, HTTP_TIMEOUT, YoLinkConfig, YoLinkConnection,
  parse_state,
};
pub use error::{Error, Result};
pub use flatten::flatten;
pub use token::{HttpTokenEndpoint, TokenAction, TokenEndpoint, TokenGrant, TokenManager};

#[cfg(test)]
mod tests;
