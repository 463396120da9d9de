//! Authenticated webhook relay that asks an upstream OAuth-protected service to refresh its
//! access token and reports the outcome back to the caller.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod obs;
pub mod refresh;
pub mod server;
pub mod upstream;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
// The binary reports startup failures through color-eyre.
use color_eyre as _;
#[cfg(test)] use httpmock as _;
