//! A small Rust client for Medidata Rave Web Services (RWS).
//!
//! This crate implements an `rwslib`-style flow: build an authenticated
//! connection for a Rave host, send pre-built request objects for the
//! operations you need, and optionally write the returned CSV/XML payloads
//! to disk.
//!
//! ## Quick start
//! - Configure credentials via environment variables (`RWS_SUBDOMAIN`,
//!   `RWS_USERNAME`, `RWS_PASSWORD`) or a `.rwsapirc` file (supported in the
//!   current directory and in your home directory).
//! - Call the operation methods on [`Connection`], or build a request from
//!   [`requests`] and pass it to [`Connection::send_request`].
//!
//! ```no_run
//! use anyhow::Result;
//! use rwsapi::Connection;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let conn = Connection::from_env()?;
//!
//!     // Studies are addressed as "PROJECT(ENVIRONMENT)".
//!     for form_oid in conn.forms("Mediflex(Dev)")? {
//!         println!("{form_oid}");
//!     }
//!
//!     conn.save_all_forms("Mediflex(Dev)", Path::new("extracts"))?;
//!     conn.save_odm_xml("Mediflex(Dev)", Path::new("extracts/Mediflex.xml"))?;
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod odm;
mod output;
pub mod requests;

pub use client::{Connection, ConnectionConfig};
pub use requests::{DatasetFormat, DatasetType};
