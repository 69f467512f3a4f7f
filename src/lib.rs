//! Invoice Store Library
//!
//! Relational storage for invoices and their line items: schema migrations,
//! a confirmed reset path, and a small repository layer over sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod reports;
pub mod repositories;
pub mod schema;
pub mod seed;

pub use errors::ServiceError;
