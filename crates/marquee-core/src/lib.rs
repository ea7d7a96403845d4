//! Core types, store traits and the profile quota engine for Marquee.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement the traits in [`store`]; the API layer drives the services in
//! [`quota`], [`profiles`] and [`subscription`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod card;
pub mod error;
pub mod locks;
pub mod movie;
pub mod plan;
pub mod profile;
pub mod profiles;
pub mod quota;
pub mod store;
pub mod subscription;
pub mod user;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
