//! Microsoft Graph access on behalf of the user of a single turn
//!
//! [`GraphClient`] is the HTTP plumbing bound to one delegated credential,
//! [`GraphAdapter`] exposes one method per semantic operation on top of it.
//! Adapter methods return `Ok(None)` when Graph has nothing to give back and
//! `Err` only when the call itself failed.
pub mod adapter;
pub mod client;
pub mod types;

pub use adapter::GraphAdapter;
pub use client::{DelegatedCredential, GraphClient, DEFAULT_GRAPH_ENDPOINT};
