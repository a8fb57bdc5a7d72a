//! # CineVault Client
//!
//! The session layer a CineVault frontend embeds: an HTTP client for the
//! API, a durable on-disk session cache, and a [`context::SessionContext`]
//! that owns the authenticated-user state and answers access-guard queries.
//!
//! There is exactly one source of truth for "who is logged in": the
//! context. The durable cache is a serialization detail of its `init`/`set`
//! lifecycle and is never read around it.
//!
//! ## Modules
//!
//! - `api`: reqwest-based client for the CineVault API
//! - `store`: durable session cache (user + token, cleared together)
//! - `context`: the session context and its guard integration

pub mod api;
pub mod context;
pub mod store;
