//! Player Profile Aggregation API Library
//!
//! Fetches a player's profile from two independent upstream providers and
//! reconciles the overlapping, inconsistently named fields into one canonical
//! record served to the browser UI.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core reconciliation logic.
//! - `integrations`: Upstream provider integrations.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router assembly.
//! - `models`: Canonical profile and request models.
//! - `precedence`: Field-level provider precedence table.
//! - `providers`: Upstream provider client.
//! - `reconciler`: Multi-source reconciliation engine.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod precedence;
pub mod providers;
pub mod reconciler;
