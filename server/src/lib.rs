//! Wayfarer API server
//!
//! Profiles, presence, friend and group invites, and city search over a
//! PostgreSQL (production) or SQLite (local, tests) database.

pub mod auth;
pub mod avatars;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod presence;
pub mod routing;
pub mod state;
