//! Guild Auth Library
//!
//! Wallet-signature authentication for the guild web app: challenge issuance,
//! EIP-191 signature verification, replay protection and token issuance.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod time;
