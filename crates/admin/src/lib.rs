//! Storedesk Admin library.
//!
//! This crate provides the admin console as a library, allowing it to be
//! tested end to end and reused by the operator CLI.
//!
//! # Security
//!
//! The console acts on the hosted table API with the signed-in admin's
//! access token. What an admin may read or change is decided by the
//! backend's row-level policies; `ADMIN_REQUIRE_ADMIN_ROLE` additionally
//! refuses sign-in to users without the `admin` role.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
