//! Authentication and session subsystem for Chirpy
//!
//! Signed access tokens, opaque refresh tokens, password hashing and
//! `Authorization` header parsing, composed by [`services::AuthService`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod telemetry;
