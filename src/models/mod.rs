//! Data models

pub mod auth;
pub mod user;
