//! ABOUTME: Route handler modules for the web API

pub mod auth;
pub mod profile;
