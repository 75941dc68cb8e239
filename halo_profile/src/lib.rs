//! ABOUTME: Profile cache-aside service
//! ABOUTME: Orchestrates the cache adapter and the pooled store client

mod service;

pub use service::{ProfileService, UpdateProfileRequest};
