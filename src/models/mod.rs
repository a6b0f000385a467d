//! Request and Response models for the admission API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::VerifyRequest;
pub use responses::{
    ErrorResponse, HealthResponse, InvalidationResponse, MeResponse, RateLimitStatusResponse,
    ResetResponse, VerifyResponse,
};
