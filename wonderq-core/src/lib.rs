//! Core types for WonderQ
//!
//! This crate provides the identifier and wire error types shared by the
//! queue engine, its HTTP handlers and the server binary.

pub mod error;
pub mod id;

pub use error::{ApiError, ErrorCode};
pub use id::MessageId;
