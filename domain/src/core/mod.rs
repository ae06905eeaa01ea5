//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] / [`error::ValidationError`]: domain-level errors
//! - [`string`]: text and money formatting helpers

pub mod error;
pub mod string;
