//! odorok client library
//!
//! HTTP client for the odorok hiking-course service built around a
//! single-flight TTL response cache: repeated reads of the same endpoint within
//! a short window are served from memory, and concurrent reads share one
//! request.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod retry;
