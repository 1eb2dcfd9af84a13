//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - String hashing for resource ids
//! - Math types
//! - Fixed-step time management
//! - Logging utilities

pub mod id;
pub mod math;
pub mod time;
pub mod logging;
