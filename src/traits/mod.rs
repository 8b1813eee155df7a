//! Trait definitions for extensible components
//!
//! The charge store trait lets the service swap Redis for an in-memory map
//! (or a custom backend) without touching the lifecycle code.

pub mod store;
