//! CREASE Test Harness - Session simulation and scenario validation
//!
//! This crate provides:
//! - Recording and failing URL allocators
//! - A deterministic, clock-stepped session simulator
//! - End-to-end scenarios over the full workflow

pub mod allocators;
pub mod simulator;
pub mod integration;

pub use allocators::*;
pub use simulator::*;
pub use integration::*;
