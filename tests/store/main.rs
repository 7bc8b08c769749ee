//! Integration tests for Layer 1: Store
//!
//! Tests for entity lifecycle and the attribute world.

mod entities;
mod world;
