//! Feedgrid app: widget registry, render loop, engine lifecycle, and
//! the C embedding boundary.
//!
//! Rust callers use [`engine::DashEngine`] directly; C callers go
//! through the functions in [`ffi`].

pub mod engine;
pub mod ffi;
pub mod runtime;
pub mod widget;
