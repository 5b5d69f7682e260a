//! Internal utilities for the Detent parameter-state framework.
//!
//! This crate holds low-level helpers shared by `detent-core` and plugin
//! crates. Everything here is `const fn` where possible so parameter tables
//! can be built as `static` data.
//!
//! # Contents
//!
//! - [`fnv1a_32`] - FNV-1a hash used to derive stable parameter IDs from names

pub mod hash;

pub use hash::fnv1a_32;
