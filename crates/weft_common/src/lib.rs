//! Shared foundational types for the weft place-and-route engine.
//!
//! This crate provides the types every stage of the flow agrees on: interned
//! identifiers, delay scalars and corner bundles, frequency values, and the
//! checksum mixing primitives used by the design-state digest.

#![warn(missing_docs)]

pub mod delay;
pub mod frequency;
pub mod hash;
pub mod ident;

pub use delay::{Delay, DelayInfo};
pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::{xorshift32, Digest};
pub use ident::{Ident, InternError, Interner};
