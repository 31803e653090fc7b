//! Core utilities for SpecQL.
//!
//! This crate provides foundational types used throughout specql:
//! - `location`: Byte spans, line/column positions, and the span-to-location
//!   map
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod location;

pub use diagnostics::{codes, Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use location::{LineMap, Location, Span};
