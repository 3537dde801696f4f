//! WCAG 2.1 AA Compliance Scoring
//!
//! Turns an unordered list of flagged issues into per-principle scores,
//! an overall score and a conformance level. Pure and deterministic.
//!
//! # Scoring Formula
//!
//! ```text
//! Principle = max(0, 100 - Σ severity_weight)   (issues classified into it)
//! Overall   = (Perceivable + Operable + Understandable + Robust) / 4   (integer division)
//! ```
//!
//! # Severity Weights
//!
//! - Critical: 20
//! - Major: 10
//! - Minor: 4 (also used for unrecognized severities)
//! - Info: 1
//!
//! # Conformance Levels
//!
//! - `>= 90` AAA - Enhanced
//! - `>= 75` AA - Conformant
//! - `>= 55` AA - Partially Conformant
//! - otherwise A - Partially Conformant
//!
//! Issues whose WCAG id matches no principle are "unclassified": counted in
//! the totals, deducted from nothing.

mod wcag;

pub use wcag::{classify, score, PRINCIPLE_CRITERIA};
