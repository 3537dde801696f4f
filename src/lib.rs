//! a11yscan - screenshot-based WCAG accessibility scanner
//!
//! Captures a page screenshot through a tiered set of browser backends,
//! has a vision model list WCAG 2.1 issues, and scores them per
//! principle. See [`pipeline::Pipeline`] for the end-to-end flow.

pub mod capture;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod retry;
pub mod scoring;
pub mod steplog;
