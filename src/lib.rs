//! furnimerge - Library for assembling furniture asset bundles
//!
//! This library provides functionality to:
//! - Index per-variant metadata records and match them to raw items
//! - Resolve icons, directional renders and offsets with fallback naming
//! - Write one deterministic `data.json` bundle per item, in parallel

pub mod cli;
pub mod config;
pub mod merge;
