//! Merge engine for furniture asset bundles
//!
//! Reconciles per-item raw render assets with per-variant metadata records
//! and writes one self-contained bundle per item.
//!
//! # Overview
//!
//! The engine consists of:
//! - **Index**: map metadata variant keys to their documents (built once)
//! - **Colors**: list an item's declared color variants
//! - **Matcher**: find the metadata document for a (classname, color) pair
//! - **Base**: pick the canonical record among matched variants
//! - **Assets**: locate icons and directional renders, copy them into place
//! - **Bundle**: assemble and write `data.json`
//! - **Parallel**: run every item on a worker pool and aggregate outcomes
//!
//! # Example
//!
//! ```ignore
//! use furnimerge::config::load_config;
//! use furnimerge::merge::{MergeContext, ParallelMerge};
//!
//! let config = load_config(None)?;
//! let context = MergeContext::new(config, project_root);
//! let report = ParallelMerge::new(context).run()?;
//! println!("{}", report.summary(false));
//! ```

pub mod assets;
pub mod base;
pub mod bundle;
pub mod claims;
pub mod colors;
pub mod context;
pub mod error;
pub mod index;
pub mod item;
pub mod matcher;
pub mod outcome;
pub mod parallel;
pub mod progress;
pub mod raw;
pub mod record;

pub use assets::*;
pub use base::*;
pub use bundle::*;
pub use claims::*;
pub use colors::*;
pub use context::*;
pub use error::*;
pub use index::*;
pub use item::*;
pub use matcher::*;
pub use outcome::*;
pub use parallel::*;
pub use progress::*;
pub use raw::*;
pub use record::{strip_color_suffix, MetadataRecord};
