//! Foundation types shared by every other module.
//!
//! - [`FieldPath`], [`PathSegment`] - stable addresses into a field tree
//! - [`Vendor`] - the supported configuration targets
//! - [`constants`] - document format markers (attribute prefix, text key)
//!
//! This module has NO dependencies on other ddsconf modules.

pub mod constants;
mod path;
mod vendor;

pub use path::{FieldPath, PathSegment};
pub use vendor::Vendor;
