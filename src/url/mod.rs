//! URL handling for pagegrep
//!
//! This module owns URL normalization (the identity key used for
//! deduplication) and the static ignore lists for hosts and asset types that
//! are never fetched.

mod ignore;
mod normalize;

pub use ignore::is_ignored;
pub use normalize::normalize_url;
