//! URL handling module for Book-Ingest
//!
//! This module provides link resolution against a page URL, listing page
//! addressing, and record identifier derivation from detail links.

mod identity;
mod resolve;

// Re-export main functions
pub use identity::{derive_record_id, fallback_record_id, record_id_from_url};
pub use resolve::{listing_page_url, parse_base, resolve_link};
