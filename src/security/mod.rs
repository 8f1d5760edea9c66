//! Security utilities

pub mod xss;

pub use xss::{contains_xss_patterns, decode_html, encode_html, sanitize_text};
