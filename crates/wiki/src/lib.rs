//! Documentation source for save locations.
//!
//! Fetches wikitext pages from the community wiki (keyed by Steam AppID or
//! page title) and extracts the per-OS save path templates they embed.

pub mod client;
pub mod grammar;
pub mod source;
pub mod types;

pub use client::{Client, Error, is_app_id};
pub use grammar::{ParsedPage, parse_page};
pub use source::{BoxFuture, PageSource};
pub use types::{SaveLocations, TargetOs};
