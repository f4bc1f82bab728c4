//! Extension traits for wire types.
//!
//! Accessor methods for the patterns every component repeats: pulling
//! domain, correlation ID, and root out of a cover; reading type URLs
//! and payloads off pages; computing next sequence numbers.

pub mod books;
pub mod constants;
pub mod cover;
pub mod pages;

pub use books::{next_sequence, CommandBookExt, EventBookExt};
pub use constants::{MAIN_EDITION, UNKNOWN_DOMAIN};
pub use cover::CoverExt;
pub use pages::{CommandPageExt, EventPageExt};
