//! Endpoint handlers.

pub mod params;
pub mod ping;
pub mod root;
pub mod shrink;

pub use params::{parse_params, ShrinkParams};
pub use ping::ping;
pub use root::{not_found, root};
pub use shrink::shrink;
