//! Domain types shared with the wider bot framework.
//!
//! The adapters are generic over the update type; this is the default.

/// Telegram `Update` as modelled by teloxide.
pub use teloxide::types::Update;
