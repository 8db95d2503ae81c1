//! Built-in language grammars.
//!
//! Each function builds a fresh [`Grammar`](crate::Grammar) from scratch.
//! Construction is cheap compared to tokenization; callers that want sharing
//! should go through [`Registry`](crate::Registry), which builds each grammar
//! once and caches it.

mod clike;
mod css;
mod javascript;
mod json;
mod markup;

pub use clike::clike;
pub use css::css;
pub use javascript::javascript;
pub use json::json;
pub use markup::markup;
