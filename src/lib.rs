mod error;
mod grammar;
mod pattern;
mod registry;
mod token;
mod tokenizer;

pub mod languages;
pub mod renderers;

pub use error::Error;
pub use grammar::{Grammar, Rule};
pub use registry::{PLAIN_GRAMMAR_NAME, Registry};
pub use renderers::html::HtmlRenderer;
pub use token::{CompositeToken, LeafToken, Token, flatten};
pub use tokenizer::{Tokenization, tokenize, tokenize_checked};
