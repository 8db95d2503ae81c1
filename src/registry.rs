use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, SpettroResult};
use crate::grammar::Grammar;
use crate::languages;
use crate::token::Token;
use crate::tokenizer::{Tokenization, tokenize, tokenize_checked};

/// The fallback grammar name. It has no rules, so everything stays plain text.
pub const PLAIN_GRAMMAR_NAME: &str = "plain";

type GrammarLoader = fn() -> SpettroResult<Grammar>;

const LOADERS: &[(&str, GrammarLoader)] = &[
    ("clike", languages::clike),
    ("css", languages::css),
    ("javascript", languages::javascript),
    ("json", languages::json),
    ("markup", languages::markup),
];

const ALIASES: &[(&str, &str)] = &[
    ("atom", "markup"),
    ("html", "markup"),
    ("js", "javascript"),
    ("rss", "markup"),
    ("ssml", "markup"),
    ("svg", "markup"),
    ("text", "plain"),
    ("txt", "plain"),
    ("xml", "markup"),
];

/// Holds every known grammar and hands out shared, lazily built instances.
///
/// Building a grammar is pure construction work and validation; it happens at
/// most once per registry, on first request. The cache is concurrent, so a
/// registry can be shared across threads behind a plain reference.
pub struct Registry {
    loaders: HashMap<&'static str, GrammarLoader>,
    aliases: HashMap<&'static str, &'static str>,
    cache: papaya::HashMap<String, Arc<Grammar>>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Registry {
    /// A registry preloaded with the built-in languages and their aliases.
    pub fn new() -> Registry {
        Registry {
            loaders: LOADERS.iter().copied().collect(),
            aliases: ALIASES.iter().copied().collect(),
            cache: papaya::HashMap::new(),
        }
    }

    /// Adds a custom grammar under `name`, validating its patterns first.
    /// Replaces any grammar previously registered under that name.
    pub fn register(&self, name: &str, grammar: Grammar) -> SpettroResult<()> {
        grammar.validate()?;
        self.cache.pin().insert(name.to_string(), Arc::new(grammar));
        Ok(())
    }

    fn resolve<'a>(&self, name: &'a str) -> &'a str {
        self.aliases.get(name).copied().unwrap_or(name)
    }

    /// Whether `name` (or an alias of it) is known to this registry.
    pub fn contains(&self, name: &str) -> bool {
        let name = self.resolve(name);
        name == PLAIN_GRAMMAR_NAME
            || self.loaders.contains_key(name)
            || self.cache.pin().contains_key(name)
    }

    /// Looks up the grammar for `name`, building and caching it on first use.
    pub fn grammar(&self, name: &str) -> SpettroResult<Arc<Grammar>> {
        let name = self.resolve(name);
        let cache = self.cache.pin();
        if let Some(grammar) = cache.get(name) {
            return Ok(grammar.clone());
        }

        let grammar = match self.loaders.get(name) {
            Some(loader) => loader()?,
            None if name == PLAIN_GRAMMAR_NAME => Grammar::new(),
            None => return Err(Error::GrammarNotFound(name.to_string())),
        };
        grammar.validate()?;

        log::debug!("[registry] built grammar '{name}' ({} entries)", grammar.len());
        // under a race the first insert wins and everyone shares it
        Ok(cache
            .get_or_insert(name.to_string(), Arc::new(grammar))
            .clone())
    }

    /// Tokenizes `text` with the named grammar.
    pub fn tokenize(&self, name: &str, text: &str) -> SpettroResult<Vec<Token>> {
        let grammar = self.grammar(name)?;
        Ok(tokenize(text, &grammar))
    }

    /// Like [`tokenize`](Registry::tokenize), but also reports whether the
    /// runaway guard truncated the result.
    pub fn tokenize_checked(&self, name: &str, text: &str) -> SpettroResult<Tokenization> {
        let grammar = self.grammar(name)?;
        Ok(tokenize_checked(text, &grammar))
    }

    /// The names of all registered grammars, sorted, aliases not included.
    pub fn grammar_names(&self) -> Vec<String> {
        let cache = self.cache.pin();
        let mut names: Vec<String> = self
            .loaders
            .keys()
            .map(|name| name.to_string())
            .chain(
                cache
                    .keys()
                    .filter(|name| !self.loaders.contains_key(name.as_str()))
                    .cloned(),
            )
            .collect();
        names.push(PLAIN_GRAMMAR_NAME.to_string());
        names.sort();
        names.dedup();
        names
    }
}
