use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Error, SpettroResult};
use crate::pattern::Regex;

/// A single match rule: a regular expression plus the flags steering how the
/// tokenizer applies it.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    lookbehind: bool,
    greedy: bool,
    aliases: Vec<String>,
    inside: Option<Box<Grammar>>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>) -> Rule {
        Rule {
            pattern: Regex::new(pattern.into()),
            lookbehind: false,
            greedy: false,
            aliases: Vec::new(),
            inside: None,
        }
    }

    /// Marks the pattern's first capture group as a context prefix that is
    /// stripped from the reported match.
    pub fn lookbehind(mut self) -> Rule {
        self.lookbehind = true;
        self
    }

    /// Allows the match to span across multiple not-yet-matched fragments.
    pub fn greedy(mut self) -> Rule {
        self.greedy = true;
        self
    }

    /// Attaches an extra name to tokens produced by this rule.
    pub fn alias(mut self, name: &str) -> Rule {
        self.aliases.push(name.to_string());
        self
    }

    /// Sets a nested grammar; the matched region is recursively tokenized
    /// through it, producing a composite token.
    pub fn inside(mut self, grammar: Grammar) -> Rule {
        self.inside = Some(Box::new(grammar));
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_lookbehind(&self) -> bool {
        self.lookbehind
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn nested(&self) -> Option<&Grammar> {
        self.inside.as_deref()
    }

    /// Construction-time access to the nested grammar, for grammars that wire
    /// up shared rule sets after the fact.
    pub fn nested_mut(&mut self) -> Option<&mut Grammar> {
        self.inside.as_deref_mut()
    }

    pub fn set_nested(&mut self, grammar: Grammar) {
        self.inside = Some(Box::new(grammar));
    }

    fn validate(&self) -> SpettroResult<()> {
        self.pattern.validate()?;
        if let Some(inside) = &self.inside {
            inside.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Slot {
    rules: Vec<Rule>,
    // Priority bookkeeping: entries iterate by ascending `order`, and
    // `prev_order` is the lower boundary available to insert_before
    prev_order: f64,
    order: f64,
}

/// A resolved `(name, rules)` entry the tokenizer iterates over.
#[derive(Debug, Clone)]
pub(crate) struct GrammarEntry {
    pub(crate) name: String,
    pub(crate) rules: Vec<Rule>,
}

/// An ordered map from token-type name to match rules.
///
/// Rule priority is load-bearing: earlier entries win ties, so the map keeps
/// an explicit order that survives replacement and supports splicing a whole
/// rule set immediately before an existing key. Grammars are built once,
/// then treated as immutable shared configuration by the tokenizer.
#[derive(Debug, Default)]
pub struct Grammar {
    slots: HashMap<String, Slot>,
    count: u32,
    reset: Option<Box<Grammar>>,
    resolved: OnceLock<Vec<GrammarEntry>>,
}

impl Clone for Grammar {
    fn clone(&self) -> Self {
        // Clones are taken during construction; drop any resolved snapshot
        Grammar {
            slots: self.slots.clone(),
            count: self.count,
            reset: self.reset.clone(),
            resolved: OnceLock::new(),
        }
    }
}

fn place(slots: &mut HashMap<String, Slot>, count: &mut u32, key: &str, rules: Vec<Rule>) {
    let slot = match slots.get(key) {
        // Replacing keeps the ordering slot the key already had
        Some(old) => Slot {
            rules,
            prev_order: old.prev_order,
            order: old.order,
        },
        None => {
            let prev_order = *count as f64;
            *count += 1;
            Slot {
                rules,
                prev_order,
                order: *count as f64,
            }
        }
    };
    slots.insert(key.to_string(), slot);
}

impl Grammar {
    pub fn new() -> Grammar {
        Grammar::default()
    }

    /// Inserts or replaces the rule list for `key`. A replaced key keeps its
    /// priority slot; a new key is appended after everything else.
    pub fn set(&mut self, key: &str, rules: Vec<Rule>) {
        place(&mut self.slots, &mut self.count, key, rules);
    }

    pub fn get(&self, key: &str) -> Option<&[Rule]> {
        self.slots.get(key).map(|slot| slot.rules.as_slice())
    }

    /// Construction-time access to a rule list, e.g. to append a rule to an
    /// inherited entry without disturbing its priority slot.
    pub fn rules_mut(&mut self, key: &str) -> Option<&mut Vec<Rule>> {
        self.slots.get_mut(key).map(|slot| &mut slot.rules)
    }

    pub fn remove(&mut self, key: &str) {
        self.slots.remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Merges every entry of `other` into this grammar with order values
    /// interpolated immediately before `key`'s slot, overwriting entries with
    /// colliding names. The target's lower boundary moves down to the last
    /// inserted value so repeated inserts before the same key keep nesting.
    pub fn insert_before(&mut self, key: &str, other: Grammar) -> SpettroResult<()> {
        let (prev_order, order) = {
            let target = self
                .slots
                .get(key)
                .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
            (target.prev_order, target.order)
        };

        let increment = (order - prev_order) / (other.len() + 1) as f64;
        let mut new_order = prev_order;

        for (name, rules) in other.into_entries() {
            let prev = new_order;
            new_order += increment;
            self.slots.insert(
                name,
                Slot {
                    rules,
                    prev_order: prev,
                    order: new_order,
                },
            );
        }

        if let Some(target) = self.slots.get_mut(key) {
            target.prev_order = new_order;
        }
        Ok(())
    }

    /// Iterates entries in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        let mut entries: Vec<(&str, &Slot)> = self
            .slots
            .iter()
            .map(|(name, slot)| (name.as_str(), slot))
            .collect();
        entries.sort_by(|a, b| a.1.order.total_cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .map(|(name, slot)| (name, slot.rules.as_slice()))
    }

    /// Returns a copy of this grammar with `overrides` applied through the
    /// normal `set` path: colliding keys are replaced in place, new keys are
    /// appended. This is how derived language grammars are built.
    pub fn extend(&self, overrides: Grammar) -> Grammar {
        let mut extended = self.clone();
        for (name, rules) in overrides.into_entries() {
            extended.set(&name, rules);
        }
        extended
    }

    /// Attaches a grammar that will be appended to this one the first time it
    /// is used for tokenization. This lets a grammar close over rule sets
    /// that only exist once its recursive partner grammar is fully built.
    pub fn set_reset(&mut self, grammar: Grammar) {
        self.reset = Some(Box::new(grammar));
    }

    /// Checks every pattern in the grammar, including nested and reset
    /// grammars. Malformed patterns are a construction-time failure.
    pub fn validate(&self) -> SpettroResult<()> {
        for slot in self.slots.values() {
            for rule in &slot.rules {
                rule.validate()?;
            }
        }
        if let Some(reset) = &self.reset {
            reset.validate()?;
        }
        Ok(())
    }

    /// The entry list the tokenizer iterates: sorted by priority, with the
    /// reset grammar merged in. Computed once per grammar instance; afterwards
    /// concurrent tokenization calls share the snapshot.
    pub(crate) fn resolved(&self) -> &[GrammarEntry] {
        self.resolved.get_or_init(|| {
            let mut slots = self.slots.clone();
            let mut count = self.count;

            if let Some(reset) = &self.reset {
                for (name, rules) in reset.cloned_entries() {
                    place(&mut slots, &mut count, &name, rules);
                }
            }

            let mut entries: Vec<(String, Slot)> = slots.into_iter().collect();
            entries.sort_by(|a, b| a.1.order.total_cmp(&b.1.order).then_with(|| a.0.cmp(&b.0)));
            entries
                .into_iter()
                .map(|(name, slot)| GrammarEntry {
                    name,
                    rules: slot.rules,
                })
                .collect()
        })
    }

    fn into_entries(self) -> Vec<(String, Vec<Rule>)> {
        let mut entries: Vec<(String, Slot)> = self.slots.into_iter().collect();
        entries.sort_by(|a, b| a.1.order.total_cmp(&b.1.order).then_with(|| a.0.cmp(&b.0)));
        entries
            .into_iter()
            .map(|(name, slot)| (name, slot.rules))
            .collect()
    }

    fn cloned_entries(&self) -> Vec<(String, Vec<Rule>)> {
        self.iter()
            .map(|(name, rules)| (name.to_string(), rules.to_vec()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(grammar: &Grammar) -> Vec<String> {
        grammar.iter().map(|(name, _)| name.to_string()).collect()
    }

    #[test]
    fn keys_iterate_in_declaration_order() {
        let mut grammar = Grammar::new();
        grammar.set("hello", vec![Rule::new("a")]);
        grammar.set("foo", vec![Rule::new("b")]);
        grammar.set("bar", vec![Rule::new("c")]);
        assert_eq!(keys(&grammar), ["hello", "foo", "bar"]);
    }

    #[test]
    fn insert_before_splices_at_the_target() {
        let mut grammar = Grammar::new();
        grammar.set("hello", vec![Rule::new("a")]);
        grammar.set("foo", vec![Rule::new("b")]);

        let mut inserted = Grammar::new();
        inserted.set("world", vec![Rule::new("c")]);
        grammar.insert_before("foo", inserted).unwrap();

        assert_eq!(keys(&grammar), ["hello", "world", "foo"]);
    }

    #[test]
    fn repeated_inserts_before_the_same_key_nest() {
        let mut grammar = Grammar::new();
        grammar.set("hello", vec![Rule::new("a")]);
        grammar.set("foo", vec![Rule::new("b")]);

        let mut first = Grammar::new();
        first.set("world", vec![Rule::new("c")]);
        grammar.insert_before("foo", first).unwrap();

        let mut second = Grammar::new();
        second.set("later", vec![Rule::new("d")]);
        grammar.insert_before("foo", second).unwrap();

        assert_eq!(keys(&grammar), ["hello", "world", "later", "foo"]);
    }

    #[test]
    fn insert_before_unknown_key_errors() {
        let mut grammar = Grammar::new();
        grammar.set("hello", vec![Rule::new("a")]);

        let mut inserted = Grammar::new();
        inserted.set("world", vec![Rule::new("b")]);
        let err = grammar.insert_before("missing", inserted).unwrap_err();
        assert!(matches!(err, Error::UnknownKey(key) if key == "missing"));
    }

    #[test]
    fn replacing_a_key_keeps_its_slot() {
        let mut grammar = Grammar::new();
        grammar.set("first", vec![Rule::new("a")]);
        grammar.set("second", vec![Rule::new("b")]);
        grammar.set("first", vec![Rule::new("z"), Rule::new("y")]);

        assert_eq!(keys(&grammar), ["first", "second"]);
        assert_eq!(grammar.get("first").unwrap().len(), 2);
    }

    #[test]
    fn remove_drops_the_key() {
        let mut grammar = Grammar::new();
        grammar.set("first", vec![Rule::new("a")]);
        grammar.set("second", vec![Rule::new("b")]);
        grammar.remove("first");
        assert_eq!(keys(&grammar), ["second"]);
    }

    #[test]
    fn extend_replaces_in_place_and_appends() {
        let mut base = Grammar::new();
        base.set("comment", vec![Rule::new("a")]);
        base.set("keyword", vec![Rule::new("b")]);

        let mut overrides = Grammar::new();
        overrides.set("keyword", vec![Rule::new("c")]);
        overrides.set("operator", vec![Rule::new("d")]);

        let derived = base.extend(overrides);
        assert_eq!(keys(&derived), ["comment", "keyword", "operator"]);
        // The base grammar is untouched
        assert_eq!(keys(&base), ["comment", "keyword"]);
    }

    #[test]
    fn reset_entries_are_appended_on_resolution() {
        let mut grammar = Grammar::new();
        grammar.set("one", vec![Rule::new("a")]);

        let mut reset = Grammar::new();
        reset.set("two", vec![Rule::new("b")]);
        reset.set("one", vec![Rule::new("c"), Rule::new("d")]);
        grammar.set_reset(reset);

        let resolved: Vec<&str> = grammar.resolved().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(resolved, ["one", "two"]);
        // The colliding entry was overwritten but kept its slot
        assert_eq!(grammar.resolved()[0].rules.len(), 2);
        // The construction-time view is unchanged
        assert_eq!(keys(&grammar), ["one"]);
    }

    #[test]
    fn validation_flags_bad_patterns() {
        let mut grammar = Grammar::new();
        grammar.set("ok", vec![Rule::new(r"\d+")]);
        assert!(grammar.validate().is_ok());

        grammar.set("broken", vec![Rule::new("(unclosed")]);
        assert!(matches!(
            grammar.validate(),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
