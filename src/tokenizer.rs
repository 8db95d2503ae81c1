use crate::grammar::{Grammar, GrammarEntry};
use crate::pattern::{MatchResult, match_pattern, slice};
use crate::token::Token;

const HEAD: usize = 0;
const TAIL: usize = 1;

/// The mutable token sequence the engine scans and splices.
///
/// An arena of nodes linked by indices, with head/tail sentinels so fragments
/// can be spliced in and out without shifting positions. Removed nodes stay in
/// the arena unlinked; the arena lives only for the duration of one tokenize
/// call.
struct TokenChain {
    nodes: Vec<ChainNode>,
    live: usize,
}

struct ChainNode {
    prev: usize,
    next: usize,
    token: Option<Token>,
}

impl TokenChain {
    fn new(text: &str) -> TokenChain {
        let mut chain = TokenChain {
            nodes: vec![
                ChainNode {
                    prev: HEAD,
                    next: TAIL,
                    token: None,
                },
                ChainNode {
                    prev: HEAD,
                    next: TAIL,
                    token: None,
                },
            ],
            live: 0,
        };
        chain.insert_after(HEAD, Token::text(text));
        chain
    }

    fn next(&self, node: usize) -> usize {
        self.nodes[node].next
    }

    fn prev(&self, node: usize) -> usize {
        self.nodes[node].prev
    }

    /// The token at `node`, `None` for the sentinels.
    fn get(&self, node: usize) -> Option<&Token> {
        self.nodes[node].token.as_ref()
    }

    fn live(&self) -> usize {
        self.live
    }

    fn insert_after(&mut self, node: usize, token: Token) -> usize {
        let inserted = self.nodes.len();
        let next = self.nodes[node].next;
        self.nodes.push(ChainNode {
            prev: node,
            next,
            token: Some(token),
        });
        self.nodes[node].next = inserted;
        self.nodes[next].prev = inserted;
        self.live += 1;
        inserted
    }

    /// Unlinks up to `count` nodes following `node`; `node` itself and the
    /// tail sentinel stay put.
    fn remove_after(&mut self, node: usize, count: usize) {
        for _ in 0..count {
            let victim = self.nodes[node].next;
            if victim == TAIL {
                break;
            }
            let next = self.nodes[victim].next;
            self.nodes[node].next = next;
            self.nodes[next].prev = node;
            self.nodes[victim].token = None;
            self.live -= 1;
        }
    }

    fn into_tokens(mut self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.live);
        let mut cursor = self.nodes[HEAD].next;
        while cursor != TAIL {
            if let Some(token) = self.nodes[cursor].token.take() {
                tokens.push(token);
            }
            cursor = self.nodes[cursor].next;
        }
        tokens
    }
}

/// State of a bounded rematch pass over a region a greedy match invalidated.
struct Rematch {
    /// The (entry, rule) that triggered the pass; skipped while it runs so a
    /// greedy rule cannot recursively rematch itself
    cause: (usize, usize),
    /// Furthest absolute position already reconciled; the pass never scans
    /// at or past it
    reach: usize,
}

/// The result of [`tokenize_checked`].
#[derive(Debug, Clone, PartialEq)]
pub struct Tokenization {
    pub tokens: Vec<Token>,
    /// Whether the runaway-match guard stopped tokenization early, leaving a
    /// best-effort tree that may only cover a prefix of the input
    pub truncated: bool,
}

/// Tokenizes `text` against `grammar`, producing the token tree.
///
/// Deterministic for a given (text, grammar) pair. The grammar's reset merge,
/// if any, is applied on its first use and consumed; nothing else is mutated.
pub fn tokenize(text: &str, grammar: &Grammar) -> Vec<Token> {
    tokenize_checked(text, grammar).tokens
}

/// Like [`tokenize`], but reports whether the defensive runaway guard cut
/// tokenization short (including inside nested grammars).
pub fn tokenize_checked(text: &str, grammar: &Grammar) -> Tokenization {
    if text.is_empty() {
        return Tokenization {
            tokens: vec![Token::text("")],
            truncated: false,
        };
    }

    let entries = grammar.resolved();
    let mut chain = TokenChain::new(text);
    let mut truncated = false;

    match_grammar(text, &mut chain, entries, HEAD, 0, None, &mut truncated);

    Tokenization {
        tokens: chain.into_tokens(),
        truncated,
    }
}

/// One full pass of every rule over the live token sequence, starting just
/// after `start_node` at absolute position `start_pos`. `rematch` bounds a
/// nested pass triggered by a multi-node greedy match.
fn match_grammar(
    text: &str,
    chain: &mut TokenChain,
    entries: &[GrammarEntry],
    start_node: usize,
    start_pos: usize,
    mut rematch: Option<&mut Rematch>,
    truncated: &mut bool,
) {
    for (entry_index, entry) in entries.iter().enumerate() {
        for (rule_index, rule) in entry.rules.iter().enumerate() {
            if let Some(active) = &rematch
                && active.cause == (entry_index, rule_index)
            {
                return;
            }

            let Some(regex) = rule.pattern().compiled() else {
                log::warn!(
                    "[match_grammar] skipping '{}' rule {}: pattern does not compile: {}",
                    entry.name,
                    rule_index,
                    rule.pattern().pattern()
                );
                continue;
            };
            let regex = regex.clone();

            let mut cursor = chain.next(start_node);
            let mut pos = start_pos;

            'scan: loop {
                let Some(current) = chain.get(cursor) else {
                    break;
                };

                if let Some(active) = &rematch
                    && pos >= active.reach
                {
                    // territory past the reach is already reconciled
                    break;
                }

                if chain.live() > text.len() {
                    // Something went terribly wrong, stop before it loops forever
                    log::warn!(
                        "[match_grammar] live token count exceeded input length, aborting"
                    );
                    *truncated = true;
                    return;
                }

                if current.is_matched() {
                    pos += current.scan_len();
                    cursor = chain.next(cursor);
                    continue;
                }
                let current_len = current.scan_len();

                let mut remove_count = 1;
                let segment: String;
                let mut found: MatchResult;

                if rule.is_greedy() {
                    // A greedy match may span several fragments, so it is
                    // attempted against the whole remaining text
                    match match_pattern(&regex, pos, text, rule.is_lookbehind()) {
                        Some(m) if m.index < text.len() => found = m,
                        // either no match anywhere ahead, or a zero-width
                        // match at the very end which must not become a token
                        _ => break,
                    }

                    let match_start = found.index;
                    let match_end = found.index + found.matched().len();

                    // find the node the match starts in
                    let mut p = pos + current_len;
                    while match_start >= p {
                        cursor = chain.next(cursor);
                        match chain.get(cursor) {
                            Some(token) => p += token.scan_len(),
                            None => break 'scan,
                        }
                    }
                    let Some(landed) = chain.get(cursor) else {
                        break;
                    };
                    p -= landed.scan_len();
                    pos = p;

                    if landed.is_matched() {
                        // the match starts inside an already classified
                        // token, which makes this attempt invalid
                        pos += landed.scan_len();
                        cursor = chain.next(cursor);
                        continue;
                    }

                    // walk to the last node affected by the match, folding in
                    // any plain text that directly follows it
                    let mut walker = cursor;
                    while let Some(token) = chain.get(walker) {
                        if p >= match_end && !token.is_plain_text() {
                            break;
                        }
                        remove_count += 1;
                        p += token.scan_len();
                        walker = chain.next(walker);
                    }
                    remove_count -= 1;

                    // the consumed span replaces every covered node
                    segment = slice(text, pos, Some(p)).to_string();
                    found.index -= pos;
                } else {
                    let Some(content) = current.as_text() else {
                        pos += current_len;
                        cursor = chain.next(cursor);
                        continue;
                    };
                    match match_pattern(&regex, 0, content, rule.is_lookbehind()) {
                        Some(m) => {
                            found = m;
                            segment = content.to_string();
                        }
                        None => {
                            pos += current_len;
                            cursor = chain.next(cursor);
                            continue;
                        }
                    }
                }

                let match_len = found.matched().len();
                let before = slice(&segment, 0, Some(found.index)).to_string();
                let after = slice(&segment, found.index + match_len, None).to_string();

                let reach = pos + segment.len();
                if let Some(active) = &mut rematch
                    && reach > active.reach
                {
                    active.reach = reach;
                }

                let mut splice_from = chain.prev(cursor);

                if !before.is_empty() {
                    pos += before.len();
                    splice_from = chain.insert_after(splice_from, Token::text(before));
                }

                chain.remove_after(splice_from, remove_count);

                let match_str = std::mem::take(&mut found.groups[0]);
                let wrapped = match rule.nested() {
                    Some(inside) => {
                        let inner = tokenize_checked(&match_str, inside);
                        if inner.truncated {
                            *truncated = true;
                        }
                        Token::composite(&entry.name, rule.aliases(), inner.tokens, match_len)
                    }
                    None => Token::matched_leaf(&entry.name, rule.aliases(), match_str),
                };
                cursor = chain.insert_after(splice_from, wrapped);

                if !after.is_empty() {
                    chain.insert_after(cursor, Token::text(after));
                }

                if remove_count > 1 {
                    // the greedy match absorbed nodes other rules had already
                    // produced or scanned; re-run every rule processed so far
                    // over the spliced region
                    log::debug!(
                        "[match_grammar] greedy '{}' absorbed {} nodes, rematching up to {}",
                        entry.name,
                        remove_count,
                        reach
                    );
                    let mut nested = Rematch {
                        cause: (entry_index, rule_index),
                        reach,
                    };
                    let restart = chain.prev(cursor);
                    match_grammar(text, chain, entries, restart, pos, Some(&mut nested), truncated);

                    // the nested pass may have reconciled further than us
                    if let Some(active) = &mut rematch
                        && nested.reach > active.reach
                    {
                        active.reach = nested.reach;
                    }
                }

                // step past the token we just created
                pos += chain.get(cursor).map_or(0, Token::scan_len);
                cursor = chain.next(cursor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;
    use crate::token::flatten;
    use pretty_assertions::assert_eq;

    /// Compact one-line rendering of a token stream for assertions
    fn dump(tokens: &[Token]) -> String {
        tokens
            .iter()
            .map(|token| match token {
                Token::Leaf(leaf) => match &leaf.kind {
                    Some(kind) => format!("{}:{:?}", kind, leaf.content),
                    None => format!("{:?}", leaf.content),
                },
                Token::Composite(composite) => {
                    format!("{}[{}]", composite.kind, dump(&composite.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn unmatched_text_stays_a_single_plain_leaf() {
        let mut grammar = Grammar::new();
        grammar.set("number", vec![Rule::new(r"\d+")]);

        let tokens = tokenize("no digits here", &grammar);
        assert_eq!(dump(&tokens), r#""no digits here""#);
    }

    #[test]
    fn matches_split_off_before_and_after_fragments() {
        let mut grammar = Grammar::new();
        grammar.set("number", vec![Rule::new(r"\d+")]);

        let tokens = tokenize("ab 12 cd", &grammar);
        assert_eq!(dump(&tokens), r#""ab " number:"12" " cd""#);
    }

    #[test]
    fn earlier_rules_win_overlapping_starts() {
        let mut grammar = Grammar::new();
        grammar.set(
            "comment",
            vec![
                Rule::new(r"//.*"),
                Rule::new(r"/\*[\s\S]*?\*/").greedy(),
            ],
        );

        let tokens = tokenize("// /*\n/* comment */", &grammar);
        assert_eq!(
            dump(&tokens),
            r#"comment:"// /*" "\n" comment:"/* comment */""#
        );
    }

    #[test]
    fn greedy_match_spans_past_fragments_of_other_rules() {
        let mut grammar = Grammar::new();
        grammar.set("a", vec![Rule::new(r"'[^']*'")]);
        grammar.set(
            "b",
            vec![Rule::new(r#"foo|(^|[^\\])"[^"]*""#).lookbehind().greedy()],
        );

        let tokens = tokenize(r#"foo "bar" 'baz'"#, &grammar);
        assert_eq!(
            dump(&tokens),
            r#"b:"foo" " " b:"\"bar\"" " " a:"'baz'""#
        );
    }

    #[test]
    fn rematch_revalidates_fragments_absorbed_by_a_greedy_match() {
        // "number" fragments the text first; the greedy "quote" rule then
        // absorbs several nodes including part of a number token, and the
        // rematch pass must re-classify the digit it left behind.
        let mut grammar = Grammar::new();
        grammar.set("number", vec![Rule::new(r"\d+")]);
        grammar.set("quote", vec![Rule::new(r#""1"#).greedy()]);

        let tokens = tokenize(r#""12 345"#, &grammar);
        assert_eq!(
            dump(&tokens),
            r#"quote:"\"1" number:"2" " " number:"345""#
        );
    }

    #[test]
    fn trailing_zero_width_greedy_match_is_discarded() {
        let mut grammar = Grammar::new();
        grammar.set("eos", vec![Rule::new("$").greedy()]);

        let result = tokenize_checked("foo", &grammar);
        assert!(!result.truncated);
        assert_eq!(dump(&result.tokens), r#""foo""#);
    }

    #[test]
    fn runaway_zero_width_rule_trips_the_guard() {
        // A lookahead-only rule matches without consuming, so every pass
        // inserts another empty leaf at the same position. The live-token
        // guard has to cut that off and report the truncation.
        let mut grammar = Grammar::new();
        grammar.set("zw", vec![Rule::new(r"(?=.)")]);

        let result = tokenize_checked("abcdef", &grammar);
        assert!(result.truncated);
        assert_eq!(flatten(&result.tokens), "abcdef");
    }

    #[test]
    fn nested_grammars_produce_composite_tokens() {
        let mut inside = Grammar::new();
        inside.set(
            "punctuation",
            vec![Rule::new(r#"^"|"$"#)],
        );

        let mut grammar = Grammar::new();
        grammar.set(
            "string",
            vec![Rule::new(r#""[^"]*""#).greedy().inside(inside)],
        );

        let tokens = tokenize(r#"say "hi" now"#, &grammar);
        assert_eq!(
            dump(&tokens),
            r#""say " string[punctuation:"\"" "hi" punctuation:"\""] " now""#
        );
    }

    #[test]
    fn aliases_are_attached_to_produced_tokens() {
        let mut grammar = Grammar::new();
        grammar.set(
            "null",
            vec![Rule::new(r"\bnull\b").alias("keyword").alias("constant")],
        );

        let tokens = tokenize("x = null", &grammar);
        let token = tokens
            .iter()
            .find(|t| t.kind() == Some("null"))
            .expect("null token");
        assert_eq!(token.aliases(), ["keyword", "constant"]);
    }

    #[test]
    fn reset_grammar_merges_on_first_use_only() {
        let mut grammar = Grammar::new();
        grammar.set("word", vec![Rule::new(r"[a-z]+")]);
        let mut reset = Grammar::new();
        reset.set("number", vec![Rule::new(r"\d+")]);
        grammar.set_reset(reset);

        let first = tokenize("ab 12", &grammar);
        assert_eq!(dump(&first), r#"word:"ab" " " number:"12""#);

        // the merge is consumed; later calls see the same rules
        let second = tokenize("ab 12", &grammar);
        assert_eq!(first, second);
    }

    #[test]
    fn tokenization_is_deterministic() {
        let mut inside = Grammar::new();
        inside.set("digit", vec![Rule::new(r"\d")]);

        let mut grammar = Grammar::new();
        grammar.set("comment", vec![Rule::new(r"//.*")]);
        grammar.set(
            "string",
            vec![Rule::new(r#""[^"]*""#).greedy().inside(inside)],
        );
        grammar.set("word", vec![Rule::new(r"[a-z]+")]);

        let text = "say \"a1b2\" // done\nmore \"3\"";
        let first = tokenize(text, &grammar);
        let second = tokenize(text, &grammar);
        assert_eq!(first, second);
    }

    #[test]
    fn leaf_contents_concatenate_back_to_the_input() {
        let mut inside = Grammar::new();
        inside.set("escape", vec![Rule::new(r"\\.")]);

        let mut grammar = Grammar::new();
        grammar.set("comment", vec![Rule::new(r"//.*")]);
        grammar.set(
            "string",
            vec![Rule::new(r#""(?:\\.|[^"\\])*""#).greedy().inside(inside)],
        );
        grammar.set("number", vec![Rule::new(r"\d+")]);
        grammar.set("punctuation", vec![Rule::new(r"[{}();,]")]);

        for text in [
            "",
            "plain text only",
            "f(1, \"two\\n\", 3); // trailing",
            "{ nested \"str with \\\" quote\" 42 }",
            "unterminated \"string",
        ] {
            let tokens = tokenize(text, &grammar);
            assert_eq!(flatten(&tokens), text, "lossless partition of {text:?}");
        }
    }

    #[test]
    fn empty_input_yields_a_single_empty_leaf() {
        let mut grammar = Grammar::new();
        grammar.set("word", vec![Rule::new(r"[a-z]+")]);

        let result = tokenize_checked("", &grammar);
        assert!(!result.truncated);
        assert_eq!(result.tokens, vec![Token::text("")]);
    }

    #[test]
    fn matched_regions_are_not_rematched_by_later_rules() {
        // "keyword" claims `for`; the later "word" rule must only classify
        // the text the earlier rule did not touch.
        let mut grammar = Grammar::new();
        grammar.set("keyword", vec![Rule::new(r"\bfor\b")]);
        grammar.set("word", vec![Rule::new(r"[a-z]+")]);

        let tokens = tokenize("for formats", &grammar);
        assert_eq!(dump(&tokens), r#"keyword:"for" " " word:"formats""#);
    }
}
