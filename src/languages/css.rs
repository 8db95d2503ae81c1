use crate::error::SpettroResult;
use crate::grammar::{Grammar, Rule};

// https://drafts.csswg.org/css-values-3/#strings
const STRING: &str =
    r#"(?:"(?:\\(?:\r\n|[\s\S])|[^"\\\r\n])*"|'(?:\\(?:\r\n|[\s\S])|[^'\\\r\n])*')"#;

/// CSS grammar.
pub fn css() -> SpettroResult<Grammar> {
    let mut atrule_inside = Grammar::new();
    atrule_inside.set("rule", vec![Rule::new(r"^@[\w-]+")]);
    atrule_inside.set(
        "selector-function-argument",
        vec![
            Rule::new(
                r"(\bselector\s*\(\s*(?![\s)]))(?:[^()\s]|\s+(?![\s)])|\((?:[^()]|\([^()]*\))*\))+(?=\s*\))",
            )
            .lookbehind()
            .alias("selector"),
        ],
    );
    atrule_inside.set(
        "keyword",
        vec![Rule::new(r"(^|[^\w-])(?:and|not|only|or)(?![\w-])").lookbehind()],
    );

    let mut url_inside = Grammar::new();
    url_inside.set("function", vec![Rule::new(r"(?i)^url")]);
    url_inside.set("punctuation", vec![Rule::new(r"^\(|\)$")]);
    url_inside.set(
        "string",
        vec![Rule::new(format!("^{STRING}$")).alias("url")],
    );

    let mut grammar = Grammar::new();
    grammar.set("comment", vec![Rule::new(r"\/\*[\s\S]*?\*\/")]);
    grammar.set(
        "atrule",
        vec![
            Rule::new(format!(
                r#"@[\w-](?:[^;{{\s"']|\s+(?!\s)|{STRING})*?(?:;|(?=\s*\{{))"#
            ))
            .inside(atrule_inside),
        ],
    );
    grammar.set(
        "url",
        vec![
            // https://drafts.csswg.org/css-values-3/#urls
            Rule::new(format!(
                r#"(?i)\burl\((?:{STRING}|(?:[^\\\r\n()"']|\\[\s\S])*)\)"#
            ))
            .greedy()
            .inside(url_inside),
        ],
    );
    grammar.set(
        "selector",
        vec![
            Rule::new(format!(
                r#"(^|[{{}}\s])[^{{}}\s](?:[^{{}};"'\s]|\s+(?![\s{{])|{STRING})*(?=\s*\{{)"#
            ))
            .lookbehind(),
        ],
    );
    grammar.set("string", vec![Rule::new(STRING).greedy()]);
    grammar.set(
        "property",
        vec![
            Rule::new(
                r"(?i)(^|[^-\w\x{A0}-\x{FFFF}])(?!\s)[-_a-z\x{A0}-\x{FFFF}](?:(?!\s)[-\w\x{A0}-\x{FFFF}])*(?=\s*:)",
            )
            .lookbehind(),
        ],
    );
    grammar.set("important", vec![Rule::new(r"(?i)!important\b")]);
    grammar.set(
        "function",
        vec![Rule::new(r"(?i)(^|[^-a-z0-9])[-a-z0-9]+(?=\()").lookbehind()],
    );
    grammar.set("punctuation", vec![Rule::new(r"[(){};:,]")]);

    // at-rule preludes may contain anything the top level does, so their
    // nested grammar closes over a snapshot of the finished one
    let snapshot = grammar.clone();
    if let Some(inside) = grammar
        .rules_mut("atrule")
        .and_then(|rules| rules.first_mut())
        .and_then(Rule::nested_mut)
    {
        inside.set_reset(snapshot);
    }

    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn find<'a>(tokens: &'a [Token], kind: &str) -> Option<&'a Token> {
        tokens.iter().find(|t| t.kind() == Some(kind))
    }

    #[test]
    fn selectors_properties_and_values() {
        let grammar = css().unwrap();
        let tokens = tokenize("a.link:hover { color: red !important; }", &grammar);

        assert_eq!(
            find(&tokens, "selector").map(Token::plain_text),
            Some("a.link:hover".to_string())
        );
        assert_eq!(
            find(&tokens, "property").map(Token::plain_text),
            Some("color".to_string())
        );
        assert_eq!(
            find(&tokens, "important").map(Token::plain_text),
            Some("!important".to_string())
        );
    }

    #[test]
    fn at_rules_expose_rule_and_keyword_children() {
        let grammar = css().unwrap();
        let tokens = tokenize("@media screen and (min-width: 600px) { }", &grammar);
        let atrule = find(&tokens, "atrule").expect("atrule token");
        let children = atrule.children().expect("composite");

        let rule = children
            .iter()
            .find(|t| t.kind() == Some("rule"))
            .expect("rule");
        assert_eq!(rule.as_text(), Some("@media"));
        assert!(children.iter().any(|t| t.kind() == Some("keyword")));
        // the reset pulls in the top-level rules for the prelude
        assert!(children.iter().any(|t| t.kind() == Some("property")));
    }

    #[test]
    fn urls_are_composites_even_when_unquoted() {
        let grammar = css().unwrap();
        let tokens = tokenize("body { background: url(img/bg.png); }", &grammar);
        let url = find(&tokens, "url").expect("url token");
        let children = url.children().expect("composite");

        assert!(children.iter().any(|t| t.kind() == Some("function")));
        assert!(
            children
                .iter()
                .any(|t| t.is_matched() && t.plain_text() == "(")
        );
    }

    #[test]
    fn comments_do_not_swallow_following_rules() {
        let grammar = css().unwrap();
        let tokens = tokenize("/* a */ b { }", &grammar);
        assert_eq!(
            find(&tokens, "comment").map(Token::plain_text),
            Some("/* a */".to_string())
        );
        assert!(find(&tokens, "selector").is_some());
    }
}
