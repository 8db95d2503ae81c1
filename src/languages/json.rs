use crate::error::SpettroResult;
use crate::grammar::{Grammar, Rule};

/// JSON grammar, with JSONC-style comments tolerated.
pub fn json() -> SpettroResult<Grammar> {
    let mut grammar = Grammar::new();
    grammar.set(
        "property",
        vec![
            Rule::new(r#"(^|[^\\])"(?:\\.|[^\\"\r\n])*"(?=\s*:)"#)
                .lookbehind()
                .greedy(),
        ],
    );
    grammar.set(
        "string",
        vec![
            Rule::new(r#"(^|[^\\])"(?:\\.|[^\\"\r\n])*"(?!\s*:)"#)
                .lookbehind()
                .greedy(),
        ],
    );
    grammar.set(
        "comment",
        vec![Rule::new(r"\/\/.*|\/\*[\s\S]*?(?:\*\/|$)").greedy()],
    );
    grammar.set(
        "number",
        vec![Rule::new(r"(?i)-?\b\d+(?:\.\d+)?(?:e[+-]?\d+)?\b")],
    );
    grammar.set("punctuation", vec![Rule::new(r"[{}\[\],]")]);
    grammar.set("operator", vec![Rule::new(":")]);
    grammar.set("boolean", vec![Rule::new(r"\b(?:false|true)\b")]);
    grammar.set("null", vec![Rule::new(r"\bnull\b").alias("keyword")]);
    Ok(grammar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    #[test]
    fn keys_and_values_get_distinct_kinds() {
        let grammar = json().unwrap();
        let tokens = tokenize(r#"{"name": "demo", "tags": ["a"]}"#, &grammar);

        let properties: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == Some("property"))
            .map(Token::plain_text)
            .collect();
        assert_eq!(properties, [r#""name""#, r#""tags""#]);

        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind() == Some("string"))
            .map(Token::plain_text)
            .collect();
        assert_eq!(strings, [r#""demo""#, r#""a""#]);
    }

    #[test]
    fn literals_and_numbers() {
        let grammar = json().unwrap();
        let tokens = tokenize(r#"[true, null, -1.5e3]"#, &grammar);

        let boolean = tokens.iter().find(|t| t.kind() == Some("boolean"));
        assert_eq!(boolean.map(Token::plain_text), Some("true".to_string()));

        let null = tokens
            .iter()
            .find(|t| t.kind() == Some("null"))
            .expect("null token");
        assert_eq!(null.aliases(), ["keyword"]);

        let number = tokens.iter().find(|t| t.kind() == Some("number"));
        assert_eq!(number.map(Token::plain_text), Some("-1.5e3".to_string()));
    }

    #[test]
    fn escaped_quotes_stay_inside_the_string() {
        let grammar = json().unwrap();
        let tokens = tokenize(r#"{"k": "a \" b"}"#, &grammar);
        let string = tokens
            .iter()
            .find(|t| t.kind() == Some("string"))
            .expect("string token");
        assert_eq!(string.plain_text(), r#""a \" b""#);
    }
}
