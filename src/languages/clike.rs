use crate::error::SpettroResult;
use crate::grammar::{Grammar, Rule};

/// Base grammar shared by C-family languages. Rarely used on its own, but
/// [`javascript`](super::javascript) derives from it.
pub fn clike() -> SpettroResult<Grammar> {
    let mut class_name_inside = Grammar::new();
    class_name_inside.set("punctuation", vec![Rule::new(r"[.\\]")]);

    let mut grammar = Grammar::new();
    grammar.set(
        "comment",
        vec![
            Rule::new(r"(^|[^\\])\/\*[\s\S]*?(?:\*\/|$)").lookbehind().greedy(),
            Rule::new(r"(^|[^\\:])\/\/.*").lookbehind().greedy(),
        ],
    );
    grammar.set(
        "string",
        vec![Rule::new(r#"(["'])(?:\\(?:\r\n|[\s\S])|(?!\1)[^\\\r\n])*\1"#).greedy()],
    );
    grammar.set(
        "class-name",
        vec![
            Rule::new(
                r"(?i)(\b(?:class|extends|implements|instanceof|interface|new|trait)\s+|\bcatch\s+\()[\w.\\]+",
            )
            .lookbehind()
            .inside(class_name_inside),
        ],
    );
    grammar.set(
        "keyword",
        vec![Rule::new(
            r"\b(?:break|catch|continue|do|else|finally|for|function|if|in|instanceof|new|null|return|throw|try|while)\b",
        )],
    );
    grammar.set("boolean", vec![Rule::new(r"\b(?:false|true)\b")]);
    grammar.set("function", vec![Rule::new(r"\b\w+(?=\()")]);
    grammar.set(
        "number",
        vec![Rule::new(
            r"(?i)\b0x[\da-f]+\b|(?:\b\d+(?:\.\d*)?|\B\.\d+)(?:e[+-]?\d+)?",
        )],
    );
    grammar.set(
        "operator",
        vec![Rule::new(r"[<>]=?|[!=]=?=?|--?|\+\+?|&&?|\|\|?|[?*/~^%]")],
    );
    grammar.set("punctuation", vec![Rule::new(r"[{}\[\];(),.:]")]);
    Ok(grammar)
}
