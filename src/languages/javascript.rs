use crate::error::SpettroResult;
use crate::grammar::{Grammar, Rule};

use super::clike;

/// JavaScript grammar, derived from [`clike`] by replacing the C-family rules
/// that ES has sharper definitions for and splicing in the ES-only ones.
pub fn javascript() -> SpettroResult<Grammar> {
    let mut grammar = clike()?;

    let mut class_name_inside = Grammar::new();
    class_name_inside.set("punctuation", vec![Rule::new(r"[.\\]")]);
    grammar.set(
        "class-name",
        vec![
            Rule::new(r"(\b(?:class|extends|implements|instanceof|interface|new)\s+)[\w.\\]+")
                .lookbehind()
                .inside(class_name_inside),
            Rule::new(
                r"(^|[^$\w\x{A0}-\x{FFFF}])(?!\s)[_$A-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*(?=\.(?:constructor|prototype))",
            )
            .lookbehind(),
        ],
    );

    grammar.set(
        "keyword",
        vec![
            Rule::new(r"((?:^|\})\s*)catch\b").lookbehind(),
            Rule::new(
                r#"(^|[^.]|\.\.\.\s*)\b(?:as|assert(?=\s*\{)|async(?=\s*(?:function\b|\(|[$\w\x{A0}-\x{FFFF}]|$))|await|break|case|class|const|continue|debugger|default|delete|do|else|enum|export|extends|finally(?=\s*(?:\{|$))|for|from(?=\s*(?:['"]|$))|function|(?:get|set)(?=\s*(?:[#\[$\w\x{A0}-\x{FFFF}]|$))|if|implements|import|in|instanceof|interface|let|new|null|of|package|private|protected|public|return|static|super|switch|this|throw|try|typeof|undefined|var|void|while|with|yield)\b"#,
            )
            .lookbehind(),
        ],
    );

    // allow all non-ASCII characters in identifiers
    grammar.set(
        "function",
        vec![Rule::new(
            r"#?(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*(?=\s*(?:\.\s*(?:apply|bind|call)\s*)?\()",
        )],
    );

    grammar.set(
        "number",
        vec![Rule::new(
            r"(^|[^\w$])(?:NaN|Infinity|0[bB][01]+(?:_[01]+)*n?|0[oO][0-7]+(?:_[0-7]+)*n?|0[xX][\dA-Fa-f]+(?:_[\dA-Fa-f]+)*n?|\d+(?:_\d+)*n|(?:\d+(?:_\d+)*(?:\.(?:\d+(?:_\d+)*)?)?|\.\d+(?:_\d+)*)(?:[Ee][+-]?\d+(?:_\d+)*)?)(?![\w$])",
        )
        .lookbehind()],
    );

    grammar.set(
        "operator",
        vec![Rule::new(
            r"--|\+\+|\*\*=?|=>|&&=?|\|\|=?|[!=]==|<<=?|>>>?=?|[-+*/%&|^!=<>]=?|\.{3}|\?\?=?|\?\.?|[~:]",
        )],
    );

    let mut regex_inside = Grammar::new();
    regex_inside.set(
        "regex-source",
        vec![
            Rule::new(r"^(\/)[\s\S]+(?=\/[a-z]*$)")
                .lookbehind()
                .alias("language-regex"),
        ],
    );
    regex_inside.set("regex-delimiter", vec![Rule::new(r"^\/|\/$")]);
    regex_inside.set("regex-flags", vec![Rule::new(r"^[a-z]+$")]);

    let mut expressions = Grammar::new();
    expressions.set(
        "regex",
        vec![
            // the trailing lookahead rejects positions where a slash can only
            // be a division operator
            Rule::new(
                r#"((?:^|[^$\w\x{A0}-\x{FFFF}."'\])\s]|\b(?:return|yield))\s*)\/(?:(?:\[(?:[^\]\\\r\n]|\\.)*\]|\\.|[^/\\\[\r\n])+\/[dgimyus]{0,7}|(?:\[(?:[^\[\]\\\r\n]|\\.|\[(?:[^\[\]\\\r\n]|\\.|\[(?:[^\[\]\\\r\n]|\\.)*\])*\])*\]|\\.|[^/\\\[\r\n])+\/[dgimyus]{0,7}v[dgimyus]{0,7})(?=(?:\s|\/\*(?:[^*]|\*(?!\/))*\*\/)*(?:$|[\r\n,.;:})\]]|\/\/))"#,
            )
            .lookbehind()
            .greedy()
            .inside(regex_inside),
        ],
    );
    expressions.set(
        "function-variable",
        vec![
            Rule::new(
                r"#?(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*(?=\s*[=:]\s*(?:async\s*)?(?:\bfunction\b|(?:\((?:[^()]|\([^()]*\))*\)|(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*)\s*=>))",
            )
            .alias("function"),
        ],
    );
    // the parameter grammars are patched to re-enter the full grammar below
    expressions.set(
        "parameter",
        vec![
            Rule::new(
                r"(function(?:\s+(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*)?\s*\(\s*)(?!\s)(?:[^()\s]|\s+(?![\s)])|\([^()]*\))+(?=\s*\))",
            )
            .lookbehind(),
            Rule::new(
                r"(?i)(^|[^$\w\x{A0}-\x{FFFF}])(?!\s)[_$a-z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*(?=\s*=>)",
            )
            .lookbehind(),
            Rule::new(r"(\(\s*)(?!\s)(?:[^()\s]|\s+(?![\s)])|\([^()]*\))+(?=\s*\)\s*=>)")
                .lookbehind(),
            Rule::new(
                r"((?:\b|\s|^)(?!(?:as|async|await|break|case|catch|class|const|continue|debugger|default|delete|do|else|enum|export|extends|finally|for|from|function|get|if|implements|import|in|instanceof|interface|let|new|null|of|package|private|protected|public|return|set|static|super|switch|this|throw|try|typeof|undefined|var|void|while|with|yield)(?![$\w\x{A0}-\x{FFFF}]))(?:(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*\s*)\(\s*|\]\s*\(\s*)(?!\s)(?:[^()\s]|\s+(?![\s)])|\([^()]*\))+(?=\s*\)\s*\{)",
            )
            .lookbehind(),
        ],
    );
    expressions.set("constant", vec![Rule::new(r"\b[A-Z](?:[A-Z_]|\dx?)*\b")]);
    grammar.insert_before("keyword", expressions)?;

    let mut interpolation_inside = Grammar::new();
    interpolation_inside.set(
        "interpolation-punctuation",
        vec![Rule::new(r"^\$\{|\}$").alias("punctuation")],
    );

    let mut template_inside = Grammar::new();
    template_inside.set(
        "template-punctuation",
        vec![Rule::new(r"^`|`$").alias("string")],
    );
    template_inside.set(
        "interpolation",
        vec![
            Rule::new(r"((?:^|[^\\])(?:\\{2})*)\$\{(?:[^{}]|\{(?:[^{}]|\{[^}]*\})*\})+\}")
                .lookbehind()
                .inside(interpolation_inside),
        ],
    );
    template_inside.set("string", vec![Rule::new(r"[\s\S]+")]);

    let mut strings = Grammar::new();
    strings.set("hashbang", vec![Rule::new(r"^#!.*").greedy().alias("comment")]);
    strings.set(
        "template-string",
        vec![
            Rule::new(
                r"`(?:\\[\s\S]|\$\{(?:[^{}]|\{(?:[^{}]|\{[^}]*\})*\})+\}|(?!\$\{)[^\\`])*`",
            )
            .greedy()
            .inside(template_inside),
        ],
    );
    strings.set(
        "string-property",
        vec![
            Rule::new(r#"((?:^|[,{])[ \t]*)(["'])(?:\\(?:\r\n|[\s\S])|(?!\2)[^\\\r\n])*\2(?=\s*:)"#)
                .lookbehind()
                .greedy()
                .alias("property"),
        ],
    );
    grammar.insert_before("string", strings)?;

    let mut properties = Grammar::new();
    properties.set(
        "literal-property",
        vec![
            Rule::new(
                r"((?:^|[,{])[ \t]*)(?!\s)[_$a-zA-Z\x{A0}-\x{FFFF}](?:(?!\s)[$\w\x{A0}-\x{FFFF}])*(?=\s*:)",
            )
            .lookbehind()
            .alias("property"),
        ],
    );
    grammar.insert_before("operator", properties)?;

    // Parameter lists and template interpolations are tokenized with the
    // language itself. They get a snapshot of the finished grammar, which
    // bounds the recursion at one level per snapshot.
    let snapshot = grammar.clone();
    if let Some(rules) = grammar.rules_mut("parameter") {
        for rule in rules.iter_mut() {
            rule.set_nested(snapshot.clone());
        }
    }
    if let Some(interpolation) = grammar
        .rules_mut("template-string")
        .and_then(|rules| rules.first_mut())
        .and_then(Rule::nested_mut)
        .and_then(|inside| inside.rules_mut("interpolation"))
        .and_then(|rules| rules.first_mut())
        .and_then(Rule::nested_mut)
    {
        interpolation.set_reset(snapshot);
    }

    Ok(grammar)
}
