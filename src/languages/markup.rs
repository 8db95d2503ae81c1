use crate::error::SpettroResult;
use crate::grammar::{Grammar, Rule};

use super::{css, javascript};

/// HTML/XML grammar, with `<script>` and `<style>` contents handed to the
/// JavaScript and CSS grammars.
pub fn markup() -> SpettroResult<Grammar> {
    let entity_rules = vec![
        Rule::new(r"(?i)&[\da-z]{1,8};").alias("named-entity"),
        Rule::new(r"(?i)&#x?[\da-f]{1,8};"),
    ];

    let mut doctype_inside = Grammar::new();
    doctype_inside.set(
        "internal-subset",
        vec![Rule::new(r"(^[^\[]*\[)[\s\S]+(?=\]>$)").lookbehind().greedy()],
    );
    doctype_inside.set(
        "string",
        vec![Rule::new(r#""[^"]*"|'[^']*'"#).greedy()],
    );
    doctype_inside.set("punctuation", vec![Rule::new(r"^<!|>$|[\[\]]")]);
    doctype_inside.set("doctype-tag", vec![Rule::new("(?i)^DOCTYPE")]);
    doctype_inside.set("name", vec![Rule::new(r#"[^\s<>'"]+"#)]);

    let mut tag_name_inside = Grammar::new();
    tag_name_inside.set("punctuation", vec![Rule::new(r"^<\/?")]);
    tag_name_inside.set("namespace", vec![Rule::new(r"^[^\s>\/:]+:")]);

    let mut attr_value_inside = Grammar::new();
    attr_value_inside.set(
        "punctuation",
        vec![
            Rule::new("^=").alias("attr-equals"),
            Rule::new(r#"^(\s*)["']|["']$"#).lookbehind(),
        ],
    );
    // attribute values may carry character entities
    attr_value_inside.set("entity", entity_rules.clone());

    let mut attr_name_inside = Grammar::new();
    attr_name_inside.set("namespace", vec![Rule::new(r"^[^\s>\/:]+:")]);

    let mut tag_inside = Grammar::new();
    tag_inside.set(
        "tag",
        vec![Rule::new(r"^<\/?[^\s>\/]+").inside(tag_name_inside)],
    );
    tag_inside.set("special-attr", vec![]);
    tag_inside.set(
        "attr-value",
        vec![
            Rule::new(r#"=\s*(?:"[^"]*"|'[^']*'|[^\s'">=]+)"#).inside(attr_value_inside),
        ],
    );
    tag_inside.set("punctuation", vec![Rule::new(r"\/?>")]);
    tag_inside.set(
        "attr-name",
        vec![Rule::new(r"[^\s>\/]+").inside(attr_name_inside)],
    );

    let mut grammar = Grammar::new();
    grammar.set(
        "comment",
        vec![Rule::new(r"<!--(?:(?!<!--)[\s\S])*?-->").greedy()],
    );
    grammar.set("prolog", vec![Rule::new(r"<\?[\s\S]+?\?>").greedy()]);
    grammar.set(
        "doctype",
        vec![
            // https://www.w3.org/TR/xml/#NT-doctypedecl
            Rule::new(
                r#"(?i)<!DOCTYPE(?:[^>"'\[\]]|"[^"]*"|'[^']*')+(?:\[(?:[^<"'\]]|"[^"]*"|'[^']*'|<(?!!--)|<!--(?:[^-]|-(?!->))*-->)*\]\s*)?>"#,
            )
            .greedy()
            .inside(doctype_inside),
        ],
    );
    grammar.set(
        "cdata",
        vec![Rule::new(r"(?i)<!\[CDATA\[[\s\S]*?\]\]>").greedy()],
    );
    grammar.set(
        "tag",
        vec![
            Rule::new(
                r#"<\/?(?!\d)[^\s>\/=$<%]+(?:\s(?:\s*[^\s>\/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s'">=]+(?=[\s>]))|(?=[\s\/>])))+)?\s*\/?>"#,
            )
            .greedy()
            .inside(tag_inside),
        ],
    );
    grammar.set("entity", entity_rules);

    let js = javascript()?;
    add_inlined(&mut grammar, "script", &js, "javascript")?;
    // attribute support for the standard DOM event handlers
    add_attribute(
        &mut grammar,
        r"on(?:abort|blur|change|click|composition(?:end|start|update)|dblclick|error|focus(?:in|out)?|key(?:down|up)|load|mouse(?:down|enter|leave|move|out|over|up)|reset|resize|scroll|select|slotchange|submit|unload|wheel)",
        &js,
        "javascript",
    );

    let css_grammar = css()?;
    add_inlined(&mut grammar, "style", &css_grammar, "css")?;
    add_attribute(&mut grammar, "style", &css_grammar, "css");

    // the internal subset of a doctype is markup again, one snapshot deep
    let snapshot = grammar.clone();
    if let Some(subset) = grammar
        .rules_mut("doctype")
        .and_then(|rules| rules.first_mut())
        .and_then(Rule::nested_mut)
        .and_then(|inside| inside.rules_mut("internal-subset"))
        .and_then(|rules| rules.first_mut())
    {
        subset.set_nested(snapshot);
    }

    Ok(grammar)
}

/// Splices in a rule that captures the body of `<{tag_name}>` elements and
/// tokenizes it with `lang_grammar`, CDATA sections included.
fn add_inlined(
    grammar: &mut Grammar,
    tag_name: &str,
    lang_grammar: &Grammar,
    lang: &str,
) -> SpettroResult<()> {
    let language_key = format!("language-{lang}");

    let mut cdata_inside = Grammar::new();
    cdata_inside.set(
        &language_key,
        vec![
            Rule::new(r"(?i)(^<!\[CDATA\[)[\s\S]+?(?=\]\]>$)")
                .lookbehind()
                .inside(lang_grammar.clone()),
        ],
    );
    cdata_inside.set("cdata", vec![Rule::new(r"(?i)^<!\[CDATA\[|\]\]>$")]);

    let mut inside = Grammar::new();
    inside.set(
        "included-cdata",
        vec![Rule::new(r"(?i)<!\[CDATA\[[\s\S]*?\]\]>").inside(cdata_inside)],
    );
    inside.set(
        &language_key,
        vec![Rule::new(r"[\s\S]+").inside(lang_grammar.clone())],
    );

    let pattern = format!(
        r"(?i)(<{tag_name}[^>]*>)(?:<!\[CDATA\[(?:[^\]]|\](?!\]>))*\]\]>|(?!<!\[CDATA\[)[\s\S])*?(?=<\/{tag_name}>)"
    );
    let mut spliced = Grammar::new();
    spliced.set(
        tag_name,
        vec![Rule::new(pattern).lookbehind().greedy().inside(inside)],
    );
    grammar.insert_before("cdata", spliced)
}

/// Registers a special attribute whose value is tokenized with
/// `lang_grammar`, e.g. inline event handlers or `style="..."`.
fn add_attribute(grammar: &mut Grammar, attr_name_pattern: &str, lang_grammar: &Grammar, lang: &str) {
    let pattern = format!(
        r#"(?i)(^|["'\s])(?:{attr_name_pattern})\s*=\s*(?:"[^"]*"|'[^']*'|[^\s'">=]+(?=[\s>]))"#
    );

    let mut value_inside = Grammar::new();
    value_inside.set(
        "value",
        vec![
            Rule::new(r#"(^=\s*(["']|(?!["'])))\S[\s\S]*(?=\2$)"#)
                .lookbehind()
                .alias(lang)
                .alias(&format!("language-{lang}"))
                .inside(lang_grammar.clone()),
        ],
    );
    value_inside.set(
        "punctuation",
        vec![
            Rule::new("^=").alias("attr-equals"),
            Rule::new(r#""|'"#),
        ],
    );

    let mut attr_inside = Grammar::new();
    attr_inside.set("attr-name", vec![Rule::new(r"^[^\s=]+")]);
    attr_inside.set(
        "attr-value",
        vec![Rule::new(r"=[\s\S]+").inside(value_inside)],
    );

    let rule = Rule::new(pattern).lookbehind().inside(attr_inside);
    if let Some(special) = grammar
        .rules_mut("tag")
        .and_then(|rules| rules.first_mut())
        .and_then(Rule::nested_mut)
        .and_then(|inside| inside.rules_mut("special-attr"))
    {
        special.push(rule);
    }
}
