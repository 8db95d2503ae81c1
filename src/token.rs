use serde::Serialize;

/// A node of the token tree produced by tokenization.
///
/// A [`Token::Leaf`] holds literal text: either plain, unclassified background
/// text or the match of a rule. A [`Token::Composite`] is produced when a rule
/// carries a nested grammar; it holds the sub-tokens of the matched region.
///
/// Concatenating the content of all leaves in document order reproduces the
/// tokenized input exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Token {
    Leaf(LeafToken),
    Composite(CompositeToken),
}

/// Literal text, with a type name when a rule produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafToken {
    /// The token-type name of the rule that matched, `None` for plain text
    pub kind: Option<String>,
    /// Extra names attached by the matching rule, for presentation classes
    pub aliases: Vec<String>,
    pub content: String,
    /// Length of the text span this token was matched against, 0 for plain text
    #[serde(skip)]
    matched_len: usize,
}

/// The recursively tokenized match of a rule with a nested grammar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeToken {
    pub kind: String,
    pub aliases: Vec<String>,
    pub children: Vec<Token>,
    #[serde(skip)]
    matched_len: usize,
}

impl Token {
    /// A plain, unclassified text leaf.
    pub fn text(content: impl Into<String>) -> Token {
        Token::Leaf(LeafToken {
            kind: None,
            aliases: Vec::new(),
            content: content.into(),
            matched_len: 0,
        })
    }

    pub(crate) fn matched_leaf(kind: &str, aliases: &[String], content: String) -> Token {
        Token::Leaf(LeafToken {
            kind: Some(kind.to_string()),
            aliases: aliases.to_vec(),
            matched_len: content.len(),
            content,
        })
    }

    pub(crate) fn composite(
        kind: &str,
        aliases: &[String],
        children: Vec<Token>,
        matched_len: usize,
    ) -> Token {
        Token::Composite(CompositeToken {
            kind: kind.to_string(),
            aliases: aliases.to_vec(),
            children,
            matched_len,
        })
    }

    /// The token-type name, `None` for plain text leaves.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Token::Leaf(leaf) => leaf.kind.as_deref(),
            Token::Composite(composite) => Some(&composite.kind),
        }
    }

    pub fn aliases(&self) -> &[String] {
        match self {
            Token::Leaf(leaf) => &leaf.aliases,
            Token::Composite(composite) => &composite.aliases,
        }
    }

    /// Whether this token is the product of a successful rule application.
    /// Composites only exist as the product of a rule, so they always are.
    pub fn is_matched(&self) -> bool {
        match self {
            Token::Leaf(leaf) => leaf.matched_len > 0,
            Token::Composite(_) => true,
        }
    }

    /// A plain text leaf that no rule has classified yet
    pub(crate) fn is_plain_text(&self) -> bool {
        matches!(self, Token::Leaf(_)) && !self.is_matched()
    }

    /// The literal content of a leaf, `None` for composites.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Leaf(leaf) => Some(&leaf.content),
            Token::Composite(_) => None,
        }
    }

    /// The child tokens of a composite, `None` for leaves.
    pub fn children(&self) -> Option<&[Token]> {
        match self {
            Token::Leaf(_) => None,
            Token::Composite(composite) => Some(&composite.children),
        }
    }

    /// Length of the text span this token stands for, used for position
    /// bookkeeping while scanning. Matched tokens report the length of the
    /// span they were matched against, plain leaves their content length.
    pub(crate) fn scan_len(&self) -> usize {
        match self {
            Token::Leaf(leaf) => {
                if leaf.matched_len > 0 {
                    leaf.matched_len
                } else {
                    leaf.content.len()
                }
            }
            Token::Composite(composite) => composite.matched_len,
        }
    }

    /// Flattens the tree back into the text it was tokenized from.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Token::Leaf(leaf) => out.push_str(&leaf.content),
            Token::Composite(composite) => {
                for child in &composite.children {
                    child.write_text(out);
                }
            }
        }
    }
}

/// Flattens a whole token sequence back into text, in document order.
pub fn flatten(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.write_text(&mut out);
    }
    out
}
