use std::fmt;

use crate::token::Token;

/// Renders token trees to HTML with the conventional `token` class names, so
/// any stock highlighting stylesheet applies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> HtmlRenderer {
        HtmlRenderer
    }

    /// Renders a token stream as a flat run of `<span>`s. Plain text is
    /// escaped but not wrapped.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            self.write_token(&mut out, token);
        }
        out
    }

    /// Renders a full `<pre><code>` block carrying the `language-*` class on
    /// both elements.
    pub fn render_block(&self, tokens: &[Token], language: &str) -> String {
        let lang = HtmlEscaped(language).to_string();
        format!(
            r#"<pre class="language-{lang}"><code class="language-{lang}">{}</code></pre>"#,
            self.render(tokens)
        )
    }

    fn write_token(&self, out: &mut String, token: &Token) {
        let Some(kind) = token.kind() else {
            // a plain leaf; composites always have a kind
            if let Some(text) = token.as_text() {
                out.push_str(&HtmlEscaped(text).to_string());
            }
            return;
        };

        out.push_str("<span class=\"token ");
        out.push_str(&HtmlEscaped(kind).to_string());
        for alias in token.aliases() {
            out.push(' ');
            out.push_str(&HtmlEscaped(alias).to_string());
        }
        out.push_str("\">");
        match token {
            Token::Leaf(leaf) => out.push_str(&HtmlEscaped(&leaf.content).to_string()),
            Token::Composite(composite) => {
                for child in &composite.children {
                    self.write_token(out, child);
                }
            }
        }
        out.push_str("</span>");
    }
}

/// Escapes text for embedding in HTML, as a `Display` adapter so callers can
/// format straight into their output.
pub(crate) struct HtmlEscaped<'a>(pub &'a str);

impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(s) = *self;
        let mut last = 0;
        for (i, byte) in s.bytes().enumerate() {
            let escaped = match byte {
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'&' => "&amp;",
                b'\'' => "&#39;",
                b'"' => "&quot;",
                _ => continue,
            };
            fmt.write_str(&s[last..i])?;
            fmt.write_str(escaped)?;
            last = i + 1;
        }
        if last < s.len() {
            fmt.write_str(&s[last..])?;
        }
        Ok(())
    }
}
