#![forbid(unsafe_code)]

//! Markup trust boundary for challenge descriptions.
//!
//! The enricher never builds [`SafeHtml`] itself; it asks a [`Sanitizer`].
//! Two implementations ship with the crate:
//!
//! - [`TrustedMarkup`]: passes server-authored markup through untouched.
//! - [`EscapeMarkup`]: renders the text inert by escaping markup characters.

use std::fmt;

use serde::Serialize;

/// Markup that a [`Sanitizer`] has approved for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Wrap markup the caller vouches for.
    ///
    /// Intended for [`Sanitizer`] implementations.
    #[must_use]
    pub fn from_trusted(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    /// The approved markup.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces render-safe markup from description text.
pub trait Sanitizer: Send + Sync {
    /// Approve `text` for rendering.
    fn trust_markup(&self, text: &str) -> SafeHtml;
}

/// Trusts the challenge source's markup verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedMarkup;

impl Sanitizer for TrustedMarkup {
    fn trust_markup(&self, text: &str) -> SafeHtml {
        SafeHtml::from_trusted(text)
    }
}

/// Escapes markup characters so the description renders as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeMarkup;

impl Sanitizer for EscapeMarkup {
    fn trust_markup(&self, text: &str) -> SafeHtml {
        let mut out = String::with_capacity(text.len());
        html_escape_into(&mut out, text);
        SafeHtml(out)
    }
}

/// HTML-escape a string into the output buffer.
fn html_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trusted_markup_is_verbatim() {
        let html = TrustedMarkup.trust_markup("<a href=\"/#/score-board\">board</a>");
        assert_eq!(html.as_str(), "<a href=\"/#/score-board\">board</a>");
    }

    #[test]
    fn escape_markup_neutralises_tags() {
        let html = EscapeMarkup.trust_markup("<script>alert('x') & \"y\"</script>");
        assert_eq!(
            html.as_str(),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn escape_markup_leaves_plain_text_alone() {
        assert_eq!(EscapeMarkup.trust_markup("Find the board").as_str(), "Find the board");
    }
}
