//! Markup collaborators: turn free-form description text into HTML.
//!
//! Descriptions are rendered once, when they are stored.

use std::fmt::Debug;

pub trait Markup: Debug + Send + Sync {
    fn to_html(&self, text: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainText;

impl Markup for PlainText {
    fn to_html(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Minimal text-to-HTML: escapes, wraps blank-line separated paragraphs in
/// `<p>`, and renders `` `code` `` spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleHtml;

impl Markup for SimpleHtml {
    fn to_html(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        text.split("\n\n")
            .map(str::trim)
            .filter(|para| !para.is_empty())
            .map(|para| format!("<p>{}</p>", inline_code(&html_escape(para))))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Render `` `code` `` spans. An unmatched backtick is kept literally.
fn inline_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        match after.find('`') {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str("<code>");
                out.push_str(&after[..end]);
                out.push_str("</code>");
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
