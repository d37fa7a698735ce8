//! Markdown to Confluence storage format.
//!
//! Markdown is rendered to HTML first, then code is rewritten into `code` structured macros:
//! fenced and indented blocks keep their language as a macro parameter, inline spans become
//! bare macros. Everything else is passed through as HTML, which the storage format accepts.
//!
//! Known limitation: nested or malformed fences can produce unbalanced macros, and running
//! the converter over its own output is not stable once macros are present.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::{Captures, Regex};

// Blocks and inline spans are rewritten in one pass over the rendered HTML.
static CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<pre><code(?: class="language-([^"]*)")?>(.*?)</code></pre>|<code>(.*?)</code>"#,
    )
    .unwrap()
});

const MACRO_OPEN: &str = r#"<ac:structured-macro ac:name="code">"#;
const BODY_OPEN: &str = "<ac:plain-text-body><![CDATA[";
const BODY_CLOSE: &str = "]]></ac:plain-text-body></ac:structured-macro>";

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Convert Markdown into a page body in Confluence storage format.
pub fn markdown_to_storage(markdown: &str) -> String {
    let html = markdown_to_html(markdown);

    CODE.replace_all(&html, |caps: &Captures| match caps.get(3) {
        Some(inline) => code_macro(None, inline.as_str()),
        None => {
            let language = caps.get(1).map(|m| m.as_str()).filter(|l| !l.is_empty());
            code_macro(language, caps.get(2).map_or("", |m| m.as_str()))
        }
    })
    .into_owned()
}

fn code_macro(language: Option<&str>, escaped_code: &str) -> String {
    let mut out = String::from(MACRO_OPEN);
    if let Some(language) = language {
        out.push_str(r#"<ac:parameter ac:name="language">"#);
        out.push_str(language);
        out.push_str("</ac:parameter>");
    }
    out.push_str(BODY_OPEN);
    // CDATA cannot contain its own terminator; split it across two sections.
    out.push_str(&unescape_html(escaped_code).replace("]]>", "]]]]><![CDATA[>"));
    out.push_str(BODY_CLOSE);
    out
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
