//! Source-level expansion of the `anchor` and `autosort` tags.
//!
//! minijinja has no API for custom tags, so before a template is compiled
//! each directive is rewritten into a call to a function of the same name:
//!
//! ```text
//! {% anchor name "Full name" %}    =>  {{ anchor("name", "\"Full name\"") }}
//! {% autosort people as sorted %}  =>  {% set sorted = autosort("people") %}
//! ```
//!
//! Arguments are passed as their raw token text and resolved against the
//! context at render time, so `{% anchor field %}` works whether `field` is a
//! variable or a bare word.

use std::borrow::Cow;

use memchr::memchr;

use crate::error::{Result, Chainable};
use crate::util::{is_identifier, is_template};

/// A parsed directive. Borrows its tokens from the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `{% anchor field [title] %}`
    Anchor { field: &'a str, title: Option<&'a str> },
    /// `{% autosort source [as target] %}`
    AutoSort { source: &'a str, target: &'a str },
}

impl<'a> Directive<'a> {
    /// Parses the bits of a tag, as split by [`split_contents()`]. Returns
    /// `Ok(None)` for tags that aren't directives.
    pub fn parse(bits: &[&'a str]) -> Result<Option<Self>> {
        let directive = match *bits {
            ["anchor", field] => Directive::Anchor { field, title: None },
            ["anchor", field, title] => Directive::Anchor { field, title: Some(title) },
            ["anchor", ..] => return err! {
                "anchor takes a field and an optional title",
                "usage" => "{% anchor field [title] %}",
            },
            ["autosort", source] if is_identifier(source) => {
                Directive::AutoSort { source, target: source }
            }
            ["autosort", source] => return err! {
                "autosort needs `as` to name a result for this source",
                "source" => source,
                "usage" => "{% autosort queryset as context_var_name %}",
            },
            ["autosort", source, "as", target] if is_identifier(target) => {
                Directive::AutoSort { source, target }
            }
            ["autosort", _, "as", target] => return err! {
                "autosort target must be a variable name",
                "target" => target,
            },
            ["autosort", _, _, _] => return err! {
                "Context variable assignment must take the form of \
                 {% autosort queryset as context_var_name %}",
            },
            ["autosort", ..] => return err!("autosort tag takes exactly one argument"),
            _ => return Ok(None),
        };

        Ok(Some(directive))
    }

    /// The minijinja source this directive stands for. `trim` carries the
    /// tag's `-` whitespace-control markers, left and right. Tokens become
    /// JSON string literals, which minijinja parses as is.
    pub fn expand(&self, trim: (bool, bool)) -> Result<String> {
        let l = if trim.0 { "-" } else { "" };
        let r = if trim.1 { "-" } else { "" };
        Ok(match *self {
            Directive::Anchor { field, title: None } => {
                let field = serde_json::to_string(field)?;
                format!("{{{{{l} anchor({field}) {r}}}}}")
            }
            Directive::Anchor { field, title: Some(title) } => {
                let (field, title) = (serde_json::to_string(field)?, serde_json::to_string(title)?);
                format!("{{{{{l} anchor({field}, {title}) {r}}}}}")
            }
            Directive::AutoSort { source, target } => {
                let source = serde_json::to_string(source)?;
                format!("{{%{l} set {target} = autosort({source}) {r}%}}")
            }
        })
    }
}

/// Splits the inside of a tag on whitespace, keeping quoted strings whole.
///
/// ```rust
/// use sorting::templating::directive::split_contents;
///
/// assert_eq!(split_contents(" anchor name "), ["anchor", "name"]);
/// assert_eq!(split_contents(r#"anchor name "Full name""#), ["anchor", "name", r#""Full name""#]);
/// assert_eq!(split_contents(r#"anchor x 'it\'s'"#), ["anchor", "x", r#"'it\'s'"#]);
/// assert_eq!(split_contents(r#"x=" a b " y"#), [r#"x=" a b ""#, "y"]);
/// ```
pub fn split_contents(contents: &str) -> Vec<&str> {
    let mut bits = vec![];
    let mut start = None;
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in contents.char_indices() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }

            continue;
        }

        if c.is_whitespace() {
            if let Some(s) = start.take() {
                bits.push(&contents[s..i]);
            }

            continue;
        }

        start.get_or_insert(i);
        if c == '"' || c == '\'' {
            quote = Some(c);
        }
    }

    if let Some(s) = start {
        bits.push(&contents[s..]);
    }

    bits
}

/// If `token` is a quoted string, returns its contents with `\<quote>` and
/// `\\` unescaped.
///
/// ```rust
/// use sorting::templating::directive::unquote;
///
/// assert_eq!(unquote(r#""Full name""#).as_deref(), Some("Full name"));
/// assert_eq!(unquote(r#"'it\'s'"#).as_deref(), Some("it's"));
/// assert_eq!(unquote("name"), None);
/// assert_eq!(unquote("\"half"), None);
/// ```
pub fn unquote(token: &str) -> Option<Cow<'_, str>> {
    let quote = token.chars().next().filter(|&c| c == '"' || c == '\'')?;
    if token.len() < 2 || !token.ends_with(quote) {
        return None;
    }

    let inner = &token[1..token.len() - 1];
    if !inner.contains('\\') {
        return Some(Cow::Borrowed(inner));
    }

    let unescaped = inner
        .replace(&format!("\\{quote}"), &quote.to_string())
        .replace("\\\\", "\\");

    Some(Cow::Owned(unescaped))
}

/// Expands every directive in `source`. Returns `source` untouched when it
/// contains none.
///
/// `{{ ... }}` expressions, `{# ... #}` comments, and the body of
/// `{% raw %}` blocks are never expanded.
pub fn expand(source: &str) -> Result<Cow<'_, str>> {
    if !is_template(source) {
        return Ok(Cow::Borrowed(source));
    }

    let bytes = source.as_bytes();
    let mut output = String::new();
    let mut copied = 0;
    let mut i = 0;
    while let Some(tag) = Tag::next(source, i) {
        i = tag.end;
        if tag.kind != b'%' {
            continue;
        }

        let bits = split_contents(tag.contents);
        if bits.first() == Some(&"raw") {
            i = Tag::find_end_raw(source, tag.end).unwrap_or(source.len());
            continue;
        }

        let directive = Directive::parse(&bits).chain_with(|| error! {
            "invalid directive",
            "line" => memchr::memchr_iter(b'\n', &bytes[..tag.start]).count() + 1,
            "directive" => &source[tag.start..tag.end],
        })?;

        if let Some(directive) = directive {
            output.push_str(&source[copied..tag.start]);
            output.push_str(&directive.expand(tag.trim)?);
            copied = tag.end;
        }
    }

    if copied == 0 {
        return Ok(Cow::Borrowed(source));
    }

    output.push_str(&source[copied..]);
    Ok(Cow::Owned(output))
}

/// A `{{ }}`, `{% %}`, or `{# #}` block in a template source.
#[derive(Debug)]
struct Tag<'a> {
    /// `{`, `%`, or `#`.
    kind: u8,
    start: usize,
    end: usize,
    contents: &'a str,
    trim: (bool, bool),
}

impl<'a> Tag<'a> {
    /// The next complete tag at or after `from`. Quotes are honored inside
    /// `{{ }}` and `{% %}`.
    fn next(source: &'a str, from: usize) -> Option<Tag<'a>> {
        let bytes = source.as_bytes();
        let mut i = from;
        loop {
            let start = i + memchr(b'{', bytes.get(i..)?)?;
            let kind = match bytes.get(start + 1) {
                Some(&k @ (b'{' | b'%' | b'#')) => k,
                Some(_) => { i = start + 1; continue; }
                None => return None,
            };

            let close = if kind == b'{' { b'}' } else { kind };
            let end = Self::find_close(bytes, start + 2, close, kind != b'#')?;
            let mut contents = &source[start + 2..end - 2];
            let mut trim = (false, false);
            if let Some(rest) = contents.strip_prefix('-') {
                contents = rest;
                trim.0 = true;
            }

            if let Some(rest) = contents.strip_suffix('-') {
                contents = rest;
                trim.1 = true;
            }

            return Some(Tag { kind, start, end, contents, trim });
        }
    }

    /// Index just past the `<close>}` that ends a tag whose body starts at
    /// `from`.
    fn find_close(bytes: &[u8], from: usize, close: u8, quotes: bool) -> Option<usize> {
        let mut quote = None;
        let mut k = from;
        while k + 1 < bytes.len() {
            let b = bytes[k];
            match quote {
                Some(_) if b == b'\\' => k += 1,
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if quotes && (b == b'"' || b == b'\'') => quote = Some(b),
                None if b == close && bytes[k + 1] == b'}' => return Some(k + 2),
                None => {}
            }

            k += 1;
        }

        None
    }

    /// Start of the `{% endraw %}` closing a raw block whose body starts at
    /// `from`.
    fn find_end_raw(source: &str, from: usize) -> Option<usize> {
        let mut i = from;
        while let Some(tag) = Tag::next(source, i) {
            if tag.kind == b'%' && split_contents(tag.contents).first() == Some(&"endraw") {
                return Some(tag.start);
            }

            i = tag.end;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expanded(source: &str) -> String {
        expand(source).unwrap().into_owned()
    }

    #[test]
    fn anchors_become_calls() {
        assert_eq!(expanded("{% anchor name %}"), r#"{{ anchor("name") }}"#);
        assert_eq!(
            expanded(r#"<th>{% anchor name "Full name" %}</th>"#),
            r#"<th>{{ anchor("name", "\"Full name\"") }}</th>"#
        );
    }

    #[test]
    fn autosort_becomes_set() {
        assert_eq!(expanded("{% autosort people %}"), r#"{% set people = autosort("people") %}"#);
        assert_eq!(
            expanded("{% autosort site.people as sorted %}"),
            r#"{% set sorted = autosort("site.people") %}"#
        );
    }

    #[test]
    fn tokens_become_json_string_literals() {
        assert_eq!(
            expanded("{% anchor a 'a\tb\\c' %}"),
            r#"{{ anchor("a", "'a\tb\\c'") }}"#
        );
        assert_eq!(expanded("{% anchor a \"bell\u{7}\" %}"), r#"{{ anchor("a", "\"bell\u0007\"") }}"#);
    }

    #[test]
    fn whitespace_control_is_kept() {
        assert_eq!(expanded("{%- anchor a -%}"), r#"{{- anchor("a") -}}"#);
        assert_eq!(expanded("{%- autosort xs %}"), r#"{%- set xs = autosort("xs") %}"#);
    }

    #[test]
    fn other_blocks_are_untouched() {
        let source = "{# {% anchor a %} #}{{ '{% anchor b %}' }}{% if x %}y{% endif %}";
        assert!(matches!(expand(source).unwrap(), Cow::Borrowed(_)));

        let source = "{% raw %}{% anchor a %}{% endraw %}{% anchor b %}";
        assert_eq!(expanded(source), r#"{% raw %}{% anchor a %}{% endraw %}{{ anchor("b") }}"#);

        assert!(matches!(expand("no templates here").unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn quoted_close_markers_do_not_end_tags() {
        assert_eq!(
            expanded(r#"{% anchor a "50%} off" %}"#),
            r#"{{ anchor("a", "\"50%} off\"") }}"#
        );
    }

    #[test]
    fn unterminated_tags_are_left_for_minijinja() {
        assert_eq!(expanded("{% anchor a %}{% anchor b"), r#"{{ anchor("a") }}{% anchor b"#);
    }

    #[test]
    fn syntax_errors_name_the_line() {
        let cases = [
            "{% anchor %}",
            "{% anchor a b c %}",
            "{% autosort %}",
            "{% autosort a b %}",
            "{% autosort a to b %}",
            "{% autosort a as b.c %}",
            "{% autosort site.people %}",
        ];

        for case in cases {
            let source = format!("line one\n\n{case}");
            let error = expand(&source).unwrap_err().to_string();
            assert!(error.starts_with("invalid directive"), "{case}: {error}");
            assert!(error.contains("line: 3"), "{case}: {error}");
        }

        let error = expand("{% autosort a to b %}").unwrap_err().to_string();
        assert!(error.contains("Context variable assignment must take the form"));
    }
}
