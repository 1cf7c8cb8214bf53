use minijinja::HtmlEscape;
use url::form_urlencoded;

use crate::config::Settings;
use crate::request::{Request, DIR_PARAM, SORT_PARAM};
use crate::sort::Direction;
use crate::util::capitalize;

/// A link that sorts by `field`, or flips the direction when `field` is the
/// column currently sorted on.
///
/// ```rust
/// use sorting::config::Settings;
/// use sorting::request::Request;
/// use sorting::sort::Anchor;
///
/// let settings = Settings::default();
/// let request = Request::parse("/people/?sort=name&dir=asc&page=2");
///
/// assert_eq!(
///     Anchor::new("name").render(&request, &settings),
///     r#"<a href="&#x2f;people&#x2f;?sort=name&page=2&dir=desc" title="Name">Name &uarr;</a>"#
/// );
///
/// assert_eq!(
///     Anchor::new("age").title("years").render(&request, &settings),
///     r#"<a href="&#x2f;people&#x2f;?sort=age&page=2" title="Years">Years</a>"#
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Anchor<'a> {
    field: &'a str,
    title: Option<&'a str>,
}

impl<'a> Anchor<'a> {
    pub fn new(field: &'a str) -> Self {
        Anchor { field, title: None }
    }

    /// Sets the visible title. Defaults to the field name.
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    /// Whether `request` is currently sorted on this anchor's field.
    pub fn is_active(&self, request: &Request) -> bool {
        request.sort() == Some(self.field)
    }

    /// The link target: the request's path and query with `sort` pointing at
    /// this field. `dir` is only carried for the active field, inverted.
    pub fn href(&self, request: &Request) -> String {
        format!("{}{}", request.path(), self.query_string(request))
    }

    fn query_string(&self, request: &Request) -> String {
        let mut query = request.query().clone();
        query.remove(SORT_PARAM);
        let direction = Direction::parse(query.remove(DIR_PARAM).as_deref());
        if self.is_active(request) {
            query.set(DIR_PARAM, direction.inverse().as_str());
        }

        let field = form_urlencoded::byte_serialize(self.field.as_bytes()).collect::<String>();
        let mut string = format!("?{SORT_PARAM}={field}");
        if !query.is_empty() {
            string.push('&');
            string.push_str(&query.encode());
        }

        string
    }

    /// The `<a>` element. The path and title are HTML-escaped; the query is
    /// already form-encoded. The icon is emitted as is.
    pub fn render(&self, request: &Request, settings: &Settings) -> String {
        let href = format!("{}{}", HtmlEscape(request.path()), self.query_string(request));
        let title = HtmlEscape(&capitalize(self.title.unwrap_or(self.field))).to_string();
        match self.is_active(request) {
            true => {
                let icon = request.direction().icon(settings);
                format!(r#"<a href="{href}" title="{title}">{title} {icon}</a>"#)
            }
            false => format!(r#"<a href="{href}" title="{title}">{title}</a>"#),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(target: &str, field: &str) -> String {
        Anchor::new(field).href(&Request::parse(target))
    }

    #[test]
    fn inactive_fields_carry_no_direction_or_icon() {
        let settings = Settings::default();
        for target in ["/?sort=name&dir=asc", "/?sort=name&dir=desc", "/?sort=name", "/?dir=asc", "/"] {
            let request = Request::parse(target);
            let html = Anchor::new("age").render(&request, &settings);
            assert_eq!(html, r#"<a href="&#x2f;?sort=age" title="Age">Age</a>"#, "{target}");
        }
    }

    #[test]
    fn active_field_cycles_direction() {
        let first = click("/list?sort=name", "name");
        assert_eq!(first, "/list?sort=name&dir=asc");

        let second = click(&first, "name");
        assert_eq!(second, "/list?sort=name&dir=desc");

        let third = click(&second, "name");
        assert_eq!(third, "/list?sort=name&dir=asc");
    }

    #[test]
    fn other_parameters_are_preserved_in_order() {
        let href = click("/s?q=big+cats&sort=name&page=3&tag=a&tag=b&dir=desc", "name");
        assert_eq!(href, "/s?sort=name&q=big+cats&page=3&tag=a&tag=b&dir=asc");

        let href = click("/s?q=big+cats&sort=name&page=3&dir=desc", "age");
        assert_eq!(href, "/s?sort=age&q=big+cats&page=3");
    }

    #[test]
    fn icon_reflects_current_direction() {
        let settings = Settings::default();
        let anchor = Anchor::new("name");

        let html = anchor.render(&Request::parse("/?sort=name"), &settings);
        assert!(html.ends_with(">Name &darr;</a>"));

        let html = anchor.render(&Request::parse("/?sort=name&dir=asc"), &settings);
        assert!(html.ends_with(">Name &uarr;</a>"));

        let html = anchor.render(&Request::parse("/?sort=name&dir=desc"), &settings);
        assert!(html.ends_with(">Name &darr;</a>"));
    }

    #[test]
    fn titles_are_capitalized_and_escaped() {
        let settings = Settings::default();
        let request = Request::parse("/");
        let html = Anchor::new("rnd").title("R&D SPEND").render(&request, &settings);
        assert_eq!(html, r#"<a href="&#x2f;?sort=rnd" title="R&amp;d spend">R&amp;d spend</a>"#);

        let html = Anchor::new("x").title("<b>'q'</b>").render(&request, &settings);
        assert!(html.ends_with(r#">&lt;b&gt;&#x27;q&#x27;&lt;&#x2f;b&gt;</a>"#));
    }

    #[test]
    fn paths_cannot_break_out_of_the_href() {
        let settings = Settings::default();
        let request = Request::parse(r#"/a"onmouseover="x<y>?sort=name&dir=asc"#);
        let html = Anchor::new("name").render(&request, &settings);
        assert_eq!(
            html,
            r#"<a href="&#x2f;a&quot;onmouseover=&quot;x&lt;y&gt;?sort=name&dir=desc" title="Name">Name &uarr;</a>"#
        );

        let href = Anchor::new("name").href(&request);
        assert_eq!(href, r#"/a"onmouseover="x<y>?sort=name&dir=desc"#);
    }

    #[test]
    fn fields_are_encoded() {
        assert_eq!(click("/", "a b&c"), "/?sort=a+b%26c");
    }
}
