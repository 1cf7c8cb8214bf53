use std::path::Path;
use std::sync::Arc;
use std::error::Error as StdError;

use minijinja::{Environment, ErrorKind, path_loader};
use minijinja::value::Value;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{Error, Kind, Result, Chainable};
use crate::request::Request;
use crate::templating::{directive, Engine, EngineInit};
use crate::value::Dict;

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Result<Environment<'static>>,
    settings: Arc<Settings>,
}

/// Marks a template error as the requester's fault.
#[derive(Debug)]
struct NotFound;

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "not found")
    }
}

impl StdError for NotFound { }

fn try_init<G: Serialize>(
    templates: Option<&Path>,
    settings: Arc<Settings>,
    globals: G,
) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    if let Some(root) = templates {
        if !root.is_dir() {
            return err! {
                "template root must be an existing directory",
                "path" => root.display(),
            };
        }

        let loader = path_loader(root.to_path_buf());
        env.set_loader(move |name| match loader(name)? {
            Some(source) => directive::expand(&source)
                .map(|expanded| Some(expanded.into_owned()))
                .map_err(|e| minijinja::Error::new(ErrorKind::SyntaxError, e.to_string())),
            None => Ok(None),
        });
    }

    env.add_global("G", Value::from_serializable(&globals));

    let anchor_settings = settings.clone();
    env.add_function("anchor", move |state: &minijinja::State, field: String, title: Option<String>| {
        ext::anchor(&anchor_settings, state, &field, title.as_deref())
    });

    env.add_function("autosort", move |state: &minijinja::State, source: String| {
        ext::autosort(&settings, state, &source)
    });

    Ok(env)
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init<G: Serialize>(templates: Option<&Path>, settings: Settings, globals: G) -> Self::Engine {
        let settings = Arc::new(settings);
        MiniJinjaEngine {
            env: try_init(templates, settings.clone(), globals),
            settings,
        }
    }
}

impl MiniJinjaEngine {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Engine for MiniJinjaEngine {
    fn render(
        &self,
        name: &str,
        request: &Request,
        context: &Dict,
    ) -> Result<String> {
        let env = self.env.as_ref().map_err(|e| e.clone())?;
        let template = env.get_template(name).map_err(convert)?;
        template.render(context_value(request, context))
            .map_err(convert)
            .chain_with(|| error!("failed to render template", "template" => name))
    }

    fn render_str(
        &self,
        name: Option<&str>,
        template_str: &str,
        request: &Request,
        context: &Dict,
    ) -> Result<String> {
        let env = self.env.as_ref().map_err(|e| e.clone())?;
        let source = directive::expand(template_str)?;
        let context = context_value(request, context);
        let string = match name {
            Some(name) => env.render_named_str(name, &source, context),
            None => env.render_str(&source, context),
        };

        string.map_err(convert)
            .chain_with(|| error!("failed to render template", "template" => name.unwrap_or("<string>")))
    }
}

/// The template context: `context` plus the `request`.
fn context_value(request: &Request, context: &Dict) -> Value {
    let mut context = context.clone();
    context.insert("request".into(), request.into());
    Value::from_serializable(&context)
}

/// Converts a template error, keeping track of whether it means not found.
fn convert(error: minijinja::Error) -> Error {
    let mut source: Option<&(dyn StdError + 'static)> = Some(&error);
    while let Some(e) = source {
        if e.is::<NotFound>() {
            return Error::from(error).with_kind(Kind::NotFound);
        }

        source = e.source();
    }

    Error::from(error)
}

mod ext {
    use std::borrow::Cow;

    use either::Either;
    use minijinja::{value::{Value, ValueKind}, Error, ErrorKind, State};

    use super::NotFound;
    use crate::config::Settings;
    use crate::request::{Query, Request};
    use crate::sort::{Anchor, InvalidField, OrderBy, OrderKey};
    use crate::templating::directive::unquote;

    /// Resolves a directive token against the context: quoted tokens are
    /// literals, anything else is a `.`-separated variable path. Tokens that
    /// don't resolve to data, including ones naming a function such as
    /// `range`, fall back to their own text.
    pub fn lookup<'t>(state: &State<'_, '_>, token: &'t str) -> Either<Value, Cow<'t, str>> {
        if let Some(literal) = unquote(token) {
            return Either::Right(literal);
        }

        let mut segments = token.split('.');
        let value = segments.next()
            .and_then(|base| state.lookup(base))
            .and_then(|base| segments.try_fold(base, |value, segment| attr(&value, segment)));

        match value {
            Some(value) if is_data(&value) => Either::Left(value),
            _ => Either::Right(Cow::Borrowed(token)),
        }
    }

    fn is_data(value: &Value) -> bool {
        let plain_object = value.as_object().is_some() && value.as_seq().is_none() && value.as_map().is_none();
        !value.is_undefined() && !value.is_none() && !plain_object
    }

    fn attr(value: &Value, segment: &str) -> Option<Value> {
        let attr = match segment.parse::<usize>() {
            Ok(i) => value.get_item(&Value::from(i)),
            Err(_) => value.get_attr(segment),
        };

        attr.ok().filter(|v| !v.is_undefined())
    }

    /// The request being rendered, rebuilt from the context's `request`.
    fn current_request(state: &State<'_, '_>) -> Request {
        let request = state.lookup("request").filter(|v| !v.is_undefined() && !v.is_none());
        let request = match request {
            Some(request) => request,
            None => {
                tracing::warn!("no `request` in template context: sorting as if at the root");
                return Request::default();
            }
        };

        let path = request.get_attr("path").unwrap_or(Value::UNDEFINED);
        let query = request.get_attr("query").unwrap_or(Value::UNDEFINED);
        let query = query.as_str().map(Query::parse).unwrap_or_default();
        Request::new(path.as_str().unwrap_or_default(), query)
    }

    pub fn anchor(settings: &Settings, state: &State<'_, '_>, field: &str, title: Option<&str>) -> Value {
        let field = match lookup(state, field) {
            Either::Left(value) => match value.as_str() {
                Some(string) => string.to_owned(),
                None => value.to_string(),
            },
            Either::Right(text) => text.into_owned(),
        };

        let title = title.map(|token| match lookup(state, token) {
            Either::Left(value) => value.as_str().unwrap_or(token).to_owned(),
            Either::Right(text) => text.into_owned(),
        });

        let mut anchor = Anchor::new(&field);
        if let Some(title) = title.as_deref() {
            anchor = anchor.title(title);
        }

        Value::from_safe_string(anchor.render(&current_request(state), settings))
    }

    pub fn autosort(settings: &Settings, state: &State<'_, '_>, source: &str) -> Result<Value, Error> {
        let collection = match lookup(state, source) {
            Either::Left(value) => value,
            Either::Right(_) => {
                tracing::debug!(source, "autosort source is undefined");
                return Ok(Value::UNDEFINED);
            }
        };

        let order_by = current_request(state).order_by();
        crate::sort::autosort(collection, &order_by, settings).map_err(|e| {
            let error = Error::new(ErrorKind::InvalidOperation, e.to_string());
            match e.is_not_found() {
                true => error.with_source(NotFound),
                false => error,
            }
        })
    }

    impl OrderBy for Value {
        /// Orders a sequence of maps or objects by one of their attributes.
        /// Anything that isn't a sequence is returned as is. A `none`
        /// attribute sorts before every other value, so first when ascending
        /// and last when descending; only a missing one makes the field
        /// invalid.
        fn order_by(&self, key: &str) -> Result<Self, InvalidField> {
            let key = OrderKey::parse(key)?;
            if self.kind() != ValueKind::Seq {
                return Ok(self.clone());
            }

            let items = self.try_iter()
                .map_err(|_| InvalidField::new(key.field))?
                .collect::<Vec<_>>();

            let sorted = key.sort(&items, |item| {
                let mut segments = key.field.split('.');
                segments.try_fold(item.clone(), |value, segment| attr(&value, segment))
            }, Ord::cmp)?;

            Ok(Value::from(sorted))
        }
    }
}

impl_error_detail_with_std_error!(minijinja::Error);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Json, Format, Value as Data};

    fn engine(settings: Settings) -> MiniJinjaEngine {
        MiniJinjaEngine::init(None, settings, ())
    }

    fn people() -> Dict {
        let data: Data = Json::read(r#"{
            "people": [
                {"name": "bo", "age": 40, "team": {"name": "red"}},
                {"name": "al", "age": 31, "team": {"name": "blue"}},
                {"name": "cy", "age": 25, "team": {"name": "green"}}
            ],
            "column": "age"
        }"#).unwrap();

        (*data.into_dict().unwrap()).clone()
    }

    fn render(engine: &MiniJinjaEngine, target: &str, template: &str) -> Result<String> {
        engine.render_str(None, template, &Request::parse(target), &people())
    }

    const NAMES: &str = "{% for p in sorted %}{{ p.name }} {% endfor %}";

    #[test]
    fn autosort_orders_into_target() {
        let engine = engine(Settings::default());
        let template = format!("{{% autosort people as sorted %}}{NAMES}");

        assert_eq!(render(&engine, "/?sort=name", &template).unwrap(), "cy bo al ");
        assert_eq!(render(&engine, "/?sort=name&dir=asc", &template).unwrap(), "al bo cy ");
        assert_eq!(render(&engine, "/?sort=age&dir=asc", &template).unwrap(), "cy al bo ");
        assert_eq!(render(&engine, "/?sort=team.name&dir=desc", &template).unwrap(), "bo cy al ");
        assert_eq!(render(&engine, "/", &template).unwrap(), "bo al cy ");
    }

    #[test]
    fn autosort_defaults_to_source_name() {
        let engine = engine(Settings::default());
        let template = "{% autosort people %}{% for p in people %}{{ p.name }} {% endfor %}";
        assert_eq!(render(&engine, "/?sort=name&dir=asc", template).unwrap(), "al bo cy ");
    }

    #[test]
    fn invalid_field_falls_back_or_is_not_found() {
        let template = format!("{{% autosort people as sorted %}}{NAMES}");

        let lenient = engine(Settings::default());
        assert_eq!(render(&lenient, "/?sort=height", &template).unwrap(), "bo al cy ");

        let strict = engine(Settings { invalid_field_raises_404: true, ..Settings::default() });
        let error = render(&strict, "/?sort=height", &template).unwrap_err();
        assert!(error.is_not_found());

        let error = render(&strict, "/?sort=name&dir=asc", "{{ nope(") .unwrap_err();
        assert!(!error.is_not_found());
    }

    #[test]
    fn anchors_resolve_tokens() {
        let engine = engine(Settings::default());
        let target = "/people/?sort=age&page=2";

        let html = render(&engine, target, "{% anchor name %}").unwrap();
        assert_eq!(html, r#"<a href="&#x2f;people&#x2f;?sort=name&page=2" title="Name">Name</a>"#);

        let html = render(&engine, target, "{% anchor column \"years old\" %}").unwrap();
        assert_eq!(html, r#"<a href="&#x2f;people&#x2f;?sort=age&page=2&dir=asc" title="Years old">Years old &darr;</a>"#);

        let html = render(&engine, target, "{% anchor people.0.name 'Bo' %}").unwrap();
        assert_eq!(html, r#"<a href="&#x2f;people&#x2f;?sort=bo&page=2" title="Bo">Bo</a>"#);

        let html = render(&engine, target, "{% anchor name people %}").unwrap();
        assert_eq!(html, r#"<a href="&#x2f;people&#x2f;?sort=name&page=2" title="People">People</a>"#);
    }

    #[test]
    fn none_attributes_sort_first() {
        let data: Data = Json::read(r#"{
            "people": [
                {"name": "bo", "age": 40},
                {"name": "al", "age": null},
                {"name": "cy", "age": 25}
            ]
        }"#).unwrap();

        let context = (*data.into_dict().unwrap()).clone();
        let strict = engine(Settings { invalid_field_raises_404: true, ..Settings::default() });
        let template = format!("{{% autosort people as sorted %}}{NAMES}");
        let render = |target| strict.render_str(None, &template, &Request::parse(target), &context);

        assert_eq!(render("/?sort=age&dir=asc").unwrap(), "al cy bo ");
        assert_eq!(render("/?sort=age&dir=desc").unwrap(), "bo cy al ");
        assert!(render("/?sort=height&dir=asc").unwrap_err().is_not_found());
    }

    #[test]
    fn function_names_are_not_columns() {
        let engine = engine(Settings::default());
        for name in ["range", "dict", "namespace", "anchor", "autosort"] {
            let html = render(&engine, "/", &format!("{{% anchor {name} %}}")).unwrap();
            let title = crate::util::capitalize(name);
            assert_eq!(html, format!(r#"<a href="&#x2f;?sort={name}" title="{title}">{title}</a>"#));
        }
    }

    #[test]
    fn anchors_without_a_request_still_render() {
        let engine = engine(Settings::default());
        let template = "{% set request = none %}{% anchor name %}";
        let html = render(&engine, "/people/?sort=name", template).unwrap();
        assert_eq!(html, r#"<a href="?sort=name" title="Name">Name</a>"#);
    }

    #[test]
    fn request_is_exposed_to_templates() {
        let engine = engine(Settings::default());
        let html = render(&engine, "/p?sort=name&dir=asc", "{{ request.path }} {{ request.order_by }}").unwrap();
        assert_eq!(html, "/p name");
    }

    #[test]
    fn directive_syntax_errors_fail_rendering() {
        let engine = engine(Settings::default());
        let error = render(&engine, "/", "{% autosort people into x %}").unwrap_err();
        assert!(!error.is_not_found());
        assert!(error.to_string().contains("invalid directive"));
    }
}
