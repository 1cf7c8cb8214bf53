pub mod directive;
pub mod minijinja;

use std::fmt::Debug;
use std::path::Path;

use serde::Serialize;

use crate::config::Settings;
use crate::error::Result;
use crate::request::Request;
use crate::value::Dict;

pub trait EngineInit {
    type Engine: Engine + 'static;

    /// Builds an engine loading templates from `templates`, if any. `globals`
    /// are available to every template as `G`.
    fn init<G: Serialize>(templates: Option<&Path>, settings: Settings, globals: G) -> Self::Engine;
}

pub trait Engine: Send + Sync + Debug {
    /// Renders the template `name` for `request`. The request is available to
    /// the template as `request`, alongside the entries of `context`.
    fn render(
        &self,
        name: &str,
        request: &Request,
        context: &Dict,
    ) -> Result<String>;

    fn render_str(
        &self,
        name: Option<&str>,
        template_str: &str,
        request: &Request,
        context: &Dict,
    ) -> Result<String>;
}
