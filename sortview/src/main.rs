use std::path::Path;
use std::process::ExitCode;

use sorting::{err, error};
use sorting::error::Result;
use sorting::request::Request;
use sorting::templating::{Engine, EngineInit};
use sorting::templating::minijinja::MiniJinjaEngine;
use sorting::value::{Dict, Format, Json, Toml, Value};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

mod config;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Renders a template for a request URL, the way a server would.
        cmd sortview {
            /// Directory containing the templates.
            required templates: PathBuf
            /// Template to render, relative to the template directory.
            required template: String
            /// Request target, such as `/people/?sort=name&dir=asc`.
            required target: String
            /// TOML or JSON file whose top-level table is the template context.
            optional -d, --data data: PathBuf
            /// TOML file with a `[sorting]` table and template globals. Defaults to
            /// `sortview.toml` in the template directory or its parent.
            optional -c, --config config: PathBuf
        }
    }
}

/// Exit status when the request names something that doesn't exist.
const NOT_FOUND: u8 = 2;

pub fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let flags = flags::Sortview::from_env_or_exit();
    match run(&flags) {
        Ok(html) => {
            print!("{html}");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_not_found() => {
            eprintln!("not found: {e}");
            ExitCode::from(NOT_FOUND)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(flags: &flags::Sortview) -> Result<String> {
    let config = Config::discover(flags.config.as_deref(), &flags.templates)?;
    let context = match &flags.data {
        Some(path) => read_data(path)?,
        None => Dict::new(),
    };

    let engine = MiniJinjaEngine::init(Some(flags.templates.as_path()), config.sorting, &config.globals);
    let request = Request::parse(&flags.target);
    tracing::info!(template = %flags.template, order_by = %request.order_by(), "rendering");
    engine.render(&flags.template, &request, &context)
}

fn read_data(path: &Path) -> Result<Dict> {
    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Json::read(path)?,
        Some("toml") => Toml::read(path)?,
        _ => return err! {
            "unsupported data file format",
            "path" => path.display(),
            "expected" => "a `.toml` or `.json` file",
        },
    };

    value.into_dict()
        .map(|dict| (*dict).clone())
        .map_err(|value| error! {
            "data file must contain a table",
            "path" => path.display(),
            "found value type" => value.kind(),
        })
}
