#![doc = svgbobdoc::transform!(
//! Sortable table columns for minijinja templates.
//!
//! # Overview
//!
//! This crate adds two directives to a [`minijinja`] environment:
//!
//!   * `{% anchor field [title] %}` renders a link that sorts a listing by
//!     `field`, or flips the direction if the listing is already sorted by it.
//!     The active column's title is followed by an arrow.
//!
//!   * `{% autosort items [as sorted] %}` orders the collection `items` the
//!     way the current request asks for and stores the result as `sorted`
//!     (or back into `items`).
//!
//! All sorting state lives in two query parameters, `sort` and `dir`, so a
//! page's links carry it from one request to the next:
//!
//! ```svgbob
//!   GET /people/?sort=name&dir=asc&page=2
//!               |
//!        +------+-------+
//!        |   Request    |
//!        +------+-------+
//!               |
//!      +--------+---------+
//!      |                  |
//!  +---+----+       +-----+----+
//!  | anchor |       | autosort |
//!  +---+----+       +-----+----+
//!      |                  |
//!      v                  v
//!  <a href="?sort=name    people ordered
//!     &page=2&dir=desc">  by "name"
//! ```
//!
//! ## Rendering
//!
//! A host typically:
//!
//! 1. Reads [`config::Settings`] once at startup.
//! 2. Builds an [`templating::Engine`] from them, e.g.
//!    [`templating::minijinja::MiniJinjaEngine`].
//! 3. For every request, parses a [`request::Request`] and renders a template
//!    with it. An error for which [`error::Error::is_not_found()`] holds
//!    should become a 404.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod value;
pub mod config;
pub mod request;
pub mod sort;
pub mod templating;

pub use minijinja;
