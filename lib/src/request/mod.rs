//! The parts of an HTTP request the sorting directives read.

mod query;

pub use query::*;

use crate::sort::Direction;
use crate::dict;
use crate::value::{Dict, Value};

/// Query parameter naming the field to sort on.
pub const SORT_PARAM: &str = "sort";

/// Query parameter naming the direction to sort in.
pub const DIR_PARAM: &str = "dir";

/// A request path and its decoded query parameters.
///
/// All sorting state lives in the query string, so a `Request` is all that's
/// needed to reconstruct it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    path: String,
    query: Query,
}

impl Request {
    pub fn new<P: Into<String>>(path: P, query: Query) -> Self {
        Request { path: path.into(), query }
    }

    /// Parses a request target such as `/people/?sort=name&dir=asc`. Anything
    /// after a `#` is ignored.
    ///
    /// ```rust
    /// use sorting::request::Request;
    ///
    /// let request = Request::parse("/people/?sort=name&page=2#top");
    /// assert_eq!(request.path(), "/people/");
    /// assert_eq!(request.query().get("page"), Some("2"));
    /// assert_eq!(request.sort(), Some("name"));
    /// ```
    pub fn parse(target: &str) -> Self {
        let target = target.split_once('#').map_or(target, |(target, _)| target);
        match target.split_once('?') {
            Some((path, query)) => Request::new(path, Query::parse(query)),
            None => Request::new(target, Query::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The field currently sorted on, if any.
    pub fn sort(&self) -> Option<&str> {
        self.query.get(SORT_PARAM)
    }

    /// The direction currently sorted in.
    pub fn direction(&self) -> Direction {
        Direction::parse(self.query.get(DIR_PARAM))
    }

    /// The order-by key for this request: the sort field, prefixed with `-`
    /// unless the direction is explicitly ascending.
    ///
    /// ```rust
    /// use sorting::request::Request;
    ///
    /// assert_eq!(Request::parse("/?sort=name").order_by(), "-name");
    /// assert_eq!(Request::parse("/?sort=name&dir=desc").order_by(), "-name");
    /// assert_eq!(Request::parse("/?sort=name&dir=asc").order_by(), "name");
    /// assert_eq!(Request::parse("/").order_by(), "-");
    /// assert_eq!(Request::parse("/?dir=asc").order_by(), "");
    /// ```
    pub fn order_by(&self) -> String {
        let field = self.sort().unwrap_or("");
        match self.direction().is_descending() {
            true => format!("-{field}"),
            false => field.to_string(),
        }
    }
}

/// The view of a request templates see as `request`.
impl From<&Request> for Value {
    fn from(request: &Request) -> Self {
        let dict: Dict = dict! {
            "path" => request.path(),
            "query" => request.query().encode(),
            "sort" => request.sort(),
            "dir" => request.direction().as_str(),
            "order_by" => request.order_by(),
        };

        Value::from(dict)
    }
}
