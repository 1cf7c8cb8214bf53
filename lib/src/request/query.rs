use std::fmt;

use url::form_urlencoded;

/// Decoded query parameters in the order they appeared.
///
/// A key may carry several values; lookups see the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string, without the
    /// leading `?`.
    pub fn parse(raw: &str) -> Self {
        form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// The last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn append<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Removes every value for `key`, returning the last.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let mut last = None;
        self.pairs.retain_mut(|(k, v)| match k == key {
            true => { last = Some(std::mem::take(v)); false }
            false => true,
        });

        last
    }

    /// Replaces every value for `key` with `value`, which moves to the end.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        let key = key.into();
        self.remove(&key);
        self.append(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes `self` as `application/x-www-form-urlencoded`.
    ///
    /// ```rust
    /// use sorting::request::Query;
    ///
    /// let query = Query::parse("q=big+cats&page=2&tag=a%26b");
    /// assert_eq!(query.get("q"), Some("big cats"));
    /// assert_eq!(query.get("tag"), Some("a&b"));
    /// assert_eq!(query.encode(), "q=big+cats&page=2&tag=a%26b");
    /// ```
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let pairs = iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Query { pairs }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.encode().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::Query;

    #[test]
    fn remove_takes_every_value() {
        let mut query = Query::parse("a=1&b=2&a=3");
        assert_eq!(query.remove("a"), Some("3".into()));
        assert!(!query.contains("a"));
        assert_eq!(query.encode(), "b=2");
        assert_eq!(query.remove("a"), None);
    }

    #[test]
    fn set_moves_key_to_the_end() {
        let mut query = Query::parse("dir=asc&page=2");
        query.set("dir", "desc");
        assert_eq!(query.encode(), "page=2&dir=desc");
        assert_eq!(query.get_all("dir").collect::<Vec<_>>(), ["desc"]);
    }

    #[test]
    fn empty_values_survive() {
        let query = Query::parse("flag&x=");
        assert_eq!(query.get("flag"), Some(""));
        assert_eq!(query.encode(), "flag=&x=");
    }
}
