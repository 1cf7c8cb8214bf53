use std::cmp::Ordering;
use std::fmt;

/// A parsed order-by key: a field path, optionally prefixed with `-` to sort
/// in descending order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderKey<'a> {
    pub field: &'a str,
    pub descending: bool,
}

/// The collection has no such field to sort on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidField {
    pub field: String,
}

/// A collection that can produce a copy of itself ordered by a key such as
/// `name` or `-author.name`.
pub trait OrderBy: Sized {
    fn order_by(&self, key: &str) -> Result<Self, InvalidField>;
}

impl<'a> OrderKey<'a> {
    /// ```rust
    /// use sorting::sort::OrderKey;
    ///
    /// let key = OrderKey::parse("-author.name").unwrap();
    /// assert_eq!(key.field, "author.name");
    /// assert!(key.descending);
    ///
    /// assert!(OrderKey::parse("name").is_ok_and(|k| !k.descending));
    /// assert!(OrderKey::parse("-").is_err());
    /// assert!(OrderKey::parse("a..b").is_err());
    /// assert!(OrderKey::parse("first name").is_err());
    /// ```
    pub fn parse(key: &'a str) -> Result<Self, InvalidField> {
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key, false),
        };

        let valid_segment = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
        if !field.split('.').all(valid_segment) {
            return Err(InvalidField::new(field));
        }

        Ok(OrderKey { field, descending })
    }

    /// Applies this key's direction to an ascending comparison.
    pub fn direct(&self, ordering: Ordering) -> Ordering {
        match self.descending {
            true => ordering.reverse(),
            false => ordering,
        }
    }

    /// Stably sorts `items` by the key `lookup` extracts from each. Fails if
    /// any item has no such key.
    pub fn sort<'v, T, K, L, C>(&self, items: &'v [T], lookup: L, compare: C) -> Result<Vec<T>, InvalidField>
        where T: Clone, L: Fn(&'v T) -> Option<K>, C: Fn(&K, &K) -> Ordering
    {
        let mut keyed = items.iter()
            .map(|item| lookup(item).map(|key| (key, item)))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| InvalidField::new(self.field))?;

        keyed.sort_by(|(a, _), (b, _)| self.direct(compare(a, b)));
        Ok(keyed.into_iter().map(|(_, item)| item.clone()).collect())
    }
}

impl fmt::Display for OrderKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-")?;
        }

        write!(f, "{}", self.field)
    }
}

impl InvalidField {
    pub fn new<F: Into<String>>(field: F) -> Self {
        InvalidField { field: field.into() }
    }
}

impl fmt::Display for InvalidField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid sort field `{}`", self.field)
    }
}

impl std::error::Error for InvalidField { }

impl crate::error::ErrorDetail for InvalidField {
    fn context(&self) -> Vec<(Option<String>, String)> {
        vec![(Some("field".into()), self.field.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_is_stable_in_both_directions() {
        let items = [("b", 1), ("a", 2), ("b", 3), ("a", 4)];
        let asc = OrderKey::parse("x").unwrap();
        let sorted = asc.sort(&items, |(k, _)| Some(*k), Ord::cmp).unwrap();
        assert_eq!(sorted, [("a", 2), ("a", 4), ("b", 1), ("b", 3)]);

        let desc = OrderKey::parse("-x").unwrap();
        let sorted = desc.sort(&items, |(k, _)| Some(*k), Ord::cmp).unwrap();
        assert_eq!(sorted, [("b", 1), ("b", 3), ("a", 2), ("a", 4)]);
    }

    #[test]
    fn missing_key_is_invalid() {
        let key = OrderKey::parse("-size").unwrap();
        let error = key.sort(&[1, 2, 3], |&n| (n != 2).then_some(n), Ord::cmp).unwrap_err();
        assert_eq!(error, InvalidField::new("size"));
        assert_eq!(error.to_string(), "invalid sort field `size`");
    }

    #[test]
    fn key_round_trips_through_display() {
        assert_eq!(OrderKey::parse("-a.b").unwrap().to_string(), "-a.b");
    }
}
