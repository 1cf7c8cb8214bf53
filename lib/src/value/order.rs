use crate::sort::{InvalidField, OrderBy, OrderKey};
use crate::value::Value;

impl OrderBy for Value {
    /// Orders an array of dictionaries by the value at a key path. Values of
    /// any other kind are returned as is. `Null` sorts before everything else.
    ///
    /// ```rust
    /// use sorting::dict;
    /// use sorting::sort::OrderBy;
    /// use sorting::value::{Dict, Value};
    ///
    /// let bo: Dict = dict!["name" => "bo", "age" => 40];
    /// let al: Dict = dict!["name" => "al", "age" => 31];
    /// let people = Value::from(vec![bo, al]);
    ///
    /// let sorted = people.order_by("-age").unwrap();
    /// assert_eq!(sorted.find("0.name"), Some(&Value::from("bo")));
    ///
    /// let sorted = people.order_by("name").unwrap();
    /// assert_eq!(sorted.find("0.name"), Some(&Value::from("al")));
    ///
    /// assert!(people.order_by("height").is_err());
    /// ```
    fn order_by(&self, key: &str) -> Result<Self, InvalidField> {
        let key = OrderKey::parse(key)?;
        let Some(items) = self.as_slice() else {
            return Ok(self.clone());
        };

        let sorted = key.sort(items, |item| item.find(key.field), Ord::cmp)?;
        Ok(Value::from_iter(sorted))
    }
}

#[cfg(test)]
mod tests {
    use crate::dict;
    use crate::sort::OrderBy;
    use crate::value::{Dict, Json, Format, Value};

    #[test]
    fn nested_keys_and_stability() {
        let row = |name: &str, team: &str| {
            let team: Dict = dict!["name" => team];
            let row: Dict = dict!["name" => name, "team" => team];
            Value::from(row)
        };

        let rows = Value::from(vec![row("a", "red"), row("b", "blue"), row("c", "red")]);

        let sorted = rows.order_by("team.name").unwrap();
        let names: Vec<_> = sorted.as_slice().unwrap().iter()
            .filter_map(|row| row.find("name")?.as_str())
            .collect();

        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn nulls_sort_first() {
        let rows: Value = Json::read(r#"[{"age": 40}, {"age": null}, {"age": 25}, {"size": 1}]"#).unwrap();
        let ages = |rows: Value| rows.as_slice().unwrap().iter()
            .map(|row| row.find("age").cloned())
            .collect::<Vec<_>>();

        let head = Value::from(rows.as_slice().unwrap()[..3].to_vec());
        assert_eq!(ages(head.order_by("age").unwrap()), [Some(Value::Null), Some(25.into()), Some(40.into())]);
        assert_eq!(ages(head.order_by("-age").unwrap()), [Some(40.into()), Some(25.into()), Some(Value::Null)]);
        assert!(rows.order_by("age").is_err());
    }

    #[test]
    fn non_arrays_are_untouched() {
        let value = Value::from("not a list");
        assert_eq!(value.order_by("name").unwrap(), value);
        assert!(value.order_by("-").is_err());
    }
}
