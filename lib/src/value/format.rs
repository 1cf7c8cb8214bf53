use std::sync::Arc;

use crate::error::{ErrorDetail, Result, Chainable};
use crate::value::Source;

pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`. Usually called indirectly via
    /// [`Format::read()`].
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<I: Source, T: serde::de::DeserializeOwned>(input: I) -> Result<T> {
        let path = input.path().map(|p| p.display().to_string());
        let input = input.try_read::<Arc<str>>()?;
        Self::from_str(&input).chain_with(|| match path {
            Some(path) => error!("failed to parse input", "file path" => path),
            None => error!("failed to parse input"),
        })
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Copy, Clone)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error);
impl_format!(Json: serde_json::from_str, serde_json::error::Error);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn reads_toml_and_json_into_values() {
        let toml: Value = Toml::read("[[people]]\nname = \"Ann\"\nage = 31\n").unwrap();
        let json: Value = Json::read(r#"{"people": [{"name": "Ann", "age": 31}]}"#).unwrap();
        assert_eq!(toml, json);
        assert_eq!(toml.find("people.0.name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn parse_errors_carry_context() {
        let error = Json::read::<_, Value>("{ nope").unwrap_err();
        assert!(error.to_string().starts_with("failed to parse input"));
    }
}
