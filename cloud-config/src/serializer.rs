//! Conversion between a [`ConfigMap`] and the text stored remotely.

use serde_json::Value;
use shared_types::ConfigMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::StoreError;

/// Text encoding used for a configuration document.
///
/// `Unimplemented` stands in for "no format bound": it never fails, logs a
/// warning and produces `""` / `{}` so generic code paths can still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serializer {
    #[default]
    Yaml,
    Json,
    Unimplemented,
}

impl Serializer {
    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Unimplemented => "unimplemented",
        }
    }

    pub fn serialize(self, data: &ConfigMap) -> Result<String, StoreError> {
        match self {
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Unimplemented => {
                warn!("serialize has no effect without a concrete format");
                Ok(String::new())
            }
        }
    }

    /// Decode document text. Absent, empty and whitespace-only text all
    /// decode to an empty mapping, as does a document whose root is null.
    ///
    /// YAML mapping keys must be strings. A key such as `80:` or `true:` is
    /// a [`StoreError::Serialization`] error instead of being turned into the
    /// string `"80"`, which would change the document on the next save.
    /// Quote such keys (`'80':`) to store them.
    pub fn deserialize(self, text: Option<&str>) -> Result<ConfigMap, StoreError> {
        if self == Self::Unimplemented {
            warn!("deserialize has no effect without a concrete format");
            return Ok(ConfigMap::new());
        }

        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(ConfigMap::new());
        };

        let root: Value = match self {
            Self::Yaml => {
                let raw: serde_yaml::Value = serde_yaml::from_str(text)?;
                check_yaml_keys(&raw)?;
                serde_yaml::from_value(raw)?
            }
            Self::Json => serde_json::from_str(text)?,
            Self::Unimplemented => Value::Null,
        };

        match root {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(ConfigMap::new()),
            other => Err(StoreError::Serialization(format!(
                "document root must be a mapping, found {}",
                kind_of(&other)
            ))),
        }
    }
}

fn check_yaml_keys(value: &serde_yaml::Value) -> Result<(), StoreError> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Mapping(mapping) => mapping.iter().try_for_each(|(key, child)| {
            if !key.is_string() {
                return Err(StoreError::Serialization(format!(
                    "mapping key {} is not a string",
                    describe_key(key)
                )));
            }
            check_yaml_keys(child)
        }),
        Yaml::Sequence(items) => items.iter().try_for_each(check_yaml_keys),
        Yaml::Tagged(tagged) => check_yaml_keys(&tagged.value),
        _ => Ok(()),
    }
}

fn describe_key(key: &serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::String(s) => format!("{s:?}"),
        Yaml::Sequence(_) => "of sequence type".to_string(),
        Yaml::Mapping(_) => "of mapping type".to_string(),
        Yaml::Tagged(tagged) => format!("tagged {}", tagged.tag),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

impl FromStr for Serializer {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(StoreError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ConfigMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a mapping"),
        }
    }

    fn nested_fixture() -> ConfigMap {
        map(json!({
            "name": "service",
            "port": 8080,
            "ratio": 0.25,
            "enabled": true,
            "missing": null,
            "tags": ["a", "b", 3],
            "database": {
                "host": "db.internal",
                "replicas": [{"host": "r1"}, {"host": "r2"}]
            }
        }))
    }

    #[test]
    fn test_yaml_deserialize() {
        let parsed = Serializer::Yaml
            .deserialize(Some("foo: bar\nbar: baz"))
            .unwrap();
        assert_eq!(parsed, map(json!({"foo": "bar", "bar": "baz"})));
    }

    #[test]
    fn test_yaml_serialize() {
        let text = Serializer::Yaml
            .serialize(&map(json!({"foo": "bar"})))
            .unwrap();
        assert_eq!(text, "foo: bar\n");
    }

    #[test]
    fn test_yaml_round_trip_nested_document() {
        let data = nested_fixture();
        let text = Serializer::Yaml.serialize(&data).unwrap();
        assert_eq!(Serializer::Yaml.deserialize(Some(&text)).unwrap(), data);
    }

    #[test]
    fn test_json_round_trip_nested_document() {
        let data = nested_fixture();
        let text = Serializer::Json.serialize(&data).unwrap();
        assert_eq!(Serializer::Json.deserialize(Some(&text)).unwrap(), data);
    }

    #[test]
    fn test_empty_text_is_empty_mapping() {
        for serializer in [Serializer::Yaml, Serializer::Json] {
            assert!(serializer.deserialize(None).unwrap().is_empty());
            assert!(serializer.deserialize(Some("")).unwrap().is_empty());
            assert!(serializer.deserialize(Some("  \n")).unwrap().is_empty());
        }
    }

    #[test]
    fn test_null_yaml_document_is_empty_mapping() {
        assert!(Serializer::Yaml.deserialize(Some("~\n")).unwrap().is_empty());
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        let err = Serializer::Yaml
            .deserialize(Some("- a\n- b\n"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(msg) if msg.contains("sequence")));
    }

    #[test]
    fn test_non_string_yaml_key_is_rejected() {
        let err = Serializer::Yaml
            .deserialize(Some("ports:\n  80: http\n"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(msg) if msg.contains("key 80")));

        let err = Serializer::Yaml
            .deserialize(Some("rules:\n  - true: allow\n"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(msg) if msg.contains("key true")));
    }

    #[test]
    fn test_quoted_numeric_yaml_key_is_kept() {
        let parsed = Serializer::Yaml
            .deserialize(Some("ports:\n  '80': http\n"))
            .unwrap();
        assert_eq!(parsed, map(json!({"ports": {"80": "http"}})));

        let text = Serializer::Yaml.serialize(&parsed).unwrap();
        assert_eq!(Serializer::Yaml.deserialize(Some(&text)).unwrap(), parsed);
    }

    #[test]
    fn test_malformed_text_is_serialization_error() {
        let err = Serializer::Json.deserialize(Some("{not json")).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_unimplemented_returns_empty_results() {
        let dumped = Serializer::Unimplemented
            .serialize(&map(json!({"foo": "bar"})))
            .unwrap();
        assert_eq!(dumped, "");

        let parsed = Serializer::Unimplemented
            .deserialize(Some("foo: bar"))
            .unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("yaml".parse::<Serializer>().unwrap(), Serializer::Yaml);
        assert_eq!("YML".parse::<Serializer>().unwrap(), Serializer::Yaml);
        assert_eq!("json".parse::<Serializer>().unwrap(), Serializer::Json);
        assert!(matches!(
            "toml".parse::<Serializer>(),
            Err(StoreError::UnknownFormat(name)) if name == "toml"
        ));
    }

    #[test]
    fn test_default_is_yaml() {
        assert_eq!(Serializer::default(), Serializer::Yaml);
        assert_eq!(Serializer::default().to_string(), "yaml");
    }
}
