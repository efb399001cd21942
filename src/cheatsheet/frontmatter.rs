//! Reading and writing the YAML metadata block at the top of a cheatsheet.
//!
//! The managed keys are read as text, so a version written as `3.10` stays
//! `3.10`. Every other key is kept in `extra`, in file order, and written
//! back after the managed ones. A managed key holding a list or a mapping is
//! also left in `extra` untouched; its first scalar is used as the value.

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde_yaml::{Mapping, Value};
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub tech: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub last_reviewed: Option<String>,
    pub extra: Mapping,
}

const DELIMITER: &str = "---";
const KEY_TITLE: &str = "title";
const KEY_TECH: &str = "tech";
const KEY_VERSION: &str = "version";
const KEY_STATUS: &str = "status";
const KEY_LAST_REVIEWED: &str = "lastReviewed";
const KEY_LAST_REVIEWED_ALT: &str = "last_reviewed";

/// Reads the listed keys of the top-level mapping as strings and skips the
/// rest, so plain scalars keep their spelling.
struct ScalarKeys<'a>(&'a [String]);

impl<'de, 'a> DeserializeSeed<'de> for ScalarKeys<'a> {
    type Value = Vec<(String, Option<String>)>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a> Visitor<'de> for ScalarKeys<'a> {
    type Value = Vec<(String, Option<String>)>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a front-matter mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut values = Vec::new();
        while let Some(key) = map.next_key::<Value>()? {
            match key.as_str() {
                Some(key) if self.0.iter().any(|k| k == key) => {
                    values.push((key.to_string(), map.next_value::<Option<String>>()?));
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(values)
    }
}

/// Splits `content` into its front-matter block (without delimiters) and body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let rest = match content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    {
        Some(rest) => rest,
        None => return (None, content),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, content)
}

fn is_managed(key: &str) -> bool {
    matches!(
        key,
        KEY_TITLE | KEY_TECH | KEY_VERSION | KEY_STATUS | KEY_LAST_REVIEWED | KEY_LAST_REVIEWED_ALT
    )
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(items) => items.iter().find_map(scalar_text),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Mapping(_) => None,
    }
}

fn set_managed(front: &mut FrontMatter, key: &str, value: Option<String>) {
    let slot = match key {
        KEY_TITLE => &mut front.title,
        KEY_TECH => &mut front.tech,
        KEY_VERSION => &mut front.version,
        KEY_STATUS => &mut front.status,
        _ => &mut front.last_reviewed,
    };
    *slot = value;
}

/// Parses a front-matter block. An empty block gives an empty `FrontMatter`.
pub fn parse_front_matter(block: &str) -> Result<FrontMatter, serde_yaml::Error> {
    let blank = block.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(FrontMatter::default());
    }

    let mapping = match serde_yaml::from_str::<Value>(block)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => Mapping::new(),
        _ => {
            return Err(<serde_yaml::Error as serde::de::Error>::custom(
                "front-matter is not a mapping",
            ))
        }
    };

    let mut front = FrontMatter::default();
    let mut scalar_keys = Vec::new();
    for (key, value) in mapping {
        let managed = key.as_str().filter(|k| is_managed(k)).map(str::to_string);
        let nested = matches!(value, Value::Sequence(_) | Value::Mapping(_));
        if let Some(name) = &managed {
            set_managed(&mut front, name, scalar_text(&value));
            if !nested {
                scalar_keys.push(name.clone());
            }
        }
        if managed.is_none() || nested {
            front.extra.insert(key, value);
        }
    }

    // Numbers read through `Value` lose their spelling (`3.10` becomes 3.1),
    // so scalar managed keys are read again as strings.
    let texts = ScalarKeys(&scalar_keys).deserialize(serde_yaml::Deserializer::from_str(block))?;
    for (name, text) in texts {
        set_managed(&mut front, &name, clean(text));
    }

    Ok(front)
}

/// Renders `front` followed by `body`. Managed keys come first in a fixed order.
pub fn render(front: &FrontMatter, body: &str) -> Result<String, serde_yaml::Error> {
    let mut mapping = Mapping::new();
    let managed = [
        (KEY_TITLE, &front.title),
        (KEY_TECH, &front.tech),
        (KEY_VERSION, &front.version),
        (KEY_STATUS, &front.status),
        (KEY_LAST_REVIEWED, &front.last_reviewed),
    ];
    for (key, value) in managed {
        if let Some(value) = value {
            if !front.extra.contains_key(key) {
                mapping.insert(Value::from(key), Value::from(value.as_str()));
            }
        }
    }
    for (key, value) in &front.extra {
        mapping.insert(key.clone(), value.clone());
    }

    let mut out = String::with_capacity(body.len() + 256);
    out.push_str(DELIMITER);
    out.push('\n');
    if !mapping.is_empty() {
        out.push_str(&serde_yaml::to_string(&mapping)?);
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}
