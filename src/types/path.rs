//! Namespaced resource paths (`namespace:category/name`).

use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace used when an identifier has none.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A normalized, namespaced resource path such as `demo:item/custom_stick`.
///
/// Equality, hashing and ordering all follow the normalized `namespace:value`
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath {
    full: String,
    split: usize,
}

impl ResourcePath {
    /// Create a path from an explicit namespace and value.
    pub fn new(namespace: &str, value: &str) -> Result<Self> {
        let namespace = namespace.to_lowercase();
        let value = normalize_file_path(value);
        validate_namespace(&namespace)?;
        validate_value(&value)?;
        Ok(Self {
            split: namespace.len(),
            full: format!("{}:{}", namespace, value),
        })
    }

    /// Parse `namespace:value`, defaulting to the `minecraft` namespace.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_fallback(input, DEFAULT_NAMESPACE)
    }

    /// Parse `namespace:value`, defaulting to `fallback` when no namespace is given.
    pub fn parse_with_fallback(input: &str, fallback: &str) -> Result<Self> {
        match input.split_once(':') {
            Some((namespace, value)) => Self::new(namespace, value),
            None => Self::new(fallback, input),
        }
    }

    /// Resolve a reference written inside the file at `reference`.
    ///
    /// `./x` and `../x` are relative to the parent directory of `reference`,
    /// `<namespace>` expands to the namespace of `reference`, and bare values
    /// inherit that namespace.
    pub fn resolve(input: &str, reference: &ResourcePath) -> Result<Self> {
        let input = input.replace("<namespace>", reference.namespace());
        if !input.starts_with("./") && !input.starts_with("../") {
            return Self::parse_with_fallback(&input, reference.namespace());
        }

        let mut segments: Vec<&str> = reference
            .parent_directory()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        for segment in input.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PackError::invalid_path(
                            input.clone(),
                            format!("escapes the namespace root of '{}'", reference),
                        ));
                    }
                }
                other => segments.push(other),
            }
        }
        Self::new(reference.namespace(), &segments.join("/"))
    }

    /// Recover the resource path of a file stored under `content/<namespace>/`.
    ///
    /// `extension` (e.g. `.mesh.json`) is stripped from the end.
    pub fn from_content_path(file_path: &str, extension: &str) -> Result<Self> {
        let stripped = file_path
            .strip_prefix("content/")
            .ok_or_else(|| PackError::invalid_path(file_path, "not under content/"))?;
        let stripped = stripped.strip_suffix(extension).unwrap_or(stripped);
        match stripped.split_once('/') {
            Some((namespace, value)) => Self::new(namespace, value),
            None => Err(PackError::invalid_path(file_path, "missing namespace directory")),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.full[..self.split]
    }

    pub fn value(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The last segment of the value (e.g. `stick` for `minecraft:item/stick`).
    pub fn file_name(&self) -> &str {
        let value = self.value();
        value.rsplit_once('/').map(|(_, name)| name).unwrap_or(value)
    }

    /// Directory part of the value, empty for top-level values.
    pub fn parent_directory(&self) -> &str {
        let value = self.value();
        value.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Append a raw suffix to the value.
    pub fn append(&self, suffix: &str) -> Result<Self> {
        Self::new(self.namespace(), &format!("{}{}", self.value(), suffix))
    }

    /// `content/<namespace>/<value>`
    pub fn content_path(&self) -> String {
        format!("content/{}/{}", self.namespace(), self.value())
    }

    /// `assets/<namespace>/<category>/<value>`
    pub fn assets_path(&self, category: &str) -> String {
        format!("assets/{}/{}/{}", self.namespace(), category, self.value())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl std::str::FromStr for ResourcePath {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = PackError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.full
    }
}

/// Normalize a slash-separated file path: lowercase, forward slashes,
/// no leading or trailing separator.
pub fn normalize_file_path(path: &str) -> String {
    path.to_lowercase()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Join path segments with `/`, normalizing each one and skipping empties.
pub fn join_file_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| normalize_file_path(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn is_valid_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(PackError::invalid_path(namespace, "empty namespace"));
    }
    if let Some(c) = namespace.chars().find(|c| !is_valid_namespace_char(*c)) {
        return Err(PackError::invalid_path(
            namespace,
            format!("non [a-z0-9_.-] character '{}' in namespace", c),
        ));
    }
    Ok(())
}

fn validate_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(PackError::invalid_path(value, "empty value"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !is_valid_namespace_char(*c) && *c != '/')
    {
        return Err(PackError::invalid_path(
            value,
            format!("non [a-z0-9/._-] character '{}'", c),
        ));
    }
    Ok(())
}
