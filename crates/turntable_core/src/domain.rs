//! crates/turntable_core/src/domain.rs
//!
//! Defines the core data structures for the turntable: categories, their
//! resources and the per-type selection pointers.
//!
//! Deserialization is lenient: nulls and missing fields in old local snapshots
//! fall back to defaults instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Prefix marking a category id that has never been persisted remotely.
pub const TEMPORARY_ID_PREFIX: &str = "custom-";

//=========================================================================================
// Category Type
//=========================================================================================

/// The two kinds of category the turntable picks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryType {
    Project,
    #[default]
    Learning,
}

impl CategoryType {
    pub const ALL: [CategoryType; 2] = [CategoryType::Project, CategoryType::Learning];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Project => "project",
            CategoryType::Learning => "learning",
        }
    }

    /// Anything that is not exactly `project` counts as `learning`.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "project" {
            CategoryType::Project
        } else {
            CategoryType::Learning
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing, used for user input rather than stored data.
impl FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(CategoryType::Project),
            "learning" => Ok(CategoryType::Learning),
            other => Err(format!("unknown category type '{}'", other)),
        }
    }
}

impl Serialize for CategoryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .filter(|tag| !tag.is_empty())
            .map(CategoryType::from_tag)
            .unwrap_or_default())
    }
}

//=========================================================================================
// Identifiers
//=========================================================================================

/// A category identifier: either a temporary client token or a server UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh placeholder id for a category that only exists locally.
    pub fn temporary() -> Self {
        Self(format!("{}{}", TEMPORARY_ID_PREFIX, Uuid::new_v4().simple()))
    }

    /// True for empty ids and ids carrying the temporary prefix.
    pub fn is_unsaved(&self) -> bool {
        self.0.is_empty() || self.0.starts_with(TEMPORARY_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CategoryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

//=========================================================================================
// Resources and Categories
//=========================================================================================

/// A single link-based learning item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "truthy")]
    pub completed: bool,
}

impl Resource {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            link: link.into(),
            completed: false,
        }
    }

    /// A resource is only worth keeping if it has both a title and a link.
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.link.is_empty()
    }
}

/// A labeled group of learning resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "lenient_category_id")]
    pub id: CategoryId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: CategoryType,
    #[serde(default, deserialize_with = "truthy")]
    pub selected: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub resources: Vec<Resource>,
}

impl Category {
    /// Creates an unsaved category with a temporary id.
    pub fn new(label: impl Into<String>, description: impl Into<String>, kind: CategoryType) -> Self {
        Self {
            id: CategoryId::temporary(),
            label: label.into(),
            description: description.into(),
            kind,
            selected: false,
            resources: Vec::new(),
        }
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }
}

/// The writable columns of a category row, as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDraft {
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub selected: bool,
}

impl From<&Category> for CategoryDraft {
    fn from(category: &Category) -> Self {
        Self {
            label: category.label.clone(),
            description: category.description.clone(),
            kind: category.kind,
            selected: category.selected,
        }
    }
}

//=========================================================================================
// Selection Pointers
//=========================================================================================

/// The currently picked category id for each category type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionPointers {
    #[serde(default)]
    pub project: Option<CategoryId>,
    #[serde(default)]
    pub learning: Option<CategoryId>,
}

impl SelectionPointers {
    pub fn get(&self, kind: CategoryType) -> Option<&CategoryId> {
        match kind {
            CategoryType::Project => self.project.as_ref(),
            CategoryType::Learning => self.learning.as_ref(),
        }
    }

    pub fn set(&mut self, kind: CategoryType, id: Option<CategoryId>) {
        match kind {
            CategoryType::Project => self.project = id,
            CategoryType::Learning => self.learning = id,
        }
    }
}

//=========================================================================================
// Lenient Deserialization Helpers
//=========================================================================================

/// Reads a possibly-null value, substituting the type's default for `null`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads any JSON value as a flag using loose truthiness.
pub fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

/// Backend ids arrive as strings or numbers. Anything else, including `""`, is no id.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(&Value::deserialize(deserializer)?))
}

fn lenient_category_id<'de, D>(deserializer: D) -> Result<CategoryId, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_id(deserializer)?.map(CategoryId::new).unwrap_or_default())
}

/// Reads a list, skipping elements that do not parse. A non-array reads as empty.
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => parse_each(items),
        _ => Vec::new(),
    })
}

/// Like [`lenient_list`], but the value itself must be an array.
pub fn lenient_array<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(parse_each(Vec::<Value>::deserialize(deserializer)?))
}

fn parse_each<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// `null`, `false`, `0`, `NaN` and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
