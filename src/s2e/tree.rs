/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! In-memory model of an HDF5 file
//!
//! Calculators assemble their results as a tree of groups, datasets and
//! external links and hand the finished tree to a container writer. Readers
//! produce the same tree, so converters never touch a storage backend directly.

use super::errors::{Result, S2eError};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Scalar attribute attached to a group or dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    Float(f64),
    Int(i64),
    Text(String),
}

impl AttrValue {
    /// Numeric value of the attribute, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(value) => Some(*value),
            AttrValue::Int(value) => Some(*value as f64),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// Payload of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetValue {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
    Text(String),
}

/// A dataset with its attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub value: DatasetValue,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Dataset {
    pub fn float(array: ArrayD<f64>) -> Self {
        Self {
            value: DatasetValue::Float(array),
            attrs: BTreeMap::new(),
        }
    }

    pub fn int(array: ArrayD<i64>) -> Self {
        Self {
            value: DatasetValue::Int(array),
            attrs: BTreeMap::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: DatasetValue::Text(text.into()),
            attrs: BTreeMap::new(),
        }
    }

    /// Zero-dimensional float dataset
    pub fn scalar(value: f64) -> Self {
        Self::float(ArrayD::from_elem(IxDyn(&[]), value))
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Shape of the dataset; text datasets are scalars
    pub fn shape(&self) -> Vec<usize> {
        match &self.value {
            DatasetValue::Float(array) => array.shape().to_vec(),
            DatasetValue::Int(array) => array.shape().to_vec(),
            DatasetValue::Text(_) => Vec::new(),
        }
    }

    /// Numeric payload as floats, widening integers
    pub fn to_float(&self) -> Option<ArrayD<f64>> {
        match &self.value {
            DatasetValue::Float(array) => Some(array.clone()),
            DatasetValue::Int(array) => Some(array.mapv(|v| v as f64)),
            DatasetValue::Text(_) => None,
        }
    }
}

/// HDF5 external link to `path` inside `file`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub file: PathBuf,
    pub path: String,
}

impl ExternalLink {
    pub fn new(file: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            path: path.into(),
        }
    }
}

/// A member of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
    ExternalLink(ExternalLink),
}

impl Node {
    fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Dataset(_) => "dataset",
            Node::ExternalLink(_) => "external link",
        }
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<Dataset> for Node {
    fn from(dataset: Dataset) -> Self {
        Node::Dataset(dataset)
    }
}

impl From<ExternalLink> for Node {
    fn from(link: ExternalLink) -> Self {
        Node::ExternalLink(link)
    }
}

/// A group; the root group of a file is a `Group` too
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
    #[serde(default)]
    members: BTreeMap<String, Node>,
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(S2eError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Member names in sorted order
    pub fn keys(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.members.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Look up a member by `/`-separated path relative to this group
    pub fn get(&self, path: &str) -> Option<&Node> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            match current.members.get(*segment)? {
                Node::Group(group) => current = group,
                _ => return None,
            }
        }
        current.members.get(*last)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Insert `node` at `path`, creating intermediate groups.
    ///
    /// An existing member at `path` is replaced.
    pub fn insert(&mut self, path: &str, node: impl Into<Node>) -> Result<()> {
        let segments = split_path(path)?;
        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| S2eError::InvalidPath(path.to_string()))?;
        let parent = self.ensure_segments(parents, path)?;
        parent.members.insert((*last).to_string(), node.into());
        Ok(())
    }

    /// Remove and return the member at `path`
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        let segments = split_path(path).ok()?;
        let (last, parents) = segments.split_last()?;
        let mut current = self;
        for segment in parents {
            match current.members.get_mut(*segment)? {
                Node::Group(group) => current = group,
                _ => return None,
            }
        }
        current.members.remove(*last)
    }

    /// Return the group at `path`, creating it (and its parents) if missing
    pub fn ensure_group(&mut self, path: &str) -> Result<&mut Group> {
        let segments = split_path(path)?;
        self.ensure_segments(&segments, path)
    }

    fn ensure_segments(&mut self, segments: &[&str], full_path: &str) -> Result<&mut Group> {
        let mut current = self;
        for segment in segments {
            let entry = current
                .members
                .entry((*segment).to_string())
                .or_insert_with(|| Node::Group(Group::new()));
            match entry {
                Node::Group(group) => current = group,
                other => {
                    return Err(S2eError::WrongKind {
                        path: format!("{} (in {}, found {})", segment, full_path, other.kind()),
                        expected: "group",
                    })
                }
            }
        }
        Ok(current)
    }

    pub fn group(&self, path: &str) -> Result<&Group> {
        match self.get(path) {
            Some(Node::Group(group)) => Ok(group),
            Some(_) => Err(S2eError::WrongKind {
                path: path.to_string(),
                expected: "group",
            }),
            None => Err(S2eError::MissingMember(path.to_string())),
        }
    }

    pub fn dataset(&self, path: &str) -> Result<&Dataset> {
        match self.get(path) {
            Some(Node::Dataset(dataset)) => Ok(dataset),
            Some(_) => Err(S2eError::WrongKind {
                path: path.to_string(),
                expected: "dataset",
            }),
            None => Err(S2eError::MissingMember(path.to_string())),
        }
    }

    pub fn float_array(&self, path: &str) -> Result<ArrayD<f64>> {
        self.dataset(path)?
            .to_float()
            .ok_or_else(|| S2eError::WrongKind {
                path: path.to_string(),
                expected: "numeric dataset",
            })
    }

    /// Read a scalar; accepts zero-dimensional and single-element datasets
    pub fn float_scalar(&self, path: &str) -> Result<f64> {
        let array = self.float_array(path)?;
        if array.len() != 1 {
            return Err(S2eError::WrongShape {
                path: path.to_string(),
                found: array.shape().to_vec(),
                expected: "a single value".to_string(),
            });
        }
        array
            .iter()
            .next()
            .copied()
            .ok_or_else(|| S2eError::MissingMember(path.to_string()))
    }

    pub fn int_array(&self, path: &str) -> Result<ArrayD<i64>> {
        match &self.dataset(path)?.value {
            DatasetValue::Int(array) => Ok(array.clone()),
            _ => Err(S2eError::WrongKind {
                path: path.to_string(),
                expected: "integer dataset",
            }),
        }
    }

    pub fn text(&self, path: &str) -> Result<&str> {
        match &self.dataset(path)?.value {
            DatasetValue::Text(text) => Ok(text),
            _ => Err(S2eError::WrongKind {
                path: path.to_string(),
                expected: "text dataset",
            }),
        }
    }

    pub fn insert_float(&mut self, path: &str, array: ArrayD<f64>) -> Result<()> {
        self.insert(path, Dataset::float(array))
    }

    pub fn insert_int(&mut self, path: &str, array: ArrayD<i64>) -> Result<()> {
        self.insert(path, Dataset::int(array))
    }

    pub fn insert_scalar(&mut self, path: &str, value: f64) -> Result<()> {
        self.insert(path, Dataset::scalar(value))
    }

    pub fn insert_text(&mut self, path: &str, text: &str) -> Result<()> {
        self.insert(path, Dataset::text(text))
    }

    pub fn insert_link(
        &mut self,
        path: &str,
        file: impl Into<PathBuf>,
        target: impl Into<String>,
    ) -> Result<()> {
        self.insert(path, ExternalLink::new(file, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_insert_creates_intermediate_groups() {
        let mut root = Group::new();
        root.insert_scalar("params/beam/photonEnergy", 8.6e3).unwrap();

        assert!(root.contains("params"));
        assert!(root.contains("params/beam"));
        assert_eq!(root.float_scalar("/params/beam/photonEnergy").unwrap(), 8.6e3);
        assert_eq!(root.group("params").unwrap().keys(), vec!["beam"]);
    }

    #[test]
    fn test_insert_through_dataset_fails() {
        let mut root = Group::new();
        root.insert_scalar("version", 0.2).unwrap();
        let err = root.insert_scalar("version/minor", 1.0).unwrap_err();
        assert!(matches!(err, S2eError::WrongKind { .. }));
    }

    #[test]
    fn test_invalid_paths() {
        let mut root = Group::new();
        assert!(root.insert_scalar("", 1.0).is_err());
        assert!(root.insert_scalar("data/../x", 1.0).is_err());
        assert!(root.get("///").is_none());
    }

    #[test]
    fn test_typed_readers() {
        let mut root = Group::new();
        root.insert_int("data/Z", arr1(&[6_i64, 8]).into_dyn()).unwrap();
        root.insert_float("data/r", arr2(&[[0.0, 1.0, 2.0]]).into_dyn()).unwrap();
        root.insert_text("info/contact", "simex").unwrap();

        assert_eq!(root.float_array("data/Z").unwrap().as_slice().unwrap(), &[6.0, 8.0]);
        assert_eq!(root.int_array("data/Z").unwrap().len(), 2);
        assert!(root.int_array("data/r").is_err());
        assert_eq!(root.text("info/contact").unwrap(), "simex");
        assert!(matches!(
            root.float_scalar("data/Z"),
            Err(S2eError::WrongShape { .. })
        ));
        assert!(matches!(
            root.dataset("data/missing"),
            Err(S2eError::MissingMember(_))
        ));
    }

    #[test]
    fn test_remove_and_replace() {
        let mut root = Group::new();
        root.insert_scalar("misc/a", 1.0).unwrap();
        root.insert_scalar("misc/a", 2.0).unwrap();
        assert_eq!(root.float_scalar("misc/a").unwrap(), 2.0);
        assert!(root.remove("misc/a").is_some());
        assert!(root.group("misc").unwrap().is_empty());
    }
}
