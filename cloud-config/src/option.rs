//! Hierarchical, mutable view over configuration data.
//!
//! A [`ConfigOption`] holds an optional scalar value and any number of named
//! children at the same time. Children are owned by their parent's map; the
//! upward link is the parent's key path, never a pointer.

use serde_json::Value;
use shared_types::ConfigMap;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// The owner of a [`ConfigOption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    /// Attached directly to a configuration store.
    Root,
    /// Child of another option, identified by that option's key path.
    Node(Vec<String>),
}

/// A node in a configuration tree.
///
/// Indexing with `tree["key"]` in a mutable context creates the child when it
/// is missing, so `tree["db"].set("host", "localhost")` works on an empty
/// tree. [`ConfigOption::get`] never creates anything.
///
/// The parent link and key of a child are rewritten whenever it is reached
/// through [`ConfigOption::entry`], [`ConfigOption::get_mut`],
/// [`ConfigOption::insert`] or mutable indexing. A node assigned in place with
/// `tree["a"] = node` picks up its position on the next such access; use
/// [`ConfigOption::insert`] to attach a subtree and relink it immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOption {
    parent: ParentRef,
    key: Option<String>,
    value: Option<Value>,
    children: BTreeMap<String, ConfigOption>,
}

// Returned when a missing key is read through a shared reference.
static EMPTY: ConfigOption = ConfigOption {
    parent: ParentRef::Root,
    key: None,
    value: None,
    children: BTreeMap::new(),
};

impl ConfigOption {
    /// Create an option owned by `parent`. A `null` value is treated as unset.
    pub fn new(parent: ParentRef, value: Option<Value>) -> Self {
        Self {
            parent,
            key: None,
            value: value.filter(|v| !v.is_null()),
            children: BTreeMap::new(),
        }
    }

    /// Create an empty option attached directly to a store.
    pub fn root() -> Self {
        Self::new(ParentRef::Root, None)
    }

    /// Wrap a mapping into a tree. Nested mappings become children, every
    /// other value is stored on the node for its key.
    pub fn from_map(map: &ConfigMap) -> Self {
        let mut root = Self::root();
        root.extend_from_map(map);
        root
    }

    fn child(&self, key: &str, value: Option<Value>) -> Self {
        Self {
            parent: ParentRef::Node(self.path()),
            key: Some(key.to_string()),
            value: value.filter(|v| !v.is_null()),
            children: BTreeMap::new(),
        }
    }

    // Rewrite the position of this node and, if it moved, of every descendant.
    fn relink(&mut self, parent: ParentRef, key: &str) {
        if self.parent == parent && self.key.as_deref() == Some(key) {
            return;
        }
        self.parent = parent;
        self.key = Some(key.to_string());
        let path = self.path();
        for (child_key, child) in &mut self.children {
            child.relink(ParentRef::Node(path.clone()), child_key);
        }
    }

    fn extend_from_map(&mut self, map: &ConfigMap) {
        for (key, value) in map {
            let mut node = self.child(key, None);
            match value {
                Value::Object(nested) if !nested.is_empty() => node.extend_from_map(nested),
                Value::Null => {}
                other => node.value = Some(other.clone()),
            }
            self.children.insert(key.clone(), node);
        }
    }

    pub fn parent(&self) -> &ParentRef {
        &self.parent
    }

    /// Key this option is stored under in its parent, if it has one.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Full key path from the tree root to this option.
    pub fn path(&self) -> Vec<String> {
        let mut path = match &self.parent {
            ParentRef::Root => Vec::new(),
            ParentRef::Node(parent_path) => parent_path.clone(),
        };
        path.extend(self.key.iter().cloned());
        path
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = Some(value.into()).filter(|v| !v.is_null());
    }

    pub fn take_value(&mut self) -> Option<Value> {
        self.value.take()
    }

    pub fn children(&self) -> &BTreeMap<String, ConfigOption> {
        &self.children
    }

    /// Look up a direct child without creating it.
    pub fn get(&self, key: &str) -> Option<&ConfigOption> {
        self.children.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigOption> {
        let parent = ParentRef::Node(self.path());
        let child = self.children.get_mut(key)?;
        child.relink(parent, key);
        Some(child)
    }

    /// Follow `keys` one level at a time, stopping at the first missing child.
    pub fn lookup(&self, keys: &[&str]) -> Option<&ConfigOption> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Return the child at `key`, inserting an empty one if it is missing.
    pub fn entry(&mut self, key: &str) -> &mut ConfigOption {
        let parent = ParentRef::Node(self.path());
        let child = self
            .children
            .entry(key.to_string())
            .or_insert_with(Self::root);
        child.relink(parent, key);
        child
    }

    /// Replace the child at `key` with a fresh option holding `value`.
    ///
    /// Any children of the replaced option are discarded.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut ConfigOption {
        let node = self.child(key, Some(value.into()));
        self.insert(key, node)
    }

    /// Attach `node` as the child at `key`, replacing any existing child.
    ///
    /// The parent link and key of `node` and all of its descendants are
    /// rewritten to its new position, so a subtree cloned from elsewhere
    /// reports correct paths.
    pub fn insert(&mut self, key: &str, mut node: ConfigOption) -> &mut ConfigOption {
        node.relink(ParentRef::Node(self.path()), key);
        match self.children.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                slot.insert(node);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(node),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigOption> {
        self.children.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when the option has no children. Its value is not considered.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Flatten the subtree into a plain value.
    ///
    /// An option with children becomes a mapping of those children and its
    /// own value is dropped. Otherwise the value is returned, or `null`.
    pub fn to_value(&self) -> Value {
        if self.children.is_empty() {
            self.value.clone().unwrap_or(Value::Null)
        } else {
            Value::Object(self.to_map())
        }
    }

    /// Flatten the children into a mapping, ignoring this option's value.
    pub fn to_map(&self) -> ConfigMap {
        self.children
            .iter()
            .map(|(key, child)| (key.clone(), child.to_value()))
            .collect()
    }
}

impl Default for ConfigOption {
    fn default() -> Self {
        Self::root()
    }
}

impl From<&ConfigMap> for ConfigOption {
    fn from(map: &ConfigMap) -> Self {
        Self::from_map(map)
    }
}

impl Index<&str> for ConfigOption {
    type Output = ConfigOption;

    /// Shared access cannot insert; a missing key yields an empty option.
    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).unwrap_or(&EMPTY)
    }
}

impl IndexMut<&str> for ConfigOption {
    fn index_mut(&mut self, key: &str) -> &mut Self::Output {
        self.entry(key)
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

    #[test]
    fn test_create_top_level() {
        let opt = ConfigOption::root();
        assert!(opt.children().is_empty());
        assert_eq!(opt.parent(), &ParentRef::Root);
        assert!(opt.value().is_none());
        assert!(opt.path().is_empty());
    }

    #[test]
    fn test_create_with_value() {
        let opt = ConfigOption::new(ParentRef::Root, Some(json!("foo")));
        assert!(opt.children().is_empty());
        assert_eq!(opt.value(), Some(&json!("foo")));
    }

    #[test]
    fn test_null_value_is_unset() {
        let opt = ConfigOption::new(ParentRef::Root, Some(Value::Null));
        assert!(opt.value().is_none());
    }

    #[test]
    fn test_create_child_of_option() {
        let mut parent = ConfigOption::root();
        let child = parent.entry("db");
        assert_eq!(child.parent(), &ParentRef::Node(vec![]));
        assert_eq!(child.key(), Some("db"));
        assert!(child.value().is_none());

        let grandchild = child.entry("host");
        assert_eq!(grandchild.parent(), &ParentRef::Node(vec!["db".to_string()]));
        assert_eq!(grandchild.path(), vec!["db".to_string(), "host".to_string()]);
    }

    #[test]
    fn test_get_missing_does_not_insert() {
        let root = ConfigOption::root();
        assert!(root.get("missing").is_none());
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_shared_index_missing_does_not_insert() {
        let root = ConfigOption::root();
        let node = &root["missing"];
        assert!(node.value().is_none());
        assert!(node.is_empty());
        assert!(root.children().is_empty());
    }

    #[test]
    fn test_mutable_index_missing_creates_child() {
        let mut root = ConfigOption::root();
        let node = &mut root["missing"];
        assert!(node.value().is_none());
        assert!(root.contains_key("missing"));
    }

    #[test]
    fn test_index_existing_returns_child_unchanged() {
        let mut root = ConfigOption::root();
        root.set("foo", "bar");
        root["foo"].set("nested", 1);

        assert_eq!(root["foo"].value(), Some(&json!("bar")));
        assert_eq!(root["foo"]["nested"].value(), Some(&json!(1)));
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_set_nested_creates_intermediate_options() {
        let mut root = ConfigOption::root();
        root["a"].set("b", "v");

        assert_eq!(root["a"]["b"].value(), Some(&json!("v")));
        let a = &root.children()["a"];
        assert!(a.value().is_none());
        assert!(a.contains_key("b"));
    }

    #[test]
    fn test_set_replaces_subtree() {
        let mut root = ConfigOption::root();
        root["db"].set("host", "localhost");
        root["db"].set("port", 5432);

        root.set("db", "sqlite://memory");

        assert_eq!(root["db"].value(), Some(&json!("sqlite://memory")));
        assert!(root["db"].is_empty());
    }

    #[test]
    fn test_value_and_children_coexist() {
        let mut root = ConfigOption::root();
        root.set("feature", true);
        root["feature"].set("rollout", 0.5);

        let feature = &root["feature"];
        assert_eq!(feature.value(), Some(&json!(true)));
        assert_eq!(feature["rollout"].value(), Some(&json!(0.5)));
    }

    #[test]
    fn test_lookup_chains_get() {
        let mut root = ConfigOption::root();
        root["a"]["b"].set("c", 3);

        assert_eq!(root.lookup(&["a", "b", "c"]).and_then(ConfigOption::value), Some(&json!(3)));
        assert!(root.lookup(&["a", "x", "c"]).is_none());
        assert!(!root["a"].contains_key("x"));
    }

    #[test]
    fn test_from_map_and_back() {
        let data = map(json!({
            "name": "svc",
            "empty": {},
            "tags": ["x", "y"],
            "db": {"host": "h", "pool": {"size": 4}}
        }));

        let tree = ConfigOption::from_map(&data);
        assert_eq!(tree["db"]["pool"]["size"].value(), Some(&json!(4)));
        assert_eq!(tree["db"]["pool"].path(), vec!["db".to_string(), "pool".to_string()]);
        assert_eq!(tree["tags"].value(), Some(&json!(["x", "y"])));
        assert_eq!(tree.to_map(), data);
    }

    #[test]
    fn test_to_value_prefers_children() {
        let mut root = ConfigOption::root();
        root.set("a", 1);
        root["a"].set("b", 2);
        root.entry("unset");

        assert_eq!(
            Value::Object(root.to_map()),
            json!({"a": {"b": 2}, "unset": null})
        );
    }

    #[test]
    fn test_assigned_node_is_relinked_on_next_access() {
        let mut root = ConfigOption::root();
        root["a"] = ConfigOption::new(ParentRef::Root, Some(json!(1)));
        root["a"].entry("b");

        assert_eq!(root["a"].parent(), &ParentRef::Node(vec![]));
        assert_eq!(root["a"].path(), vec!["a".to_string()]);
        assert_eq!(root["a"]["b"].path(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(root["a"].value(), Some(&json!(1)));
    }

    #[test]
    fn test_assigned_subtree_is_relinked_through_get_mut() {
        let mut subtree = ConfigOption::root();
        subtree["b"].set("c", 3);

        let mut root = ConfigOption::root();
        root["a"] = subtree;
        let a = root.get_mut("a").unwrap();
        assert_eq!(a.path(), vec!["a".to_string()]);
        assert_eq!(
            a["b"]["c"].path(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_insert_relinks_whole_subtree() {
        let mut subtree = ConfigOption::new(ParentRef::Root, Some(json!("v")));
        subtree["b"].set("c", 3);

        let mut root = ConfigOption::root();
        root["x"].insert("a", subtree);

        let b = &root["x"]["a"]["b"];
        assert_eq!(b.parent(), &ParentRef::Node(vec!["x".to_string(), "a".to_string()]));
        assert_eq!(
            b["c"].path(),
            vec!["x".to_string(), "a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(root["x"]["a"].value(), Some(&json!("v")));
    }

    #[test]
    fn test_inserted_clone_takes_new_path() {
        let mut root = ConfigOption::root();
        root["db"].set("host", "localhost");

        let copy = root["db"].clone();
        root.insert("replica", copy);

        assert_eq!(
            root["replica"]["host"].path(),
            vec!["replica".to_string(), "host".to_string()]
        );
        assert_eq!(root["db"]["host"].path(), vec!["db".to_string(), "host".to_string()]);
        assert_eq!(root["replica"]["host"].value(), Some(&json!("localhost")));
    }

    #[test]
    fn test_remove_child() {
        let mut root = ConfigOption::root();
        root.set("a", 1);
        let removed = root.remove("a").unwrap();
        assert_eq!(removed.value(), Some(&json!(1)));
        assert!(root.is_empty());
    }
}
