//! Topic paths
//!
//! A [`TopicPath`] is the canonical, immutable form of a slash-delimited topic
//! string such as `/combat/hit`. Any input is a valid topic: empty segments are
//! dropped, a leading `/` is enforced and a trailing `/` is removed, so the
//! empty string, `/` and `//` all denote the root.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Topic separator
pub const SEPARATOR: char = '/';

/// Canonical root topic
pub const ROOT: &str = "/";

/// Split a raw topic into its non-empty segments.
///
/// `//a//b/` and `/a/b` yield the same segments.
pub fn tokenize(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

/// Canonical slash-delimited topic
///
/// Equality, hashing and ordering only look at the canonical value. The parent
/// topic is derived on first request and cached on this instance.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TopicPath {
    value: String,
    parent: OnceLock<Option<Box<TopicPath>>>,
}

impl TopicPath {
    /// Parse any string into a canonical topic. Never fails.
    pub fn parse(raw: &str) -> Self {
        let mut value = String::with_capacity(raw.len() + 1);
        for segment in tokenize(raw) {
            value.push(SEPARATOR);
            value.push_str(segment);
        }
        if value.is_empty() {
            value.push(SEPARATOR);
        }

        Self {
            value,
            parent: OnceLock::new(),
        }
    }

    /// The root topic `/`
    pub fn root() -> Self {
        Self::parse(ROOT)
    }

    /// Canonical string value, always starting with `/`
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Canonical value of the parent topic, `None` for the root
    pub fn parent_value(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        match self.value.rfind(SEPARATOR) {
            Some(0) => Some(ROOT),
            Some(idx) => Some(&self.value[..idx]),
            None => None,
        }
    }

    /// Parent topic, `None` for the root
    pub fn parent(&self) -> Option<&TopicPath> {
        self.parent
            .get_or_init(|| self.parent_value().map(|p| Box::new(TopicPath::parse(p))))
            .as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.value == ROOT
    }

    /// True iff `candidate` is a direct child of this topic.
    pub fn is_parent_of(&self, candidate: &TopicPath) -> bool {
        candidate.parent_value() == Some(self.value.as_str())
    }

    /// True iff this topic lies on the ancestor chain of `candidate`
    /// (strictly above it).
    pub fn is_ancestor_of(&self, candidate: &TopicPath) -> bool {
        if self.depth() >= candidate.depth() {
            return false;
        }
        self.is_root()
            || candidate
                .value
                .strip_prefix(self.value.as_str())
                .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Path segments, root has none
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        tokenize(&self.value)
    }

    /// Number of segments; the root sits at depth 0
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Child topic one segment below this one
    pub fn child(&self, segment: &str) -> TopicPath {
        TopicPath::parse(&format!("{}{}{}", self.value, SEPARATOR, segment))
    }
}

impl PartialEq for TopicPath {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for TopicPath {}

impl PartialEq<str> for TopicPath {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for TopicPath {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl Hash for TopicPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl PartialOrd for TopicPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TopicPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Debug for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TopicPath").field(&self.value).finish()
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for TopicPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for TopicPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for TopicPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TopicPath> for String {
    fn from(topic: TopicPath) -> Self {
        topic.value
    }
}

// Hash/Eq/Ord all delegate to the canonical value, so set lookups by `&str` agree.
impl Borrow<str> for TopicPath {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl AsRef<str> for TopicPath {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Default for TopicPath {
    fn default() -> Self {
        Self::root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "", "/", "//", "a", "/a", "/a/", "//a//b/", "/combat/hit", "combat/hit/", "/x/y/z",
    ];

    #[test]
    fn test_parse_is_canonical_and_idempotent() {
        for raw in SAMPLES {
            let topic = TopicPath::parse(raw);
            assert!(topic.as_str().starts_with('/'), "{raw:?} -> {topic}");
            assert_eq!(TopicPath::parse(topic.as_str()), topic);
        }
    }

    #[test]
    fn test_empty_input_is_root() {
        assert!(TopicPath::parse("").is_root());
        assert!(TopicPath::parse("///").is_root());
        assert_eq!(TopicPath::default(), TopicPath::root());
        assert_eq!(TopicPath::root().parent_value(), None);
        assert!(TopicPath::root().parent().is_none());
    }

    #[test]
    fn test_normalization() {
        assert_eq!(TopicPath::parse("//a//b/"), "/a/b");
        assert_eq!(TopicPath::parse("a"), "/a");
        assert_eq!(TopicPath::parse("/combat/hit/"), TopicPath::parse("/combat/hit"));
    }

    #[test]
    fn test_parent() {
        let topic = TopicPath::parse("/a/b/c");
        assert_eq!(topic.parent_value(), Some("/a/b"));

        let parent = topic.parent().unwrap();
        assert_eq!(parent, &TopicPath::parse("/a/b"));
        assert_eq!(parent.parent().unwrap().parent().unwrap(), &TopicPath::root());

        // cached: same allocation on repeated access
        assert!(std::ptr::eq(topic.parent().unwrap(), topic.parent().unwrap()));
    }

    #[test]
    fn test_is_parent_of_is_strict_and_depth_consistent() {
        let topics: Vec<TopicPath> = SAMPLES.iter().map(|s| TopicPath::parse(s)).collect();
        for a in &topics {
            assert!(!a.is_parent_of(a));
            for b in &topics {
                if a.is_parent_of(b) {
                    assert_eq!(b.depth(), a.depth() + 1);
                }
            }
        }

        let root = TopicPath::root();
        let a = TopicPath::parse("/a");
        let ab = TopicPath::parse("/a/b");
        assert!(root.is_parent_of(&a));
        assert!(a.is_parent_of(&ab));
        assert!(!root.is_parent_of(&ab));
        assert!(!ab.is_parent_of(&a));
    }

    #[test]
    fn test_is_ancestor_of() {
        let root = TopicPath::root();
        let a = TopicPath::parse("/a");
        let abc = TopicPath::parse("/a/b/c");
        let ab_prefix = TopicPath::parse("/ab/c");

        assert!(root.is_ancestor_of(&abc));
        assert!(a.is_ancestor_of(&abc));
        assert!(!a.is_ancestor_of(&ab_prefix));
        assert!(!abc.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut topics = vec![
            TopicPath::parse("/b"),
            TopicPath::parse("/a/z"),
            TopicPath::parse("/a"),
        ];
        topics.sort();
        let values: Vec<&str> = topics.iter().map(TopicPath::as_str).collect();
        assert_eq!(values, vec!["/a", "/a/z", "/b"]);
    }

    #[test]
    fn test_depth_name_and_child() {
        let topic = TopicPath::parse("/combat/hit");
        assert_eq!(topic.depth(), 2);
        assert_eq!(topic.name(), Some("hit"));
        assert_eq!(TopicPath::root().depth(), 0);
        assert_eq!(TopicPath::root().child("combat"), "/combat");
        assert_eq!(topic.child("crit"), "/combat/hit/crit");
    }

    #[test]
    fn test_serde_as_plain_string() {
        let topic = TopicPath::parse("/combat/hit");
        let json = serde_json::to_string(&topic).unwrap();
        assert_eq!(json, "\"/combat/hit\"");

        let back: TopicPath = serde_json::from_str("\"combat//hit/\"").unwrap();
        assert_eq!(back, topic);
    }
}
