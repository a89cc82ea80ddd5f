//! JSON pointers addressing nodes of the annotation trees
//!
//! Both trees are addressed with RFC 6901 pointers. Abstract pointers use the
//! `targets`/`terms`/`content`/`attributes` vocabulary, concrete ones the
//! `targets`/`assignments`/`items`/`value`/`properties` vocabulary.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::{CdsEditError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// The empty pointer, addressing the document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a pointer string, `""` and `"/"` both being the root
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() || text == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(CdsEditError::pointer_resolution(
                text,
                "pointer must start with '/'",
            ));
        };
        let segments = rest
            .split('/')
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect();
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Numeric value of the last segment
    pub fn last_index(&self) -> Option<usize> {
        self.last().and_then(|segment| segment.parse().ok())
    }

    pub fn parent(&self) -> Option<Pointer> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Ancestor `levels` steps up
    pub fn ancestor(&self, levels: usize) -> Option<Pointer> {
        if levels > self.depth() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - levels].to_vec(),
        })
    }

    pub fn push(&mut self, segment: impl ToString) {
        self.segments.push(segment.to_string());
    }

    /// Return a new pointer with one more segment
    pub fn child(&self, segment: impl ToString) -> Pointer {
        let mut pointer = self.clone();
        pointer.push(segment);
        pointer
    }

    /// Return a new pointer extended with all segments of a relative path
    pub fn join(&self, path: &str) -> Pointer {
        let mut pointer = self.clone();
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            pointer.push(segment);
        }
        pointer
    }

    /// Check if `other` is a prefix of `self` (or equal to it)
    pub fn starts_with(&self, other: &Pointer) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Check if `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &Pointer) -> bool {
        self.depth() < other.depth() && other.starts_with(self)
    }

    /// Segment at a position, if any
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Index following a named segment, e.g. `index_after("targets")`
    pub fn index_after(&self, name: &str) -> Option<usize> {
        self.segments
            .iter()
            .position(|segment| segment == name)
            .and_then(|position| self.segments.get(position + 1))
            .and_then(|segment| segment.parse().ok())
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = CdsEditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

impl Ord for Pointer {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match compare_segments(a, b) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        self.depth().cmp(&other.depth())
    }
}

impl PartialOrd for Pointer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Pointer::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let pointer = Pointer::parse("/targets/0/terms/1/attributes/Term").unwrap();
        assert_eq!(pointer.depth(), 6);
        assert_eq!(pointer.last(), Some("Term"));
        assert_eq!(pointer.to_string(), "/targets/0/terms/1/attributes/Term");
        assert!(Pointer::parse("").unwrap().is_root());
        assert!(Pointer::parse("targets").is_err());
    }

    #[test]
    fn test_escaping() {
        let pointer = Pointer::root().child("a/b").child("c~d");
        assert_eq!(pointer.to_string(), "/a~1b/c~0d");
        assert_eq!(Pointer::parse("/a~1b/c~0d").unwrap(), pointer);
    }

    #[test]
    fn test_numeric_ordering() {
        let mut pointers: Vec<Pointer> = ["/targets/10", "/targets/2", "/targets/2/assignments/0"]
            .iter()
            .map(|text| Pointer::parse(text).unwrap())
            .collect();
        pointers.sort();
        let rendered: Vec<String> = pointers.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["/targets/2", "/targets/2/assignments/0", "/targets/10"]
        );
    }

    #[test]
    fn test_ancestry() {
        let target = Pointer::parse("/targets/1").unwrap();
        let assignment = target.join("assignments/0");
        assert!(target.is_ancestor_of(&assignment));
        assert!(!assignment.is_ancestor_of(&target));
        assert!(!target.is_ancestor_of(&target));
        assert!(assignment.starts_with(&target));
        assert_eq!(assignment.parent().unwrap().parent().unwrap(), target);
        assert_eq!(assignment.last_index(), Some(0));
        assert_eq!(assignment.index_after("targets"), Some(1));
        // "/targets/10" is not a descendant of "/targets/1"
        assert!(!target.is_ancestor_of(&Pointer::parse("/targets/10").unwrap()));
    }

    #[test]
    fn test_serde_as_string() {
        let pointer: Pointer = serde_json::from_str("\"/targets/0\"").unwrap();
        assert_eq!(serde_json::to_string(&pointer).unwrap(), "\"/targets/0\"");
    }
}
