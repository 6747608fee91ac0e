use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left untouched when a path segment is embedded in an ARCP id.
/// Matches the unreserved set of `encodeURIComponent`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Ordered path segments used to mint an [`ArcpId`].
///
/// Built from a single string or from any sequence of strings. Segment
/// order is significant: `["a", "b"]` and `["b", "a"]` mint different ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append the optional disambiguating id as a trailing segment.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.0.push(id.into());
        self
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for PathSegments {
    fn from(s: &str) -> Self {
        Self(vec![s.to_string()])
    }
}

impl From<String> for PathSegments {
    fn from(s: String) -> Self {
        Self(vec![s])
    }
}

impl From<Vec<String>> for PathSegments {
    fn from(v: Vec<String>) -> Self {
        Self(v)
    }
}

impl From<Vec<&str>> for PathSegments {
    fn from(v: Vec<&str>) -> Self {
        Self(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PathSegments {
    fn from(v: &[&str]) -> Self {
        Self(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PathSegments {
    fn from(v: [&str; N]) -> Self {
        Self(v.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for PathSegments {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Globally meaningful identifier of a collection object.
///
/// An `ArcpId` has the form `arcp://name,<namespace>/<seg1>/<seg2>...`.
/// It is minted deterministically: the same namespace and segments always
/// produce the same id. Minting never fails; an empty namespace or an empty
/// segment list yields an id that is well-formed but useless, so callers
/// must check their inputs before minting.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArcpId(String);

impl ArcpId {
    /// URI scheme prefix shared by every minted id.
    pub const PREFIX: &'static str = "arcp://name,";

    /// Mint an id from a namespace and ordered path segments.
    pub fn mint(namespace: &str, segments: impl Into<PathSegments>) -> Self {
        let segments = segments.into();
        let path = segments
            .as_slice()
            .iter()
            .map(|s| utf8_percent_encode(s, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        Self(format!("{}{namespace}/{path}", Self::PREFIX))
    }

    /// Wrap an already-minted identifier (e.g. one read back from a store).
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace component, if the id carries the ARCP name prefix.
    pub fn namespace(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(Self::PREFIX)?;
        rest.split('/').next()
    }
}

impl fmt::Debug for ArcpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArcpId({})", self.0)
    }
}

impl fmt::Display for ArcpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArcpId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mint_is_deterministic() {
        let a = ArcpId::mint("ns", ["a", "b"]);
        let b = ArcpId::mint("ns", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "arcp://name,ns/a/b");
    }

    #[test]
    fn optional_id_changes_result() {
        let base = ArcpId::mint("ns", ["a", "b"]);
        let with_id = ArcpId::mint("ns", PathSegments::from(["a", "b"]).with_id("item-1"));
        assert_ne!(base, with_id);
        assert_eq!(with_id.as_str(), "arcp://name,ns/a/b/item-1");
    }

    #[test]
    fn single_string_is_one_segment() {
        let id = ArcpId::mint("ns", "corpus");
        assert_eq!(id.as_str(), "arcp://name,ns/corpus");
        let with_id = ArcpId::mint("ns", PathSegments::from("corpus").with_id("x"));
        assert_eq!(with_id.as_str(), "arcp://name,ns/corpus/x");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let id = ArcpId::mint("ns", ["Sound files", "a/b"]);
        assert_eq!(id.as_str(), "arcp://name,ns/Sound%20files/a%2Fb");
    }

    #[test]
    fn segment_order_matters() {
        assert_ne!(ArcpId::mint("ns", ["a", "b"]), ArcpId::mint("ns", ["b", "a"]));
    }

    #[test]
    fn namespace_accessor() {
        let id = ArcpId::mint("sydney-speaks", ["item"]);
        assert_eq!(id.namespace(), Some("sydney-speaks"));
        assert_eq!(ArcpId::from_raw("http://example.com").namespace(), None);
    }

    #[test]
    fn serializes_transparently() {
        let id = ArcpId::mint("ns", "x");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"arcp://name,ns/x\"");
    }

    proptest! {
        #[test]
        fn minting_twice_agrees(ns in "[a-z-]{1,12}", segs in prop::collection::vec(".{0,8}", 1..5)) {
            let first = ArcpId::mint(&ns, segs.clone());
            let second = ArcpId::mint(&ns, segs);
            prop_assert_eq!(first, second);
        }
    }
}
