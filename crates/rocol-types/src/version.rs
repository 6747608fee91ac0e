use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version number of a versioned object, rendered `v1`, `v2`, ...
///
/// Versions start at 1 and only ever grow by one per committed transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VersionId(u32);

impl VersionId {
    /// The first version of every object.
    pub const FIRST: Self = Self(1);

    pub fn new(number: u32) -> Result<Self, TypeError> {
        if number == 0 {
            return Err(TypeError::InvalidVersion("versions start at v1".into()));
        }
        Ok(Self(number))
    }

    pub fn number(&self) -> u32 {
        self.0
    }

    /// The version that follows this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionId(v{})", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .ok_or_else(|| TypeError::InvalidVersion(s.to_string()))?;
        let number = digits
            .parse::<u32>()
            .map_err(|_| TypeError::InvalidVersion(s.to_string()))?;
        Self::new(number)
    }
}

impl From<VersionId> for String {
    fn from(v: VersionId) -> Self {
        v.to_string()
    }
}

impl TryFrom<String> for VersionId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse() {
        let v: VersionId = "v12".parse().unwrap();
        assert_eq!(v.number(), 12);
        assert_eq!(v.to_string(), "v12");
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!("v0".parse::<VersionId>().is_err());
        assert!("12".parse::<VersionId>().is_err());
        assert!("vx".parse::<VersionId>().is_err());
    }

    #[test]
    fn next_increments() {
        assert_eq!(VersionId::FIRST.next().to_string(), "v2");
        assert!(VersionId::FIRST < VersionId::FIRST.next());
    }
}
