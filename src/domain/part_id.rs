use std::{fmt, hash::Hash, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

/// A validated identifier naming an assembly, component, or sub-component.
///
/// A `PartId` is any non-empty string once surrounding whitespace is
/// stripped. Comparison is exact: callers that need case-insensitive
/// matching normalize to uppercase at the boundary (the CLI and the BOM
/// file loader both do), never inside the traversal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartId(NonEmptyString);

impl PartId {
    /// Creates a new `PartId` from a string, trimming surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPartIdError`] if the string is empty or contains
    /// only whitespace.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidPartIdError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidPartIdError(s));
        }
        let inner = NonEmptyString::new(trimmed.to_string())
            .map_err(|_| InvalidPartIdError(s))?;
        Ok(Self(inner))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns a copy of this identifier folded to uppercase.
    ///
    /// This is the boundary normalization applied to externally supplied
    /// identifiers before they enter the engine.
    #[must_use]
    pub fn to_uppercase(&self) -> Self {
        // Uppercasing cannot empty a non-empty string; the fallback is
        // unreachable but keeps this panic-free.
        NonEmptyString::new(self.0.as_str().to_uppercase())
            .map_or_else(|_| self.clone(), Self)
    }
}

impl Hash for PartId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl TryFrom<String> for PartId {
    type Error = InvalidPartIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PartId {
    type Error = InvalidPartIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for PartId {
    type Err = InvalidPartIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PartId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for PartId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for PartId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a string is not a valid part identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid part identifier {0:?}: must not be empty")]
pub struct InvalidPartIdError(String);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use test_case::test_case;

    use super::*;

    #[test_case("WHEEL", "WHEEL"; "plain identifier")]
    #[test_case("  WHEEL  ", "WHEEL"; "surrounding whitespace trimmed")]
    #[test_case("hub-3/4", "hub-3/4"; "punctuation preserved")]
    #[test_case("A", "A"; "single character")]
    fn new_accepts_valid_identifiers(input: &str, expected: &str) {
        let id = PartId::new(input).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[test_case(""; "empty string")]
    #[test_case("   "; "only whitespace")]
    #[test_case("\t\n"; "only control whitespace")]
    fn new_rejects_blank_identifiers(input: &str) {
        assert!(PartId::new(input).is_err());
    }

    #[test]
    fn comparison_is_exact() {
        let upper = PartId::new("WHEEL").unwrap();
        let lower = PartId::new("wheel").unwrap();
        assert_ne!(upper, lower);
        assert_eq!(lower.to_uppercase(), upper);
    }

    #[test]
    fn from_str_roundtrip() {
        let id: PartId = "GEARBOX".parse().unwrap();
        assert_eq!(id.to_string(), "GEARBOX");
    }

    #[test]
    fn hash_matches_equality() {
        let mut set = HashSet::new();
        set.insert(PartId::new("AXLE").unwrap());
        assert!(set.contains(&PartId::new("AXLE").unwrap()));
        assert!(!set.contains(&PartId::new("axle").unwrap()));
    }

    #[test]
    fn deref_exposes_str_methods() {
        let id = PartId::new("FRAME").unwrap();
        assert!(id.starts_with("FR"));
        assert_eq!(id.len(), 5);
    }

    #[test]
    fn error_display() {
        let error = PartId::new("  ").unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid part identifier \"  \": must not be empty"
        );
    }
}
