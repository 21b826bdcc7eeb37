//! Restaurant (tenant) code.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the restaurant a customer or reservation belongs to.
///
/// Codes are stored upper-cased. The same contact at two restaurants is two
/// distinct customers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantCode(String);

impl RestaurantCode {
    /// Code used when nothing else is configured.
    pub const DEFAULT: &'static str = "CASANOVA2024";

    /// Resolve a caller-supplied code, falling back to `default` when the
    /// value is absent or blank.
    ///
    /// ```
    /// use casanova_core::RestaurantCode;
    ///
    /// let fallback = RestaurantCode::from_default_str();
    /// assert_eq!(RestaurantCode::resolve(Some(" bistro "), &fallback).as_str(), "BISTRO");
    /// assert_eq!(RestaurantCode::resolve(Some("  "), &fallback), fallback);
    /// assert_eq!(RestaurantCode::resolve(None, &fallback), fallback);
    /// ```
    #[must_use]
    pub fn resolve(value: Option<&str>, default: &Self) -> Self {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| default.clone(), |v| Self(v.to_uppercase()))
    }

    /// Resolve the first of several supplied values (e.g. a repeated query
    /// parameter).
    #[must_use]
    pub fn resolve_first<'a>(values: impl IntoIterator<Item = &'a str>, default: &Self) -> Self {
        Self::resolve(values.into_iter().next(), default)
    }

    /// Build a code from configuration, or `None` if it is blank.
    #[must_use]
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_uppercase()))
    }

    /// The built-in default code.
    #[must_use]
    pub fn from_default_str() -> Self {
        Self(Self::DEFAULT.to_owned())
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RestaurantCode {
    fn default() -> Self {
        Self::from_default_str()
    }
}

impl fmt::Display for RestaurantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RestaurantCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uppercases() {
        let code = RestaurantCode::resolve(Some("casanova2024"), &RestaurantCode::default());
        assert_eq!(code.as_str(), "CASANOVA2024");
    }

    #[test]
    fn test_resolve_first_takes_first_value() {
        let default = RestaurantCode::default();
        let code = RestaurantCode::resolve_first(["dissy", "other"], &default);
        assert_eq!(code.as_str(), "DISSY");
        assert_eq!(RestaurantCode::resolve_first([], &default), default);
    }

    #[test]
    fn test_new_rejects_blank() {
        assert!(RestaurantCode::new(" ").is_none());
        assert_eq!(RestaurantCode::new("abc").unwrap().as_str(), "ABC");
    }
}
