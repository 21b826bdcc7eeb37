//! Phone number normalization to E.164.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`NormalizedPhone`] or [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty once formatting is removed.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a character that is neither a digit nor formatting.
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// Fewer digits than any dialable international number.
    #[error("phone number must have at least {min} digits")]
    TooShort {
        /// Minimum digit count, country code included.
        min: usize,
    },
    /// More digits than E.164 allows.
    #[error("phone number must have at most {max} digits")]
    TooLong {
        /// Maximum digit count, country code included.
        max: usize,
    },
    /// The country calling code is malformed.
    #[error("invalid country calling code: {0}")]
    InvalidCountryCode(String),
    /// The value was expected to be stored in E.164 form already.
    #[error("phone number is not in E.164 form: {0}")]
    NotCanonical(String),
}

/// An international calling code, e.g. `33` for France.
///
/// Used as the default when a phone number is written in national format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountryCode(u16);

impl CountryCode {
    /// France, the default for national-format numbers.
    pub const FRANCE: Self = Self(33);

    /// Parse a calling code such as `"33"` or `"+33"`.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::InvalidCountryCode`] unless the input is 1-3
    /// digits without a leading zero.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits = s.trim().trim_start_matches('+');
        let invalid = || PhoneError::InvalidCountryCode(s.to_owned());

        if digits.is_empty()
            || digits.len() > 3
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        digits.parse().map(Self).map_err(|_| invalid())
    }

    /// Returns the calling code as a number.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self::FRANCE
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.0)
    }
}

/// A phone number in E.164 form (`+` followed by 8-15 digits).
///
/// ## Normalization
///
/// - Spaces, dots, dashes, slashes, and parentheses are stripped
/// - A `00` international prefix becomes `+`
/// - A leading trunk `0`, or a bare national number, gets the default
///   country code
///
/// ## Examples
///
/// ```
/// use casanova_core::{CountryCode, NormalizedPhone};
///
/// let a = NormalizedPhone::parse("06 12 34 56 78", CountryCode::FRANCE).unwrap();
/// let b = NormalizedPhone::parse("+33 6-12-34-56-78", CountryCode::FRANCE).unwrap();
/// assert_eq!(a.as_str(), "+33612345678");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Minimum digit count (country code included).
    pub const MIN_DIGITS: usize = 8;
    /// Maximum digit count (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Normalize a raw phone number to E.164.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains characters other than
    /// digits and common formatting, or does not have 8-15 digits.
    pub fn parse(s: &str, default_country: CountryCode) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        let (international, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len() + 3);
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '\t' | '.' | '-' | '/' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        let e164_digits = if international {
            digits
        } else if let Some(after_prefix) = digits.strip_prefix("00") {
            after_prefix.to_owned()
        } else {
            let national = digits.strip_prefix('0').unwrap_or(&digits);
            format!("{}{national}", default_country.get())
        };

        if e164_digits.starts_with('0') {
            return Err(PhoneError::InvalidCountryCode(e164_digits));
        }
        if e164_digits.len() < Self::MIN_DIGITS {
            return Err(PhoneError::TooShort {
                min: Self::MIN_DIGITS,
            });
        }
        if e164_digits.len() > Self::MAX_DIGITS {
            return Err(PhoneError::TooLong {
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{e164_digits}")))
    }

    /// Wrap a value that is already in E.164 form (e.g. read back from storage).
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not `+` followed by 8-15 digits.
    pub fn from_e164(s: &str) -> Result<Self, PhoneError> {
        if !s.starts_with('+') {
            return Err(PhoneError::NotCanonical(s.to_owned()));
        }
        let parsed = Self::parse(s, CountryCode::FRANCE)?;
        if parsed.0 == s {
            Ok(parsed)
        } else {
            Err(PhoneError::NotCanonical(s.to_owned()))
        }
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Only the canonical E.164 form is accepted, as stored and serialized.
impl TryFrom<String> for NormalizedPhone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_e164(&value)
    }
}

impl From<NormalizedPhone> for String {
    fn from(phone: NormalizedPhone) -> Self {
        phone.0
    }
}

impl AsRef<str> for NormalizedPhone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for NormalizedPhone {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for NormalizedPhone {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for NormalizedPhone {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
