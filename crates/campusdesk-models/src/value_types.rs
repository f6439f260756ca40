//! Validated primitive wrappers.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEmail(pub String);

impl std::error::Error for InvalidEmail {}

impl fmt::Display for InvalidEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid email: {}", self.0)
    }
}

/// A syntactically valid email address, stored lowercase and trimmed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, format = "email", example = "ada.staff@campus.test")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, InvalidEmail> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(InvalidEmail("email cannot be empty".into()));
        }
        if !email.validate_email() {
            return Err(InvalidEmail(format!("'{}' is not a valid email address", email)));
        }
        Ok(Self(email))
    }

    /// Wraps a value already validated on insert (database rows).
    #[inline]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The part before `@`.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// The last dot-separated segment of the local part, e.g. `staff` in
    /// `ada.staff@campus.test`. `None` if the local part has no dot.
    pub fn tag(&self) -> Option<&str> {
        self.local_part()
            .rsplit_once('.')
            .map(|(_, tag)| tag)
            .filter(|tag| !tag.is_empty())
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = InvalidEmail;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl Type<sqlx::Postgres> for Email {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for Email {
    fn decode(
        value: <sqlx::Postgres as Database>::ValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        <String as Decode<'r, sqlx::Postgres>>::decode(value).map(Self::new_unchecked)
    }
}

impl PgHasArrayType for Email {
    fn array_type_info() -> PgTypeInfo {
        <String as PgHasArrayType>::array_type_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::new("  Ada.Staff@Campus.TEST ").unwrap();
        assert_eq!(email.as_str(), "ada.staff@campus.test");
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("no-at-sign").is_err());
        assert!("two@@signs.test".parse::<Email>().is_err());
    }

    #[test]
    fn test_tag() {
        assert_eq!(Email::new("ada.staff@x.test").unwrap().tag(), Some("staff"));
        assert_eq!(
            Email::new("mary.jane.student@x.test").unwrap().tag(),
            Some("student")
        );
        assert_eq!(Email::new("plain@x.test").unwrap().tag(), None);
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Email>(r#""bob.student@x.test""#).is_ok());
        assert!(serde_json::from_str::<Email>(r#""bob""#).is_err());
    }
}
