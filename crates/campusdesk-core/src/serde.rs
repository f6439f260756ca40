//! Lenient deserializers for query strings, where `?field=` means "not given".

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filter {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        course_id: Option<Uuid>,
    }

    #[test]
    fn test_empty_string_is_none() {
        let f: Filter = serde_json::from_str(r#"{"course_id":""}"#).unwrap();
        assert!(f.course_id.is_none());
    }

    #[test]
    fn test_missing_is_none() {
        let f: Filter = serde_json::from_str("{}").unwrap();
        assert!(f.course_id.is_none());
    }

    #[test]
    fn test_valid_uuid() {
        let id = Uuid::new_v4();
        let f: Filter = serde_json::from_str(&format!(r#"{{"course_id":"{id}"}}"#)).unwrap();
        assert_eq!(f.course_id, Some(id));
    }

    #[test]
    fn test_invalid_uuid_is_error() {
        assert!(serde_json::from_str::<Filter>(r#"{"course_id":"nope"}"#).is_err());
    }
}
