//! Deserialization helpers for AeroDB REST responses.
//!
//! With the `tracing` feature enabled, [`deserialize_with_warnings`] reports fields the
//! SDK types do not model, so backend schema drift shows up in logs instead of being
//! silently dropped.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize a JSON value into `T`, logging unknown fields and the path of any failure.
#[cfg(feature = "tracing")]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    use std::any::type_name;

    tracing::trace!(type_name = %type_name::<T>(), json = %value, "deserializing JSON");

    let original = value.clone();
    let mut unknown_paths: Vec<String> = Vec::new();

    let result: T = serde_ignored::deserialize(value, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        let json = original.to_string();
        let jd = &mut serde_json::Deserializer::from_str(&json);
        if let Err(path_err) = serde_path_to_error::deserialize::<_, T>(jd) {
            let path = path_err.path().to_string();
            tracing::error!(
                type_name = %type_name::<T>(),
                path = %path,
                value = %describe(lookup_value(&original, &path)),
                error = %path_err.inner(),
                "deserialization failed"
            );
        }
    })?;

    for path in unknown_paths {
        tracing::warn!(
            type_name = %type_name::<T>(),
            field = %path,
            value = %describe(lookup_value(&original, &path)),
            "unknown field in API response"
        );
    }

    Ok(result)
}

/// Pass-through deserialization when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub fn deserialize_with_warnings<T: DeserializeOwned>(value: Value) -> crate::Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Resolves a `serde_ignored` / `serde_path_to_error` path (`user.metadata`, `data[3].id`,
/// `?` for option layers) against `value`.
#[cfg(feature = "tracing")]
fn lookup_value<'value>(value: &'value Value, path: &str) -> Option<&'value Value> {
    path.split(['.', '[', ']'])
        .filter(|segment| !segment.is_empty() && *segment != "?")
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
            _ => None,
        })
}

#[cfg(feature = "tracing")]
fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| "<unable to retrieve>".to_owned(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::deserialize_with_warnings;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        id: String,
        #[serde(default)]
        email_verified: bool,
    }

    #[test]
    fn known_fields_should_deserialize() {
        let profile: Profile =
            deserialize_with_warnings(json!({ "id": "u-1", "email_verified": true }))
                .expect("deserialization failed");

        assert_eq!(
            profile,
            Profile {
                id: "u-1".to_owned(),
                email_verified: true
            }
        );
    }

    #[test]
    fn unknown_fields_should_not_fail() {
        let profile: Profile =
            deserialize_with_warnings(json!({ "id": "u-1", "avatar": { "url": "x" } }))
                .expect("deserialization failed");

        assert_eq!(profile.id, "u-1");
        assert!(!profile.email_verified, "default should apply");
    }

    #[test]
    fn missing_required_field_should_fail() {
        let result: crate::Result<Profile> = deserialize_with_warnings(json!({ "email": "a@b.c" }));

        result.unwrap_err();
    }

    #[test]
    fn null_into_option_should_be_none() {
        let rows: Option<Vec<i32>> =
            deserialize_with_warnings(json!(null)).expect("deserialization failed");

        assert_eq!(rows, None);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn lookup_value_should_follow_dotted_and_indexed_paths() {
        use super::lookup_value;

        let value = json!({ "data": [{ "id": 7 }, { "id": 8, "tags": ["a"] }] });

        assert_eq!(lookup_value(&value, "data[1].id"), Some(&json!(8)));
        assert_eq!(lookup_value(&value, "data.1.tags.0"), Some(&json!("a")));
        assert_eq!(lookup_value(&value, "?.data[0].id"), Some(&json!(7)));
        assert_eq!(lookup_value(&value, "data[9]"), None);
    }
}
