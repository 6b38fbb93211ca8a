//! Dynamic payload values.
//!
//! Records carry "arbitrary values — numbers, strings, booleans, nested
//! mappings and ordered sequences" (spec §3). That is exactly the shape
//! `serde_json::Value` already models, so rather than reinvent a parallel
//! tagged union we reuse it directly: every stage, the filter grammar, and
//! the validation schema all operate over [`Value`].

/// A single field value within a record's payload.
///
/// Re-exported as a type alias rather than a newtype so that `serde_json`'s
/// full `Value` API (indexing, `as_*` accessors, `Display`) is usable
/// without an extra layer of wrapping.
pub type Value = serde_json::Value;

/// A record payload: a string-keyed mapping to [`Value`]s.
///
/// `serde_json::Map` preserves insertion order when the `preserve_order`
/// feature is enabled on `serde_json`'s `indexmap` backing store; we don't
/// rely on that here, but field iteration order being deterministic is a
/// pleasant side effect for things like `remap`'s merge semantics.
pub type Payload = serde_json::Map<String, Value>;

/// Resolve a dotted field path (`a.b.c`) against a payload, left to right
/// through nested objects.
///
/// Returns `None` if any segment is missing or the path traverses through
/// a non-object value. Used by the filter grammar (spec §4.6) and by
/// validation (spec §4.7.validation) for nested schemas.
pub fn resolve_path<'a>(payload: &'a Payload, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = payload.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Payload {
        json!({
            "level": "error",
            "nested": { "inner": { "leaf": 42 } }
        })
        .as_object()
        .cloned()
        .unwrap_or_default()
    }

    #[test]
    fn resolves_top_level_field() {
        let p = payload();
        assert_eq!(resolve_path(&p, "level").unwrap(), "error");
    }

    #[test]
    fn resolves_nested_field() {
        let p = payload();
        assert_eq!(resolve_path(&p, "nested.inner.leaf").unwrap(), 42);
    }

    #[test]
    fn missing_field_resolves_to_none() {
        let p = payload();
        assert!(resolve_path(&p, "missing").is_none());
        assert!(resolve_path(&p, "nested.missing").is_none());
    }

    #[test]
    fn traversing_through_scalar_resolves_to_none() {
        let p = payload();
        assert!(resolve_path(&p, "level.nope").is_none());
    }
}
