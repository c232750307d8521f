// crates/release-evidence-core/src/runtime/raw_json.rs
// ============================================================================
// Module: Raw JSON Rewriting
// Description: Order-preserving top-level JSON objects with raw member values.
// Purpose: Filter one array member of a document without touching anything else.
// Dependencies: serde, serde_json (raw_value)
// ============================================================================

//! ## Overview
//! Served manifests must stay consistent with a platform-scoped view while
//! keeping every field a newer producer may have added. Documents are parsed
//! into an ordered list of `(key, raw value)` pairs; only the array being
//! filtered is re-encoded, every other member is written back byte for byte.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::MapAccess;
use serde::de::Visitor;
use serde::ser::SerializeMap;
use serde_json::Map;
use serde_json::Value;
use serde_json::value::RawValue;

// ============================================================================
// SECTION: Raw Object
// ============================================================================

/// Top-level JSON object with members kept in document order.
#[derive(Debug)]
pub(crate) struct RawObject {
    /// Members in document order (duplicates preserved).
    entries: Vec<(String, Box<RawValue>)>,
}

impl RawObject {
    /// Parses a JSON object.
    pub(crate) fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns true when at least one member has the given key.
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    /// Applies `rewrite` to every member with the given key.
    pub(crate) fn rewrite<F>(&mut self, key: &str, mut rewrite: F) -> Result<(), serde_json::Error>
    where
        F: FnMut(&RawValue) -> Result<Box<RawValue>, serde_json::Error>,
    {
        for (name, value) in &mut self.entries {
            if name == key {
                *value = rewrite(value)?;
            }
        }
        Ok(())
    }

    /// Serializes the object back to bytes.
    pub(crate) fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<'de> Deserialize<'de> for RawObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RawObjectVisitor)
    }
}

/// Visitor collecting object members as raw values.
struct RawObjectVisitor;

impl<'de> Visitor<'de> for RawObjectVisitor {
    type Value = RawObject;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Box<RawValue>>()? {
            entries.push((key, value));
        }
        Ok(RawObject {
            entries,
        })
    }
}

impl Serialize for RawObject {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ============================================================================
// SECTION: Platform Fields
// ============================================================================

/// Platform-identifying fields of an array element.
#[derive(Debug, Default)]
pub(crate) struct PlatformFields {
    /// Explicit platform label.
    pub(crate) platform: String,
    /// Operating system.
    pub(crate) os: String,
    /// Architecture.
    pub(crate) arch: String,
}

impl PlatformFields {
    /// Reads platform fields from an array element.
    ///
    /// Returns `None` when the element is not a JSON object. Members that are
    /// absent or not strings read as empty; every other member is ignored.
    pub(crate) fn from_element(element: &RawValue) -> Option<Self> {
        let object: Map<String, Value> = serde_json::from_str(element.get()).ok()?;
        let field = |name: &str| {
            object.get(name).and_then(Value::as_str).unwrap_or_default().to_string()
        };
        Some(Self {
            platform: field("platform"),
            os: field("os"),
            arch: field("arch"),
        })
    }
}

// ============================================================================
// SECTION: Array Filtering
// ============================================================================

/// Rewrites `document` with the `key` array reduced to elements that `keep`
/// accepts.
///
/// Returns `None` when the document must pass through unchanged: the key is
/// absent, the document is not a JSON object, or the member is not an array.
/// Elements that are not JSON objects never match.
pub(crate) fn filter_array_member<F>(document: &[u8], key: &str, keep: F) -> Option<Vec<u8>>
where
    F: Fn(&PlatformFields) -> bool,
{
    let mut object = RawObject::parse(document).ok()?;
    if !object.contains_key(key) {
        return None;
    }
    object
        .rewrite(key, |value| {
            let elements: Vec<Box<RawValue>> = serde_json::from_str(value.get())?;
            let kept: Vec<&RawValue> = elements
                .iter()
                .filter(|element| {
                    PlatformFields::from_element(element).is_some_and(|fields| keep(&fields))
                })
                .map(|element| &**element)
                .collect();
            serde_json::value::to_raw_value(&kept)
        })
        .ok()?;
    object.to_vec().ok()
}
