//! Serde adapter for `Option<Option<T>>` fields.
//!
//! An element with an optional attribute is modelled as
//! `Option<Option<T>>`: the outer level is the element, the inner one the
//! attribute. Plain serde collapses `Some(None)` into `null` and reads it
//! back as `None`. With this adapter a missing field is `None` and `null`
//! is `Some(None)`:
//!
//! ```ignore
//! #[serde(default, skip_serializing_if = "Option::is_none", with = "virtxml_marshal::double_option")]
//! pub apic: Option<Option<OnOff>>,
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
