// ── Declared attribute values ──
//
// A declared attribute is in one of three states. `Unset` is the only one
// that lets an update fall back to what the remote object already holds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One attribute of a declared record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// Never configured.
    #[default]
    Unset,
    /// Explicitly cleared.
    Null,
    /// A concrete value. For collections, `Value(vec![])` is an explicit empty.
    Value(T),
}

impl<T> Field<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` for `Unset` and `Null`.
    pub fn is_absent(&self) -> bool {
        !matches!(self, Self::Value(_))
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` becomes `Null`.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Unset => Field::Unset,
            Self::Null => Field::Null,
            Self::Value(v) => Field::Value(f(v)),
        }
    }
}

impl<T: Clone> Field<T> {
    /// Scalar resolution: declared value, else the prior remote value
    /// (only when `Unset`), else `default`.
    pub fn resolve(&self, prior: Option<&T>, default: impl FnOnce() -> T) -> T {
        match self {
            Self::Value(v) => v.clone(),
            Self::Unset => prior.cloned().unwrap_or_else(default),
            Self::Null => default(),
        }
    }
}

impl<T: Clone> Field<Vec<T>> {
    /// Collection resolution: `Null` sends an empty list, `Unset` keeps the
    /// prior remote list (or empty on create).
    pub fn resolve_collection(&self, prior: Option<&[T]>) -> Vec<T> {
        match self {
            Self::Value(v) => v.clone(),
            Self::Unset => prior.map(<[T]>::to_vec).unwrap_or_default(),
            Self::Null => Vec::new(),
        }
    }

    /// The explicit-empty marker produced by flatten.
    pub fn empty() -> Self {
        Self::Value(Vec::new())
    }

    /// Declared items, or an empty slice when absent.
    pub fn items(&self) -> &[T] {
        self.as_value().map(Vec::as_slice).unwrap_or_default()
    }
}

impl Field<String> {
    /// The trimmed value, if set and non-blank.
    pub fn non_blank(&self) -> Option<&str> {
        self.as_value().map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

// ── Serde ────────────────────────────────────────────────────────────
//
// `Unset` must be skipped by the container
// (`skip_serializing_if = "Field::is_unset"`); on its own it writes `null`.

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unset | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_option(Option::<T>::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Probe {
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        name: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_unset")]
        ports: Field<Vec<String>>,
    }

    #[test]
    fn missing_key_is_unset_and_null_is_null() {
        let probe: Probe = serde_json::from_value(json!({"ports": null})).unwrap();
        assert!(probe.name.is_unset());
        assert!(probe.ports.is_null());

        let back = serde_json::to_value(&probe).unwrap();
        assert_eq!(back, json!({"ports": null}));
    }

    #[test]
    fn scalar_resolution_order() {
        let prior = "FOO".to_string();
        let default = || "NEVER".to_string();

        assert_eq!(Field::Value("ALWAYS".to_string()).resolve(Some(&prior), default), "ALWAYS");
        assert_eq!(Field::<String>::Unset.resolve(Some(&prior), default), "FOO");
        assert_eq!(Field::<String>::Unset.resolve(None, default), "NEVER");
        assert_eq!(Field::<String>::Null.resolve(Some(&prior), default), "NEVER");
    }

    #[test]
    fn collection_resolution_order() {
        let prior = vec!["80".to_string(), "80".to_string()];

        assert_eq!(Field::<Vec<String>>::Unset.resolve_collection(Some(prior.as_slice())), prior);
        assert!(Field::<Vec<String>>::Null.resolve_collection(Some(&prior[..])).is_empty());
        assert!(Field::<Vec<String>>::empty().resolve_collection(Some(&prior[..])).is_empty());
        assert!(Field::<Vec<String>>::Unset.resolve_collection(None).is_empty());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(Field::Value("  42 ".to_string()).non_blank(), Some("42"));
        assert_eq!(Field::Value("   ".to_string()).non_blank(), None);
        assert_eq!(Field::<String>::Null.non_blank(), None);
    }
}
