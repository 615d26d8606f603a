use revmeta_types::MetaValue;
use serde::{Deserialize, Serialize};

/// Field values submitted alongside an autosave, already decoded from the
/// transport. Keys keep submission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftFields(Vec<(String, MetaValue)>);

impl DraftFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing an earlier submission of the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder form of [`DraftFields::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<MetaValue>> FromIterator<(K, V)> for DraftFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.set(k, v);
        }
        fields
    }
}

/// Result of a metadata read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaRead {
    /// First value only, if any.
    Single(Option<MetaValue>),
    /// Every value, in insertion order.
    All(Vec<MetaValue>),
}

impl MetaRead {
    /// Builds a read result from a full value list.
    pub fn from_values(values: Vec<MetaValue>, single: bool) -> Self {
        if single {
            Self::Single(values.into_iter().next())
        } else {
            Self::All(values)
        }
    }

    /// The first value, regardless of read mode.
    pub fn first(&self) -> Option<&MetaValue> {
        match self {
            Self::Single(v) => v.as_ref(),
            Self::All(values) => values.first(),
        }
    }

    pub fn into_values(self) -> Vec<MetaValue> {
        match self {
            Self::Single(v) => v.into_iter().collect(),
            Self::All(values) => values,
        }
    }
}
