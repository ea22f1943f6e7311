use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Registry document compiled into the crate.
const BUILTIN_REGISTRY: &str = include_str!("../channels.yaml");

/// A channel shown in the player menus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelEntry {
    pub label: String,
    #[serde(rename = "url")]
    pub stream_url: String,
}

impl ChannelEntry {
    pub fn new(label: impl Into<String>, stream_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stream_url: stream_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    default: Option<String>,
    channels: Vec<ChannelEntry>,
}

/**
    Ordered, immutable mapping of channel labels to stream manifest URLs.

    Iteration order is menu display order. Labels are unique and non-empty,
    URLs are non-empty but otherwise opaque.
*/
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    entries: Vec<ChannelEntry>,
    default_index: usize,
}

impl ChannelRegistry {
    pub fn new(entries: Vec<ChannelEntry>) -> Result<Self, RegistryError> {
        Self::with_default(entries, None)
    }

    /**
        Build a registry whose initial channel is `default` instead of the first entry.
    */
    pub fn with_default(
        entries: Vec<ChannelEntry>,
        default: Option<&str>,
    ) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            if entry.label.trim().is_empty() {
                return Err(RegistryError::EmptyLabel(index));
            }
            if entry.stream_url.trim().is_empty() {
                return Err(RegistryError::EmptyUrl(entry.label.clone()));
            }
            if !seen.insert(entry.label.as_str()) {
                return Err(RegistryError::DuplicateLabel(entry.label.clone()));
            }
        }

        let default_index = match default {
            Some(label) => entries
                .iter()
                .position(|e| e.label == label)
                .ok_or_else(|| RegistryError::UnknownDefault(label.to_string()))?,
            None => 0,
        };

        Ok(Self {
            entries,
            default_index,
        })
    }

    /// The registry compiled into the crate.
    pub fn builtin() -> Self {
        Self::from_yaml(BUILTIN_REGISTRY)
            .unwrap_or_else(|e| panic!("embedded channels.yaml is invalid: {e}"))
    }

    pub fn from_yaml(document: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument = serde_yaml::from_str(document)?;
        Self::with_default(doc.channels, doc.default.as_deref())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_yaml(&document)
    }

    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelEntry> {
        self.entries.iter()
    }

    pub fn get(&self, label: &str) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    /// The channel loaded before any user interaction.
    pub fn default_entry(&self) -> &ChannelEntry {
        &self.entries[self.default_index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChannelRegistry {
    type Item = &'a ChannelEntry;
    type IntoIter = std::slice::Iter<'a, ChannelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
