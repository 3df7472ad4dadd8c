use serde::{Deserialize, Serialize};

/// Logical purpose of a cache storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKey {
    /// Application shell: root document, offline page, manifest, icons
    Shell,
    /// Scripts, styles and other build assets
    Runtime,
    /// Listing photos and other images
    Image,
    /// API responses
    Api,
}

impl NamespaceKey {
    pub const ALL: [NamespaceKey; 4] = [
        NamespaceKey::Shell,
        NamespaceKey::Runtime,
        NamespaceKey::Image,
        NamespaceKey::Api,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKey::Shell => "shell",
            NamespaceKey::Runtime => "runtime",
            NamespaceKey::Image => "image",
            NamespaceKey::Api => "api",
        }
    }
}

impl std::fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps namespace keys to versioned storage names.
///
/// The version is fixed at construction; a new worker build carries a new
/// version, and activation evicts every storage whose name is not in the
/// current set. Exactly one live storage name exists per key.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    version: u32,
}

impl NamespaceRegistry {
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn storage_name(&self, key: NamespaceKey) -> String {
        format!("{}-v{}", key, self.version)
    }

    /// The full set of storage names owned by this version.
    pub fn current_set(&self) -> Vec<String> {
        NamespaceKey::ALL
            .iter()
            .map(|key| self.storage_name(*key))
            .collect()
    }

    pub fn is_current(&self, storage_name: &str) -> bool {
        NamespaceKey::ALL
            .iter()
            .any(|key| self.storage_name(*key) == storage_name)
    }
}
