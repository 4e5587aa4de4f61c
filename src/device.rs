// Device-local key/value store, the server-side stand-in for a browser's
// local storage. Preferences and unsaved drafts live here, not in the
// posts database: losing this file loses nothing that was ever saved.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use crate::journal::model::{Author, FontSize};

pub const KEY_SELECTED_AUTHOR: &str = "selectedAuthor";
pub const KEY_FONT_SIZE: &str = "fontSize";

/// String key/value store with last-write-wins semantics. Reads and
/// writes never fail from the caller's point of view; persistence
/// problems degrade to in-memory operation with a logged warning.
pub trait DeviceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// `DeviceStore` persisted as a flat JSON object in the data directory.
pub struct JsonDeviceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonDeviceStore {
    /// Loads the store from `path`, starting empty when the file is
    /// missing. A corrupt file is logged and treated as empty rather
    /// than taking the diary down.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt device store {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, values: Mutex::new(values) }
    }

    fn persist(&self, values: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(values) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize device store: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!("Failed to write device store {}: {}", self.path.display(), e);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock only means another thread panicked mid-write;
        // the map itself is still usable.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeviceStore for JsonDeviceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.lock();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

/// Who is writing and how big the text should render. Missing or
/// unreadable values fall back to the defaults: father, large.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub selected_author: Author,
    pub font_size: FontSize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self { selected_author: Author::Father, font_size: FontSize::default() }
    }
}

impl Preferences {
    /// Reads both preferences, writing the defaults back on first use so
    /// the stored state matches what the views will show.
    pub fn load(store: &dyn DeviceStore) -> Self {
        let defaults = Self::default();
        Self {
            selected_author: read_or_init(
                store,
                KEY_SELECTED_AUTHOR,
                defaults.selected_author,
                Author::as_str,
            ),
            font_size: read_or_init(store, KEY_FONT_SIZE, defaults.font_size, FontSize::as_str),
        }
    }

    pub fn set_selected_author(store: &dyn DeviceStore, author: Author) {
        store.set(KEY_SELECTED_AUTHOR, author.as_str());
    }

    pub fn set_font_size(store: &dyn DeviceStore, size: FontSize) {
        store.set(KEY_FONT_SIZE, size.as_str());
    }
}

fn read_or_init<T: FromStr + Copy>(
    store: &dyn DeviceStore,
    key: &str,
    default: T,
    as_str: fn(&T) -> &'static str,
) -> T {
    match store.get(key).map(|v| v.parse()) {
        Some(Ok(value)) => value,
        _ => {
            store.set(key, as_str(&default));
            default
        }
    }
}

/// Unsaved comment text, kept per author under `draft_father` and
/// `draft_mother` so switching the author mid-thought loses neither.
pub struct DraftCache<'a> {
    store: &'a dyn DeviceStore,
}

impl<'a> DraftCache<'a> {
    pub fn new(store: &'a dyn DeviceStore) -> Self {
        Self { store }
    }

    pub fn get(&self, author: Author) -> Option<String> {
        self.store.get(&draft_key(author))
    }

    pub fn set(&self, author: Author, comment: &str) {
        self.store.set(&draft_key(author), comment);
    }

    pub fn clear(&self, author: Author) {
        self.store.remove(&draft_key(author));
    }
}

fn draft_key(author: Author) -> String {
    format!("draft_{author}")
}
