//! Externally configurable values.
//!
//! A [`Setting`] is a value bound once at startup through a
//! [`SettingsBackend`]. The backend contract is a single operation,
//! [`register_setting`](SettingsBackend::register_setting), which must
//! invoke the setter callback before returning, either with the initial
//! value or with a value recovered from the backend's store. Settings are
//! therefore always in a valid state once constructed.
//!
//! Two reference backends are provided: [`ConstBackend`], which always
//! echoes the initial value, and [`JsonFileBackend`], which recovers
//! values from a JSON object read from a stream and silently falls back to
//! the initial value for missing keys or decoding failures.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tracing::debug;

/// Logical identifier of a setting in its backend store.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SettingId {
    /// Key of the setting, e.g. within a configuration file.
    pub key: String,
}

impl SettingId {
    /// Creates a setting identifier from a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl From<&str> for SettingId {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SettingId {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Access to a store of user-configurable values.
///
/// Implementations must call `setter` at least once before returning from
/// [`register_setting`](Self::register_setting).
pub trait SettingsBackend {
    /// Registers a setting and resolves its value.
    fn register_setting<T, F>(&mut self, id: SettingId, initial: T, setter: F)
    where
        T: DeserializeOwned + Clone + Send + 'static,
        F: FnMut(T);
}

/// A minimal backend that resolves every setting to its initial value.
#[derive(Copy, Clone, Debug, Default)]
pub struct ConstBackend {}

impl ConstBackend {
    /// Constructs a new `ConstBackend` object.
    pub fn new() -> Self {
        Self {}
    }
}

impl SettingsBackend for ConstBackend {
    fn register_setting<T, F>(&mut self, _id: SettingId, initial: T, mut setter: F)
    where
        T: DeserializeOwned + Clone + Send + 'static,
        F: FnMut(T),
    {
        // This setting never changes, so the setter is called with the
        // initial value and that is the end of it.
        setter(initial);
    }
}

/// A backend resolving settings from a JSON object read from a stream.
pub struct JsonFileBackend {
    values: serde_json::Value,
}

impl JsonFileBackend {
    /// Reads the backing JSON object from the stream.
    ///
    /// A stream that cannot be parsed as JSON behaves like an empty store:
    /// every setting registered afterwards resolves to its initial value.
    pub fn new(reader: impl io::Read) -> Self {
        let values = match serde_json::from_reader(reader) {
            Ok(values) => values,
            Err(e) => {
                debug!(error = %e, "settings stream is not valid JSON, using initial values");
                serde_json::Value::Null
            }
        };

        Self { values }
    }
}

impl SettingsBackend for JsonFileBackend {
    fn register_setting<T, F>(&mut self, id: SettingId, initial: T, mut setter: F)
    where
        T: DeserializeOwned + Clone + Send + 'static,
        F: FnMut(T),
    {
        let mut value = initial;
        if let Some(raw) = self.values.get(&id.key) {
            match serde_json::from_value(raw.clone()) {
                Ok(v) => value = v,
                Err(e) => {
                    debug!(key = %id.key, error = %e, "setting failed to decode, using initial value");
                }
            }
        }

        setter(value);
    }
}

impl fmt::Debug for JsonFileBackend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("JsonFileBackend").finish_non_exhaustive()
    }
}

/// A user-configurable value, resolved once at construction.
///
/// The value is cached; [`get`](Setting::get) returns the cached value and
/// never touches the backend again. Clones share the cache.
pub struct Setting<T> {
    cache: Arc<Mutex<T>>,
}

impl<T> Setting<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Registers the setting with the backend and resolves its value.
    pub fn new<B: SettingsBackend>(
        id: impl Into<SettingId>,
        backend: &mut B,
        initial: T,
    ) -> Self {
        let cache = Arc::new(Mutex::new(initial.clone()));

        let c = cache.clone();
        backend.register_setting(id.into(), initial, move |value| {
            *c.lock().unwrap() = value;
        });

        Self { cache }
    }

    /// Returns the resolved value.
    pub fn get(&self) -> T {
        self.cache.lock().unwrap().clone()
    }
}

impl<T> Clone for Setting<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<T> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Setting").finish_non_exhaustive()
    }
}
