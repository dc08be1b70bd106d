// crates/rum-core/src/runtime/settings.rs
// ============================================================================
// Module: Settings Accessor
// Description: Lazily loaded, cached access to persisted monitor settings.
// Purpose: Give every component one consistent view of the current settings.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! [`SettingsAccessor`] loads settings from the [`OptionStore`] on first use,
//! merges the stored fields over the configured defaults, and caches the
//! result. Updates are clamped, persisted, and then replace the cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::Settings;
use crate::core::SettingsUpdate;
use crate::interfaces::OPTION_SETTINGS;
use crate::interfaces::OptionStore;
use crate::interfaces::OptionStoreError;

// ============================================================================
// SECTION: Accessor
// ============================================================================

/// Cached settings accessor.
#[derive(Clone)]
pub struct SettingsAccessor {
    /// Backing option store.
    options: Arc<dyn OptionStore>,
    /// Defaults applied beneath stored values.
    defaults: Settings,
    /// Cached settings after the first load.
    cache: Arc<Mutex<Option<Settings>>>,
}

impl SettingsAccessor {
    /// Creates an accessor over the option store with the given defaults.
    #[must_use]
    pub fn new(options: Arc<dyn OptionStore>, defaults: Settings) -> Self {
        Self {
            options,
            defaults: defaults.normalized(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the current settings, loading them on first use.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the stored value cannot be read or decoded.
    pub fn get(&self) -> Result<Settings, OptionStoreError> {
        let mut cache = self.lock_cache()?;
        if let Some(settings) = cache.as_ref() {
            return Ok(settings.clone());
        }
        let loaded = self.load()?;
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    /// Applies a partial update, persists it, and returns the saved settings.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the settings cannot be read or written.
    pub fn update(&self, update: SettingsUpdate) -> Result<Settings, OptionStoreError> {
        let mut cache = self.lock_cache()?;
        let current = match cache.as_ref() {
            Some(settings) => settings.clone(),
            None => self.load()?,
        };
        let next = current.apply(update);
        let encoded = serde_json::to_string(&next)
            .map_err(|err| OptionStoreError::Invalid(err.to_string()))?;
        self.options.set(OPTION_SETTINGS, &encoded)?;
        *cache = Some(next.clone());
        Ok(next)
    }

    /// Deletes persisted settings and drops the cache.
    ///
    /// # Errors
    ///
    /// Returns [`OptionStoreError`] when the delete fails.
    pub fn reset(&self) -> Result<(), OptionStoreError> {
        let mut cache = self.lock_cache()?;
        self.options.delete(OPTION_SETTINGS)?;
        *cache = None;
        Ok(())
    }

    /// Reads and merges stored settings over the defaults.
    fn load(&self) -> Result<Settings, OptionStoreError> {
        let Some(raw) = self.options.get(OPTION_SETTINGS)? else {
            return Ok(self.defaults.clone());
        };
        let stored: SettingsUpdate =
            serde_json::from_str(&raw).map_err(|err| OptionStoreError::Invalid(err.to_string()))?;
        Ok(self.defaults.apply(stored))
    }

    /// Locks the settings cache.
    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, Option<Settings>>, OptionStoreError> {
        self.cache
            .lock()
            .map_err(|_| OptionStoreError::Store("settings cache mutex poisoned".to_string()))
    }
}
