//! User profile and app settings.

use crate::store::{load_json, save_json, KvStore, DARK_MODE_KEY, USER_INFO_KEY};
use crate::{Error, Result, UserInfo};

/// Stored profile, or an empty one when nothing usable is stored
pub fn load_user_info<S: KvStore + ?Sized>(store: &S) -> UserInfo {
    load_json(store, USER_INFO_KEY).unwrap_or_default()
}

pub fn save_user_info<S: KvStore + ?Sized>(store: &mut S, info: &UserInfo) -> Result<()> {
    save_json(store, USER_INFO_KEY, info)?;
    tracing::info!("Saved profile for {} {}", info.first_name, info.last_name);
    Ok(())
}

/// Dark mode flag; anything other than a stored `"true"` is off
pub fn load_dark_mode<S: KvStore + ?Sized>(store: &S) -> bool {
    match store.get(DARK_MODE_KEY) {
        Ok(Some(value)) => value.trim() == "true",
        Ok(None) => false,
        Err(e) => {
            tracing::warn!("Failed to read dark mode setting: {}. Using light mode.", e);
            false
        }
    }
}

/// Stored as the plain strings `"true"` / `"false"`
pub fn save_dark_mode<S: KvStore + ?Sized>(store: &mut S, enabled: bool) -> Result<()> {
    store
        .set(DARK_MODE_KEY, if enabled { "true" } else { "false" })
        .map_err(|e| Error::StorageWrite {
            key: DARK_MODE_KEY.to_string(),
            reason: e.to_string(),
        })
}

/// Remove every stored key
pub fn clear_all<S: KvStore + ?Sized>(store: &mut S) -> Result<()> {
    let keys = store.keys()?;
    store.clear()?;
    tracing::info!("Deleted all data ({} keys)", keys.len());
    Ok(())
}
