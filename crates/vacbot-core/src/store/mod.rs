// ── Local state owned by the core ──
//
// The persisted connection preference and the in-memory status cache.

mod preference;
mod status_cache;

pub use preference::{
    ConnectionPreference, ConnectionPreferenceStore, KeyValueStorage, MemoryStorage,
    PREFERENCE_KEY,
};
pub use status_cache::StatusCache;
