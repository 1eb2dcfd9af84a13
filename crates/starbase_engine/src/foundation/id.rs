//! Stable string ids
//!
//! Resource keys (models, bodies, physics spaces) are addressed by the 32-bit
//! FNV-1a hash of their name. [`idc`] is usable in `const` contexts; [`id`]
//! additionally records every hashed string in debug builds and panics when
//! two different strings hash to the same id.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

use thiserror::Error;

/// Hashed resource identifier
pub type ResourceId = u32;

const FNV_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Errors raised by the checked id API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Two different strings produced the same id
    #[error("id collision: {new:?} hashes to {id:#010x}, already taken by {existing:?}")]
    Collision {
        /// The colliding id
        id: ResourceId,
        /// The string registered first
        existing: String,
        /// The string that was rejected
        new: String,
    },
}

/// Compile-time hash of `name`; the empty string maps to 0
pub const fn idc(name: &str) -> ResourceId {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return 0;
    }

    let mut hash = FNV_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

fn registry() -> &'static Mutex<HashMap<ResourceId, String>> {
    static REGISTRY: OnceLock<Mutex<HashMap<ResourceId, String>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Hash `name` and record it, failing if another string already owns the id
pub fn try_id(name: &str) -> Result<ResourceId, IdError> {
    let id = idc(name);
    let mut hashed = registry().lock().unwrap_or_else(PoisonError::into_inner);

    match hashed.get(&id) {
        Some(existing) if existing != name => Err(IdError::Collision {
            id,
            existing: existing.clone(),
            new: name.to_owned(),
        }),
        Some(_) => Ok(id),
        None => {
            hashed.insert(id, name.to_owned());
            Ok(id)
        }
    }
}

/// Hash `name`
///
/// Debug builds check for collisions against every previously hashed string
/// and panic on one; release builds are equivalent to [`idc`].
pub fn id(name: &str) -> ResourceId {
    #[cfg(debug_assertions)]
    {
        match try_id(name) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    #[cfg(not(debug_assertions))]
    {
        idc(name)
    }
}
