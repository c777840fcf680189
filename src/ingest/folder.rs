//! Time-derived folder tokens
//!
//! A token is the CRC32 of the current timestamp plus a per-generator salt,
//! rendered as 8 lowercase hex characters. Tokens only group uploads; they
//! carry no meaning beyond that.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Generates folder tokens
#[derive(Debug, Default)]
pub struct FolderTokens {
    salt: AtomicU64,
}

impl FolderTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh token for the current instant
    pub fn next(&self) -> String {
        let salt = self.salt.fetch_add(1, Ordering::Relaxed);
        let seed = format!("{}#{}", Utc::now().format("%Y%m%d%H%M%S%.9f"), salt);
        format!("{:08x}", crc32fast::hash(seed.as_bytes()))
    }

    /// A fresh token guaranteed to differ from `current`
    pub fn rotate(&self, current: &str) -> String {
        loop {
            let token = self.next();
            if token != current {
                return token;
            }
        }
    }
}
