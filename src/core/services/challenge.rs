//! Proof-of-work for LRCLIB publish tokens.
//!
//! The server hands out a random `prefix` and a hex `target`. A token is
//! `"{prefix}:{nonce}"` where SHA-256 of `prefix` followed by the decimal
//! nonce compares less than or equal to the target, byte by byte, big-endian.

use data_encoding::HEXLOWER_PERMISSIVE;
use ring::digest::{digest, SHA256, SHA256_OUTPUT_LEN};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::{LyriqError, Result};

/// How many nonces are tried between checks of the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Challenge {
    pub prefix: String,
    pub target: String,
}

impl Challenge {
    pub fn solve(&self) -> Result<String> {
        generate_publish_token(&self.prefix, &self.target)
    }
}

/// Check a hash against the target.
///
/// Lengths must match. The first differing byte decides; identical bytes pass.
pub fn verify_nonce(hash: &[u8], target: &[u8]) -> bool {
    if hash.len() != target.len() {
        return false;
    }
    for (hash_byte, target_byte) in hash.iter().zip(target) {
        if hash_byte > target_byte {
            return false;
        }
        if hash_byte < target_byte {
            break;
        }
    }
    true
}

/// Find the first nonce that satisfies the target, counting up from zero.
///
/// CPU-bound and unbounded; run it on a blocking worker.
pub fn generate_publish_token(prefix: &str, target: &str) -> Result<String> {
    let never = AtomicBool::new(false);
    generate_publish_token_cancellable(prefix, target, &never)
}

/// Same search as [`generate_publish_token`], giving up with
/// [`LyriqError::Cancelled`] once `cancel` is set.
pub fn generate_publish_token_cancellable(
    prefix: &str,
    target: &str,
    cancel: &AtomicBool,
) -> Result<String> {
    let target_bytes = decode_target(target)?;
    let mut input = String::with_capacity(prefix.len() + 20);
    let mut nonce: u64 = 0;

    loop {
        input.clear();
        input.push_str(prefix);
        input.push_str(&nonce.to_string());

        let hashed = digest(&SHA256, input.as_bytes());
        if verify_nonce(hashed.as_ref(), &target_bytes) {
            debug!("Solved publish challenge after {} attempts", nonce + 1);
            return Ok(format!("{}:{}", prefix, nonce));
        }

        nonce += 1;
        if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            debug!("Publish challenge cancelled after {} attempts", nonce);
            return Err(LyriqError::Cancelled);
        }
    }
}

fn decode_target(target: &str) -> Result<Vec<u8>> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(target.trim().as_bytes())
        .map_err(|e| LyriqError::InvalidChallenge {
            reason: format!("target is not hex: {}", e),
        })?;

    // A shorter or longer target could never match a SHA-256 digest.
    if bytes.len() != SHA256_OUTPUT_LEN {
        return Err(LyriqError::InvalidChallenge {
            reason: format!(
                "target is {} bytes, expected {}",
                bytes.len(),
                SHA256_OUTPUT_LEN
            ),
        });
    }
    Ok(bytes)
}
