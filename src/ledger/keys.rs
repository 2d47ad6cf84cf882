// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger addresses and ed25519 keypairs.
//!
//! Addresses are 32-byte public keys rendered as base58. A [`Keypair`] never
//! prints its secret: `Debug` shows the public address only.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

/// Length of a keypair secret in the ledger's wire layout (seed || public key).
pub const KEYPAIR_BYTES: usize = 64;

/// Errors from parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address is not valid base58: {0}")]
    InvalidBase58(String),

    #[error("address must decode to 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors from rebuilding a keypair out of stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("secret key must be 32 or 64 bytes, got {0}")]
    InvalidLength(usize),

    #[error("secret key does not match its public half")]
    Mismatch,
}

/// A ledger address (mint, wallet, holding account).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let bytes = bs58::decode(trimmed)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;

        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;

        Ok(Self(array))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An ed25519 signing keypair.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from stored secret bytes.
    ///
    /// Accepts a bare 32-byte seed or the 64-byte `seed || public` layout; the
    /// latter is checked for consistency.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let signing = match bytes.len() {
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(bytes);
                SigningKey::from_bytes(&seed)
            }
            KEYPAIR_BYTES => {
                let mut full = Zeroizing::new([0u8; KEYPAIR_BYTES]);
                full.copy_from_slice(bytes);
                SigningKey::from_keypair_bytes(&full).map_err(|_| KeyError::Mismatch)?
            }
            other => return Err(KeyError::InvalidLength(other)),
        };
        Ok(Self { signing })
    }

    /// Public address of this keypair.
    pub fn address(&self) -> Address {
        Address(self.signing.verifying_key().to_bytes())
    }

    /// Secret in the 64-byte `seed || public` layout. Wiped on drop.
    pub fn to_secret_bytes(&self) -> Zeroizing<[u8; KEYPAIR_BYTES]> {
        Zeroizing::new(self.signing.to_keypair_bytes())
    }

    #[cfg(test)]
    pub(crate) fn sign(&self, message: &[u8]) -> [u8; 64] {
        use ed25519_dalek::Signer;
        self.signing.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for Keypair {}
