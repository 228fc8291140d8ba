// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Signing of transaction hashes.

use std::sync::Arc;

use ed25519_dalek::{Signer as _, SigningKey};
use stellar_strkey::ed25519;
use zeroize::Zeroize;

use crate::error::Error;

/// Signs transaction hashes on behalf of an account
pub trait Signer: Send + Sync {
    /// Public key of the signing account
    fn public_key(&self) -> [u8; 32];

    /// Sign a transaction hash
    fn sign(&self, hash: &[u8; 32]) -> Result<[u8; 64], Error>;

    /// The account strkey
    fn account_id(&self) -> String {
        ed25519::PublicKey(self.public_key()).to_string()
    }
}

/// An ed25519 keypair held in memory
#[derive(Clone)]
pub struct KeypairSigner {
    key: Arc<SigningKey>,
}

impl KeypairSigner {
    /// Build from the 32 bytes of a secret seed.
    pub fn from_seed_bytes(seed: [u8; 32]) -> Self {
        Self {
            key: Arc::new(SigningKey::from_bytes(&seed)),
        }
    }

    /// Build from an `S...` secret seed strkey.
    pub fn from_secret(secret: &str) -> Result<Self, Error> {
        let mut seed = ed25519::PrivateKey::from_string(secret)
            .map_err(|_| Error::Signing("invalid secret seed".into()))?;
        let signer = Self::from_seed_bytes(seed.0);
        seed.0.zeroize();
        Ok(signer)
    }
}

impl Signer for KeypairSigner {
    fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    fn sign(&self, hash: &[u8; 32]) -> Result<[u8; 64], Error> {
        Ok(self.key.sign(hash).to_bytes())
    }
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("account", &self.account_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    use super::*;

    const SEED: &str =
        "SAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSU2";

    #[test]
    fn sign_and_verify() {
        let signer = KeypairSigner::from_secret(SEED).unwrap();
        assert_eq!(
            signer.public_key(),
            KeypairSigner::from_seed_bytes([0; 32]).public_key()
        );
        assert!(signer.account_id().starts_with('G'));

        let hash = [42u8; 32];
        let signature = signer.sign(&hash).unwrap();
        let key = VerifyingKey::from_bytes(&signer.public_key()).unwrap();
        key.verify(&hash, &Signature::from_bytes(&signature))
            .expect("signature should verify");
    }

    #[test]
    fn rejects_non_seeds() {
        assert!(KeypairSigner::from_secret("GABC").is_err());
        assert!(KeypairSigner::from_secret(
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        )
        .is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let signer = KeypairSigner::from_secret(SEED).unwrap();
        assert!(!format!("{signer:?}").contains(SEED));
    }
}
