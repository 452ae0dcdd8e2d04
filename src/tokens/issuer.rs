//! Issuer-side implementation of the token protocol.

use tracing::{debug, warn};

use crate::{
    Context, TokenInput,
    common::{
        errors::{CreateKeypairError, IssueTokenResponseError},
        oprf::Oprf,
        store::{MemorySpentStore, SpentStore},
    },
};

use super::{BlindedToken, Evaluation, Token};

/// Issuer-side component of the token protocol.
///
/// Holds the OPRF key pair and the ledger of spent tokens. All operations
/// take `&self`, so one issuer is meant to be shared (e.g. behind an `Arc`)
/// between workers.
pub struct Issuer<P: Oprf, S: SpentStore = MemorySpentStore> {
    secret_key: P::SecretKey,
    public_key: P::PublicKey,
    spent_store: S,
}

impl<P: Oprf, S: SpentStore + std::fmt::Debug> std::fmt::Debug for Issuer<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("secret_key", &"secret key".to_string())
            .field("public_key", &P::serialize_public_key(&self.public_key))
            .field("spent_store", &self.spent_store)
            .finish()
    }
}

impl<P: Oprf> Issuer<P> {
    /// Creates an issuer with a fresh key pair and an empty in-memory ledger.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn new() -> Result<Self, CreateKeypairError> {
        Self::with_store(MemorySpentStore::default())
    }
}

impl<P: Oprf, S: SpentStore> Issuer<P, S> {
    /// Creates an issuer with a fresh key pair on top of `spent_store`.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn with_store(spent_store: S) -> Result<Self, CreateKeypairError> {
        let (secret_key, public_key) = P::key_generate()
            .map_err(|source| CreateKeypairError::KeyGenerationFailed { source })?;
        debug!("generated issuer key pair");
        Ok(Self {
            secret_key,
            public_key,
            spent_store,
        })
    }

    /// Creates an issuer with a key pair derived from `seed` and `info`.
    ///
    /// # Errors
    /// Returns an error if the primitive rejects the seed or info.
    #[cfg(feature = "kat")]
    pub fn from_seed(
        seed: &[u8],
        info: &[u8],
        spent_store: S,
    ) -> Result<Self, CreateKeypairError> {
        let (secret_key, public_key) = P::derive_key_pair(seed, info)
            .map_err(|source| CreateKeypairError::KeyGenerationFailed { source })?;
        Ok(Self {
            secret_key,
            public_key,
            spent_store,
        })
    }

    /// Returns the encoded public key to distribute to clients.
    #[must_use]
    pub fn verification_key(&self) -> Vec<u8> {
        P::serialize_public_key(&self.public_key)
    }

    /// Returns the public key.
    pub const fn public_key(&self) -> &P::PublicKey {
        &self.public_key
    }

    /// Returns the ledger of spent tokens.
    pub const fn spent_store(&self) -> &S {
        &self.spent_store
    }

    /// Evaluates a blinded token.
    ///
    /// # Errors
    /// Returns an error if the blinded token is malformed.
    pub fn issue(
        &self,
        blinded_token: &BlindedToken,
    ) -> Result<Evaluation, IssueTokenResponseError> {
        let evaluation =
            P::evaluate(&self.secret_key, blinded_token.as_bytes()).map_err(|source| {
                warn!(error = %source, "rejected malformed blinded token");
                IssueTokenResponseError::InvalidBlindedToken { source }
            })?;
        Ok(Evaluation(evaluation))
    }

    /// Redeems a token under `context`.
    ///
    /// Returns `true` exactly once per valid token. Tokens that do not verify
    /// under `context` and tokens that were already redeemed yield `false`.
    /// A token that does not verify is never recorded.
    pub async fn redeem(&self, context: &Context, token: &Token) -> bool {
        let token_input = TokenInput::new(context, token.nonce()).serialize();
        if !P::verify_finalize(&self.secret_key, &token_input, token.value()) {
            debug!("token rejected: verification failed");
            return false;
        }
        if !self.spent_store.mark_spent(token.value()).await {
            debug!("token rejected: already redeemed");
            return false;
        }
        debug!("token redeemed");
        true
    }

    /// Forgets that `token` was redeemed.
    #[cfg(feature = "test-utils")]
    pub async fn unspend(&self, token: &Token) -> bool {
        self.spent_store.unmark(token.value()).await
    }
}
