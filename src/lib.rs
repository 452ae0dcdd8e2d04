//! # Privacy Pass with redemption contexts
//!
//! Single-use, rate-limiting tokens built on a verifiable oblivious
//! pseudorandom function ([RFC 9497](https://www.rfc-editor.org/rfc/rfc9497)).
//!
//! An issuer mints tokens bound to an opaque redemption [`Context`] without
//! learning which token belongs to which request, redeems every token at most
//! once, and rejects tokens presented under a different context than the one
//! they were requested for.
//!
//! The exchange consists of four steps:
//!
//!  1. [`Client::request`](tokens::client::Client::request) blinds a
//!     context-bound message,
//!  2. [`Issuer::issue`](tokens::issuer::Issuer::issue) evaluates it,
//!  3. [`Client::finalize`](tokens::client::Client::finalize) unblinds the
//!     evaluation into a [`Token`](tokens::Token),
//!  4. [`Issuer::redeem`](tokens::issuer::Issuer::redeem) checks the token
//!     and records it as spent.
//!
//! The OPRF itself sits behind the [`Oprf`](common::oprf::Oprf) trait;
//! [`VerifiableOprf`](common::oprf::VerifiableOprf) implements it for the
//! ristretto255 and P-384 cipher suites of the `voprf` crate.

#![warn(missing_docs)]
#![deny(unreachable_pub)]
#![deny(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod common;
pub mod config;
pub mod context;
pub mod tokens;

use sha2::{Digest, Sha512};

pub use common::store::{MemorySpentStore, SpentStore};
pub use context::Context;
pub use p384::NistP384;
pub use tls_codec::{Deserialize, Serialize};
pub use voprf::{Group, Ristretto255};

/// Nonce
pub type Nonce = [u8; 32];

/// PRF input binding a token to its redemption context and nonce.
#[derive(Debug)]
pub struct TokenInput<'a> {
    context: &'a Context,
    nonce: &'a Nonce,
}

impl<'a> TokenInput<'a> {
    /// Creates the input for `nonce` under `context`.
    pub const fn new(context: &'a Context, nonce: &'a Nonce) -> Self {
        Self { context, nonce }
    }

    /// Returns the message fed to the OPRF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        // token_input = SHA512(context || nonce)
        // The nonce has a fixed length, which keeps the concatenation unambiguous.
        let mut hasher = Sha512::new();
        hasher.update(self.context.as_bytes());
        hasher.update(self.nonce);
        hasher.finalize().to_vec()
    }
}
