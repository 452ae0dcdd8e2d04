//! Common error types

use thiserror::Error;

/// Errors raised by the OPRF primitive. The cause is opaque to the protocol
/// layer and is only carried along for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("VOPRF operation failed: {0}")]
    /// Error reported by the VOPRF backend.
    Voprf(#[from] voprf::Error),
    #[error("Invalid length for {what}: expected {expected}, got {actual}")]
    /// A serialized value did not have the length mandated by the suite.
    InvalidLength {
        /// The value that was being decoded.
        what: &'static str,
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },
    #[error("Explicit blinding factors require the `kat` feature")]
    /// An explicit blinding factor was supplied but is not supported.
    BlindOverrideUnsupported,
}

/// Serialization error
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("Invalid serialized data: {source}")]
    /// Invalid serialized data
    InvalidData {
        /// Underlying codec error.
        source: tls_codec::Error,
    },
}

/// Errors that can occur when deriving a redemption context.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("The time window must be longer than zero")]
    /// The window duration was zero.
    NonPositiveWindow,
}

/// Errors that can occur when creating a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreateClientError {
    #[error("Invalid issuer public key")]
    /// The public key is not a valid element of the configured group.
    InvalidPublicKey {
        /// Primitive-level cause.
        source: PrimitiveError,
    },
}

/// Errors that can occur when creating a keypair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreateKeypairError {
    #[error("Key generation failed")]
    /// Error when the primitive could not generate a key pair.
    KeyGenerationFailed {
        /// Primitive-level cause.
        source: PrimitiveError,
    },
}

/// Errors that can occur when issuing token requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueTokenRequestError {
    #[error("Token blinding error")]
    /// Error when blinding the token.
    BlindingFailed {
        /// Primitive-level cause.
        source: PrimitiveError,
    },
}

/// Errors that can occur when issuing the token response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueTokenResponseError {
    #[error("Invalid blinded token")]
    /// Error when the blinded token cannot be evaluated.
    InvalidBlindedToken {
        /// Primitive-level cause.
        source: PrimitiveError,
    },
}

/// Errors that can occur when finalizing tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueTokenError {
    #[error("Invalid evaluation")]
    /// Error when the evaluation is malformed or its proof does not verify.
    InvalidEvaluation {
        /// Primitive-level cause.
        source: PrimitiveError,
    },
}
