//! # Context-bound tokens
//!
//! Messages exchanged between [`client::Client`] and [`issuer::Issuer`].
//! Blinded tokens and evaluations are opaque primitive-defined buffers; their
//! bytes travel unchanged between the parties.

use std::io::{Read, Write};
use tls_codec::{Deserialize, Error, Serialize, Size};

use crate::{Nonce, common::errors::SerializationError, common::oprf::Oprf};

pub mod client;
pub mod issuer;

/// Blinded message sent from the client to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindedToken(Vec<u8>);

impl BlindedToken {
    /// Wraps received bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The issuer's answer to exactly one [`BlindedToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation(Vec<u8>);

impl Evaluation {
    /// Wraps received bytes.
    #[must_use]
    pub const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Client-side state that is kept between a request and its finalization.
///
/// Consumed by [`Client::finalize`](client::Client::finalize).
pub struct RequestAux<P: Oprf> {
    pub(crate) nonce: Nonce,
    pub(crate) state: P::BlindingState,
}

impl<P: Oprf> std::fmt::Debug for RequestAux<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAux")
            .field("nonce", &"nonce".to_string())
            .field("state", &"blinding state".to_string())
            .finish()
    }
}

/// A finalized token, ready for redemption:
///
/// ```c
/// struct {
///     uint8_t nonce[32];
///     opaque value<1..2^16-1>;
/// } Token;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    nonce: Nonce,
    value: Vec<u8>,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(nonce: Nonce, value: Vec<u8>) -> Self {
        Self { nonce, value }
    }

    /// Returns the nonce.
    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Returns the PRF output.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Create a new `Token` from a byte slice.
    ///
    /// # Errors
    /// Returns `SerializationError::InvalidData` if the byte slice is not valid.
    pub fn try_from_bytes(mut bytes: &[u8]) -> Result<Self, SerializationError> {
        let token = Self::tls_deserialize(&mut bytes)
            .map_err(|source| SerializationError::InvalidData { source })?;
        if !bytes.is_empty() {
            return Err(SerializationError::InvalidData {
                source: Error::TrailingData,
            });
        }
        Ok(token)
    }

    /// Serializes the token.
    ///
    /// # Errors
    /// Returns `SerializationError::InvalidData` if the value is empty or too
    /// long to encode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        self.tls_serialize_detached()
            .map_err(|source| SerializationError::InvalidData { source })
    }
}

impl Size for Token {
    fn tls_serialized_len(&self) -> usize {
        self.nonce.tls_serialized_len() + 2 + self.value.len()
    }
}

impl Serialize for Token {
    fn tls_serialize<W: Write>(&self, writer: &mut W) -> Result<usize, Error> {
        let value_len = u16::try_from(self.value.len())
            .ok()
            .filter(|len| *len > 0)
            .ok_or(Error::InvalidVectorLength)?;
        let written = self.nonce.tls_serialize(writer)? + value_len.tls_serialize(writer)?;
        writer.write_all(&self.value)?;
        Ok(written + self.value.len())
    }
}

impl Deserialize for Token {
    fn tls_deserialize<R: Read>(bytes: &mut R) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let nonce = Nonce::tls_deserialize(bytes)?;
        let value_len = u16::tls_deserialize(bytes)?;
        if value_len == 0 {
            return Err(Error::InvalidVectorLength);
        }
        let mut value = vec![0u8; value_len as usize];
        bytes.read_exact(&mut value)?;
        Ok(Self { nonce, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_encoding() {
        let token = Token::new([3u8; 32], vec![1, 2, 3]);
        let bytes = token.to_bytes().unwrap();
        assert_eq!(bytes.len(), 32 + 2 + 3);
        assert_eq!(&bytes[32..34], &[0, 3]);
        assert_eq!(Token::try_from_bytes(&bytes).unwrap(), token);
    }

    #[test]
    fn malformed_tokens() {
        let bytes = Token::new([3u8; 32], vec![1, 2, 3]).to_bytes().unwrap();

        assert!(Token::try_from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Token::try_from_bytes(&bytes[..20]).is_err());

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(Token::try_from_bytes(&trailing).is_err());

        let mut empty_value = [3u8; 32].to_vec();
        empty_value.extend_from_slice(&[0, 0]);
        assert!(Token::try_from_bytes(&empty_value).is_err());
    }

    #[test]
    fn empty_value_is_not_encoded() {
        assert!(Token::new([0u8; 32], Vec::new()).to_bytes().is_err());
    }
}
