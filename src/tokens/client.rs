//! Client-side implementation of the token protocol.

use rand::{Rng, rngs::OsRng};

use crate::{
    Context, Nonce, TokenInput,
    common::{
        errors::{CreateClientError, IssueTokenError, IssueTokenRequestError},
        oprf::Oprf,
    },
};

use super::{BlindedToken, Evaluation, RequestAux, Token};

/// Client-side component of the token protocol.
///
/// The client only holds the issuer's public key. Blinding material of each
/// request lives in the returned [`RequestAux`], so a single client can serve
/// concurrent requests.
pub struct Client<P: Oprf> {
    public_key: P::PublicKey,
}

impl<P: Oprf> std::fmt::Debug for Client<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("public_key", &P::serialize_public_key(&self.public_key))
            .finish()
    }
}

impl<P: Oprf> Client<P> {
    /// Creates a client from the issuer's encoded public key.
    ///
    /// # Errors
    /// Returns an error if the public key is malformed.
    pub fn new(public_key: &[u8]) -> Result<Self, CreateClientError> {
        let public_key = P::deserialize_public_key(public_key)
            .map_err(|source| CreateClientError::InvalidPublicKey { source })?;
        Ok(Self::from_public_key(public_key))
    }

    /// Creates a client from an already decoded public key.
    pub const fn from_public_key(public_key: P::PublicKey) -> Self {
        Self { public_key }
    }

    /// Returns the issuer public key this client finalizes against.
    pub const fn public_key(&self) -> &P::PublicKey {
        &self.public_key
    }

    /// Issue a new token request under `context`.
    ///
    /// # Errors
    /// Returns an error if the context-bound message cannot be blinded.
    pub fn request(
        &self,
        context: &Context,
    ) -> Result<(BlindedToken, RequestAux<P>), IssueTokenRequestError> {
        let nonce: Nonce = OsRng.r#gen();

        self.request_internal(context, nonce, None)
    }

    fn request_internal(
        &self,
        context: &Context,
        nonce: Nonce,
        blind: Option<&[u8]>,
    ) -> Result<(BlindedToken, RequestAux<P>), IssueTokenRequestError> {
        // nonce = random(32)
        // token_input = SHA512(context || nonce)
        // blind, blinded_element = Blind(token_input)
        let token_input = TokenInput::new(context, &nonce).serialize();

        let (blinded, state) = P::blind(&token_input, &self.public_key, blind)
            .map_err(|source| IssueTokenRequestError::BlindingFailed { source })?;

        Ok((BlindedToken(blinded), RequestAux { nonce, state }))
    }

    #[cfg(feature = "kat")]
    /// Issue a token request with an explicit nonce and blinding factor.
    ///
    /// # Errors
    /// Returns an error if the blinding factor is not a valid scalar.
    pub fn request_with_params(
        &self,
        context: &Context,
        nonce: Nonce,
        blind: &[u8],
    ) -> Result<(BlindedToken, RequestAux<P>), IssueTokenRequestError> {
        self.request_internal(context, nonce, Some(blind))
    }

    /// Turns the issuer's evaluation into a token.
    ///
    /// # Errors
    /// Returns an error if the evaluation is malformed or does not verify
    /// against the issuer's public key.
    pub fn finalize(
        &self,
        evaluation: &Evaluation,
        aux: RequestAux<P>,
    ) -> Result<Token, IssueTokenError> {
        let RequestAux { nonce, state } = aux;
        let value = P::finalize(evaluation.as_bytes(), &state)
            .map_err(|source| IssueTokenError::InvalidEvaluation { source })?;

        Ok(Token::new(nonce, value))
    }
}
