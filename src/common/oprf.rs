//! The OPRF primitive consumed by the token protocol, and its VOPRF backend.
//!
//! The protocol layer only ever sees opaque byte buffers. Everything that
//! touches group elements lives behind [`Oprf`], so any standards-compliant
//! backend can be swapped in without changing the client or the issuer.

use generic_array::{ArrayLength, GenericArray};
use rand::{RngCore, rngs::OsRng};
use std::{fmt::Debug, marker::PhantomData, ops::Add};
use subtle::ConstantTimeEq;
use typenum::Unsigned;
use voprf::{
    BlindedElement, CipherSuite, EvaluationElement, Group, Proof, VoprfClient, VoprfServer,
};

use super::errors::PrimitiveError;

/// Domain separation string used when deriving issuer keys from a seed.
pub const KEY_INFO: &[u8] = b"PPassRC";

/// Abstract (verifiable) oblivious PRF.
///
/// All buffers crossing this interface are primitive-defined and must be
/// passed around unchanged.
pub trait Oprf: Debug + Send + Sync + 'static {
    /// Issuer secret key.
    type SecretKey: Send + Sync;
    /// Issuer public key, distributed to clients.
    type PublicKey: Clone + Send + Sync;
    /// Client state kept between blinding and finalization.
    type BlindingState: Send + Sync;

    /// Generates a fresh key pair.
    ///
    /// # Errors
    /// Returns an error if the primitive fails to produce a key.
    fn key_generate() -> Result<(Self::SecretKey, Self::PublicKey), PrimitiveError>;

    /// Deterministically derives a key pair from `seed` and `info`.
    ///
    /// # Errors
    /// Returns an error if the seed or info are rejected by the primitive.
    fn derive_key_pair(
        seed: &[u8],
        info: &[u8],
    ) -> Result<(Self::SecretKey, Self::PublicKey), PrimitiveError>;

    /// Encodes a public key.
    fn serialize_public_key(public_key: &Self::PublicKey) -> Vec<u8>;

    /// Decodes a public key.
    ///
    /// # Errors
    /// Returns an error if the bytes do not encode a valid public key.
    fn deserialize_public_key(bytes: &[u8]) -> Result<Self::PublicKey, PrimitiveError>;

    /// Blinds `message`. `blind` optionally pins the blinding factor.
    ///
    /// # Errors
    /// Returns an error if the message cannot be blinded.
    fn blind(
        message: &[u8],
        public_key: &Self::PublicKey,
        blind: Option<&[u8]>,
    ) -> Result<(Vec<u8>, Self::BlindingState), PrimitiveError>;

    /// Evaluates a blinded input under the secret key.
    ///
    /// # Errors
    /// Returns an error if the blinded input is malformed.
    fn evaluate(
        secret_key: &Self::SecretKey,
        blinded_input: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError>;

    /// Unblinds an evaluation into the PRF output.
    ///
    /// # Errors
    /// Returns an error if the evaluation is malformed or its proof does not
    /// verify.
    fn finalize(evaluation: &[u8], state: &Self::BlindingState) -> Result<Vec<u8>, PrimitiveError>;

    /// Checks whether `output` is the PRF output of `message` under
    /// `secret_key`.
    fn verify_finalize(secret_key: &Self::SecretKey, message: &[u8], output: &[u8]) -> bool;
}

/// Trait for a cipher suite that can back the token protocol.
///
/// The scalar length bound is what lets a proof (two scalars) be serialized.
pub trait TokenCipherSuite:
    CipherSuite<
        Group: Group<
            Elem: Send + Sync,
            Scalar: Send + Sync,
            ScalarLen: Add<Output: ArrayLength<u8>>,
        >,
    > + PartialEq
    + Debug
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl TokenCipherSuite for p384::NistP384 {}

impl TokenCipherSuite for voprf::Ristretto255 {}

/// Public key alias
pub type PublicKey<CS> = <<CS as CipherSuite>::Group as Group>::Elem;

/// RFC 9497 VOPRF backend for a given cipher suite.
#[derive(Debug)]
pub struct VerifiableOprf<CS: TokenCipherSuite> {
    _marker: PhantomData<CS>,
}

/// VOPRF over ristretto255 with SHA-512.
pub type Ristretto255Voprf = VerifiableOprf<voprf::Ristretto255>;

/// VOPRF over P-384 with SHA-384.
pub type P384Voprf = VerifiableOprf<p384::NistP384>;

/// Client-side VOPRF state between blinding and finalization.
pub struct VoprfBlindingState<CS: TokenCipherSuite> {
    client: VoprfClient<CS>,
    message: Vec<u8>,
    public_key: PublicKey<CS>,
}

impl<CS: TokenCipherSuite> Debug for VoprfBlindingState<CS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoprfBlindingState")
            .field("client", &"client".to_string())
            .field("message", &"message".to_string())
            .field("public_key", &"public key".to_string())
            .finish()
    }
}

impl<CS: TokenCipherSuite> VerifiableOprf<CS> {
    fn element_len() -> usize {
        <<CS::Group as Group>::ElemLen as Unsigned>::USIZE
    }

    fn proof_len() -> usize {
        2 * <<CS::Group as Group>::ScalarLen as Unsigned>::USIZE
    }

    /// Length of a serialized evaluation: `evaluated_element || proof`.
    #[must_use]
    pub fn evaluation_len() -> usize {
        Self::element_len() + Self::proof_len()
    }
}

impl<CS: TokenCipherSuite> Oprf for VerifiableOprf<CS> {
    type SecretKey = VoprfServer<CS>;
    type PublicKey = PublicKey<CS>;
    type BlindingState = VoprfBlindingState<CS>;

    fn key_generate() -> Result<(Self::SecretKey, Self::PublicKey), PrimitiveError> {
        let mut seed = GenericArray::<_, <CS::Group as Group>::ScalarLen>::default();
        OsRng.fill_bytes(&mut seed);
        Self::derive_key_pair(&seed, KEY_INFO)
    }

    fn derive_key_pair(
        seed: &[u8],
        info: &[u8],
    ) -> Result<(Self::SecretKey, Self::PublicKey), PrimitiveError> {
        let server = VoprfServer::<CS>::new_from_seed(seed, info)?;
        let public_key = server.get_public_key();
        Ok((server, public_key))
    }

    fn serialize_public_key(public_key: &Self::PublicKey) -> Vec<u8> {
        <CS::Group as Group>::serialize_elem(*public_key).to_vec()
    }

    fn deserialize_public_key(bytes: &[u8]) -> Result<Self::PublicKey, PrimitiveError> {
        Ok(<CS::Group as Group>::deserialize_elem(bytes)?)
    }

    fn blind(
        message: &[u8],
        public_key: &Self::PublicKey,
        blind: Option<&[u8]>,
    ) -> Result<(Vec<u8>, Self::BlindingState), PrimitiveError> {
        let blinded_element = match blind {
            None => VoprfClient::<CS>::blind(message, &mut OsRng)?,
            #[cfg(feature = "kat")]
            Some(blind) => {
                let blind = <CS::Group as Group>::deserialize_scalar(blind)?;
                VoprfClient::<CS>::deterministic_blind_unchecked(message, blind)?
            }
            #[cfg(not(feature = "kat"))]
            Some(_) => return Err(PrimitiveError::BlindOverrideUnsupported),
        };

        let state = VoprfBlindingState {
            client: blinded_element.state,
            message: message.to_vec(),
            public_key: *public_key,
        };
        Ok((blinded_element.message.serialize().to_vec(), state))
    }

    fn evaluate(
        secret_key: &Self::SecretKey,
        blinded_input: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        let blinded_element = BlindedElement::<CS>::deserialize(blinded_input)?;
        let evaluated = secret_key.blind_evaluate(&mut OsRng, &blinded_element);

        // evaluation = concat(evaluated_element, proof)
        let mut evaluation = Vec::with_capacity(Self::evaluation_len());
        evaluation.extend_from_slice(&evaluated.message.serialize());
        evaluation.extend_from_slice(&evaluated.proof.serialize());
        Ok(evaluation)
    }

    fn finalize(evaluation: &[u8], state: &Self::BlindingState) -> Result<Vec<u8>, PrimitiveError> {
        if evaluation.len() != Self::evaluation_len() {
            return Err(PrimitiveError::InvalidLength {
                what: "evaluation",
                expected: Self::evaluation_len(),
                actual: evaluation.len(),
            });
        }
        let (element, proof) = evaluation.split_at(Self::element_len());
        let evaluation_element = EvaluationElement::<CS>::deserialize(element)?;
        let proof = Proof::<CS>::deserialize(proof)?;
        let output = state.client.finalize(
            &state.message,
            &evaluation_element,
            &proof,
            state.public_key,
        )?;
        Ok(output.to_vec())
    }

    fn verify_finalize(secret_key: &Self::SecretKey, message: &[u8], output: &[u8]) -> bool {
        match secret_key.evaluate(message) {
            Ok(expected) => expected.as_slice().ct_eq(output).into(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use p384::NistP384;
    use voprf::Ristretto255;

    use super::*;

    #[test]
    fn key_serialization() {
        key_serialization_cs::<NistP384>();
        key_serialization_cs::<Ristretto255>();
    }

    fn key_serialization_cs<CS: TokenCipherSuite>() {
        let (_, pk) = VerifiableOprf::<CS>::key_generate().unwrap();
        let bytes = VerifiableOprf::<CS>::serialize_public_key(&pk);
        let pk2 = VerifiableOprf::<CS>::deserialize_public_key(&bytes).unwrap();
        assert_eq!(bytes, VerifiableOprf::<CS>::serialize_public_key(&pk2));
    }

    #[test]
    fn seeded_keys_are_deterministic() {
        let seed = [7u8; 32];
        let (_, pk1) = Ristretto255Voprf::derive_key_pair(&seed, KEY_INFO).unwrap();
        let (_, pk2) = Ristretto255Voprf::derive_key_pair(&seed, KEY_INFO).unwrap();
        let (_, pk3) = Ristretto255Voprf::derive_key_pair(&seed, b"other").unwrap();
        assert_eq!(pk1, pk2);
        assert_ne!(pk1, pk3);
    }

    #[test]
    fn full_cycle() {
        full_cycle_cs::<NistP384>();
        full_cycle_cs::<Ristretto255>();
    }

    fn full_cycle_cs<CS: TokenCipherSuite>() {
        let (sk, pk) = VerifiableOprf::<CS>::key_generate().unwrap();
        let message = b"some message";
        let (blinded, state) = VerifiableOprf::<CS>::blind(message, &pk, None).unwrap();
        let evaluation = VerifiableOprf::<CS>::evaluate(&sk, &blinded).unwrap();
        let output = VerifiableOprf::<CS>::finalize(&evaluation, &state).unwrap();

        assert!(VerifiableOprf::<CS>::verify_finalize(&sk, message, &output));
        assert!(!VerifiableOprf::<CS>::verify_finalize(&sk, b"other message", &output));
        assert!(!VerifiableOprf::<CS>::verify_finalize(&sk, message, &output[1..]));
    }

    #[test]
    fn evaluation_layout() {
        // element || proof, the proof being two scalars
        assert_eq!(Ristretto255Voprf::evaluation_len(), 32 + 2 * 32);
        assert_eq!(P384Voprf::evaluation_len(), 49 + 2 * 48);

        let (sk, pk) = P384Voprf::key_generate().unwrap();
        let (blinded, _) = P384Voprf::blind(b"msg", &pk, None).unwrap();
        let evaluation = P384Voprf::evaluate(&sk, &blinded).unwrap();
        assert_eq!(evaluation.len(), P384Voprf::evaluation_len());
        let proof = Proof::<NistP384>::deserialize(&evaluation[49..]).unwrap();
        assert_eq!(proof.serialize().as_slice(), &evaluation[49..]);
    }

    #[test]
    fn truncated_evaluation() {
        let (sk, pk) = Ristretto255Voprf::key_generate().unwrap();
        let (blinded, state) = Ristretto255Voprf::blind(b"msg", &pk, None).unwrap();
        let evaluation = Ristretto255Voprf::evaluate(&sk, &blinded).unwrap();
        let err = Ristretto255Voprf::finalize(&evaluation[..10], &state).unwrap_err();
        assert!(matches!(
            err,
            PrimitiveError::InvalidLength { actual: 10, .. }
        ));
    }

    #[test]
    fn garbage_blinded_input() {
        let (sk, _) = Ristretto255Voprf::key_generate().unwrap();
        assert!(matches!(
            Ristretto255Voprf::evaluate(&sk, &[0xff; 32]),
            Err(PrimitiveError::Voprf(_))
        ));
    }
}
