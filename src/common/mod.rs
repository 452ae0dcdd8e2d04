//! Building blocks shared by the client and the issuer

pub mod errors;
pub mod oprf;
pub mod store;
