//! Decoder for the textual content of EU Digital COVID Certificate QR
//! codes.
//!
//! The pipeline strips the `HC1:` prefix, reverses the base45 transport
//! encoding, inflates the deflate stream, and walks the COSE/CWT layers
//! down to the certificate holder data. Signature bytes are carried along
//! but never verified.

pub mod base45;
pub mod cose;
pub mod error;
pub mod hcert;

pub use error::DecodeError;
pub use hcert::{decode, CertificateRecord};
