//! Unwrapping of the COSE_Sign1 envelope carried by a certificate.
//!
//! Only the structure is checked; the signature is extracted, never
//! verified.

use std::convert::TryInto;

use serde_cbor::tags::Tagged;
use serde_cbor::{from_slice, Value};

use crate::error::DecodeError;

/// CBOR tag for a COSE Single Signer Data Object (RFC 8152).
const COSE_SIGN1_TAG: u64 = 18;

const STRUCTURE_ERROR: &str = "unexpected CBOR message structure";

/// The four fields of a COSE_Sign1 message. The protected header and the
/// payload arrive as byte strings and are re-decoded into CBOR trees; the
/// unprotected header and the signature pass through untouched.
#[derive(Debug)]
pub struct EnvelopeParts {
    pub protected: Value,
    pub unprotected: Value,
    pub payload: Value,
    pub signature: Value,
}

pub fn parse_envelope(message: Tagged<Value>) -> Result<EnvelopeParts, DecodeError> {
    if message.tag != Some(COSE_SIGN1_TAG) {
        return Err(DecodeError::format(STRUCTURE_ERROR));
    }

    let elements = match message.value {
        Value::Array(elements) => elements,
        _ => return Err(DecodeError::format(STRUCTURE_ERROR)),
    };
    let [protected, unprotected, payload, signature]: [Value; 4] = elements
        .try_into()
        .map_err(|_| DecodeError::format(STRUCTURE_ERROR))?;

    Ok(EnvelopeParts {
        protected: from_byte_string(protected)?,
        unprotected,
        payload: from_byte_string(payload)?,
        signature,
    })
}

fn from_byte_string(value: Value) -> Result<Value, DecodeError> {
    match value {
        Value::Bytes(bytes) => Ok(from_slice(&bytes)?),
        _ => Err(DecodeError::format(STRUCTURE_ERROR)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_elements() -> Vec<Value> {
        let header = serde_cbor::to_vec(&Value::Map(Default::default())).unwrap();
        vec![
            Value::Bytes(header.clone()),
            Value::Map(Default::default()),
            Value::Bytes(header),
            Value::Bytes(vec![0xAB; 64]),
        ]
    }

    #[test]
    fn unwraps_all_four_parts() {
        let message = Tagged::new(Some(COSE_SIGN1_TAG), Value::Array(envelope_elements()));
        let parts = parse_envelope(message).unwrap();
        assert_eq!(parts.protected, Value::Map(Default::default()));
        assert_eq!(parts.payload, Value::Map(Default::default()));
        assert_eq!(parts.signature, Value::Bytes(vec![0xAB; 64]));
    }

    #[test]
    fn rejects_untagged_message() {
        let message = Tagged::new(None, Value::Array(envelope_elements()));
        assert!(parse_envelope(message).is_err());
    }

    #[test]
    fn rejects_wrong_tag() {
        let message = Tagged::new(Some(98), Value::Array(envelope_elements()));
        assert!(parse_envelope(message).is_err());
    }

    #[test]
    fn rejects_non_array_message() {
        let message = Tagged::new(Some(COSE_SIGN1_TAG), Value::Text("nope".into()));
        assert!(parse_envelope(message).is_err());
    }

    #[test]
    fn rejects_short_array() {
        let mut elements = envelope_elements();
        elements.pop();
        let message = Tagged::new(Some(COSE_SIGN1_TAG), Value::Array(elements));
        assert!(parse_envelope(message).is_err());
    }

    #[test]
    fn rejects_non_byte_string_payload() {
        let mut elements = envelope_elements();
        elements[2] = Value::Text("not a byte string".into());
        let message = Tagged::new(Some(COSE_SIGN1_TAG), Value::Array(elements));
        assert!(parse_envelope(message).is_err());
    }
}
