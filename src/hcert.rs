//! EU Digital COVID Certificate decoding: HC1 prefix, base45 transport
//! encoding, deflate compression, COSE envelope, CWT claims.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use flate2::read::DeflateDecoder;
use serde_cbor::tags::Tagged;
use serde_cbor::value::from_value;
use serde_cbor::{from_slice, Value};
use serde_derive::Deserialize;

use crate::base45;
use crate::cose;
use crate::error::DecodeError;

const HC1_FIELD: &str = "HC1:";

/// The only hcert schema release this decoder accepts.
const SUPPORTED_VERSION: &str = "1.0.1";

// see https://datatracker.ietf.org/doc/html/rfc8392#section-4
const CWT_CLAIMS: [(i128, &str); 7] = [
    (1, "iss"),
    (2, "sub"),
    (3, "aud"),
    (4, "exp"),
    (5, "nbf"),
    (6, "iat"),
    (7, "cti"),
];

// see https://ec.europa.eu/health/sites/default/files/ehealth/docs/digital-green-certificates_v3_en.pdf
const HCERT_CLAIMS: [(i128, &str); 1] = [(-260, "hcert")];

#[derive(Debug, Deserialize, PartialEq)]
struct Name {
    #[serde(rename = "fn")]
    fn_: String,
    fnt: String,
    gn: String,
    gnt: String,
}

/// Fields read from the per-release hcert contents. The vaccination ("v")
/// and test ("t") entries are decoded as part of the CBOR tree but carry
/// nothing the record surfaces.
#[derive(Debug, Deserialize)]
struct HcertContents {
    ver: String,
    nam: Name,
    dob: String,
}

/// Holder data of a successfully decoded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    pub version: String,
    pub given_name: String,
    pub family_name: String,
    pub given_name_translit: String,
    pub family_name_translit: String,
    pub date_of_birth: NaiveDate,
}

/// Decodes the text content of a certificate QR code into a
/// [`CertificateRecord`].
pub fn decode(data: &str) -> Result<CertificateRecord, DecodeError> {
    let body = data
        .trim_end()
        .strip_prefix(HC1_FIELD)
        .ok_or_else(|| DecodeError::format("invalid or unsupported data"))?;

    let compressed = base45::decode(body)?;

    let mut inflater = DeflateDecoder::new(compressed.as_slice());
    let mut cbor_data = Vec::new();
    inflater.read_to_end(&mut cbor_data)?;

    let message: Tagged<Value> = from_slice(&cbor_data)?;
    let envelope = cose::parse_envelope(message)?;

    extract(envelope.payload)
}

/// Maps a numeric claim key to its registered name. Negative keys live in
/// the hcert registry, non-negative ones in the CWT registry.
fn claim_name(key: i128) -> Option<&'static str> {
    let table: &[(i128, &str)] = if key < 0 { &HCERT_CLAIMS } else { &CWT_CLAIMS };
    table.iter().find(|(k, _)| *k == key).map(|(_, name)| *name)
}

fn extract(payload: Value) -> Result<CertificateRecord, DecodeError> {
    let entries = match payload {
        Value::Map(entries) => entries,
        _ => return Err(DecodeError::format("payload is not a claim map")),
    };

    let mut claims: BTreeMap<&str, Value> = BTreeMap::new();
    for (key, value) in entries {
        let key = match key {
            Value::Integer(key) => key,
            _ => return Err(DecodeError::format("non-integer claim key")),
        };
        let name = claim_name(key).ok_or(DecodeError::UnrecognizedClaim(key))?;
        claims.insert(name, value);
    }

    let releases = match claims.remove("hcert") {
        Some(Value::Map(releases)) => releases,
        Some(_) => return Err(DecodeError::format("hcert claim is not a map")),
        None => return Err(DecodeError::format("hcert claim missing")),
    };

    // The certificate sits under a schema-release key. Deployed encoders
    // emit a single entry, so take the first one instead of looking up a
    // fixed key.
    let contents = match releases.into_iter().next() {
        Some((_, contents)) => contents,
        None => return Err(DecodeError::format("hcert claim is empty")),
    };
    let contents: HcertContents = from_value(contents)?;

    if contents.ver != SUPPORTED_VERSION {
        return Err(DecodeError::UnsupportedVersion(contents.ver));
    }

    let date_of_birth = NaiveDate::parse_from_str(&contents.dob, "%Y-%m-%d")
        .map_err(|_| DecodeError::format(format!("invalid date of birth {:?}", contents.dob)))?;

    Ok(CertificateRecord {
        version: contents.ver,
        given_name: contents.nam.gn,
        family_name: contents.nam.fn_,
        given_name_translit: contents.nam.gnt,
        family_name_translit: contents.nam.fnt,
        date_of_birth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.into())
    }

    #[test]
    fn resolves_registered_claim_names() {
        assert_eq!(claim_name(1), Some("iss"));
        assert_eq!(claim_name(7), Some("cti"));
        assert_eq!(claim_name(-260), Some("hcert"));
        assert_eq!(claim_name(0), None);
        assert_eq!(claim_name(-1), None);
    }

    #[test]
    fn rejects_payload_without_hcert_claim() {
        let mut payload = BTreeMap::new();
        payload.insert(Value::Integer(1), text("DE"));
        let err = extract(Value::Map(payload)).unwrap_err();
        assert_eq!(err, DecodeError::format("hcert claim missing"));
    }

    #[test]
    fn rejects_non_map_payload() {
        assert!(extract(text("not a map")).is_err());
    }

    #[test]
    fn rejects_non_integer_claim_key() {
        let mut payload = BTreeMap::new();
        payload.insert(text("iss"), text("DE"));
        assert!(extract(Value::Map(payload)).is_err());
    }
}
