//! Distinguished name encoding: a versioned JSON document.
//!
//! ```json
//! {
//!   "subject": {
//!     "common-name": "example.com",
//!     "organization-name": "Example"
//!   },
//!   "version": 1
//! }
//! ```
//!
//! Absent optional fields are omitted. Unknown fields are rejected.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::Codec;
use crate::error::DecodeError;
use crate::model::DistinguishedName;

/// Current document version
pub const DN_FORMAT_VERSION: u32 = 1;

pub struct DistinguishedNameCodec;

#[derive(Deserialize)]
struct Versioned {
    version: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[allow(dead_code)]
    version: u32,
    subject: Subject,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Subject {
    common_name: String,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    state_or_province_name: Option<String>,
    #[serde(default)]
    locality_name: Option<String>,
    #[serde(default)]
    organization_name: Option<String>,
    #[serde(default)]
    organizational_unit_name: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
    #[serde(default)]
    subject_alternative_names: Vec<String>,
}

impl From<Subject> for DistinguishedName {
    fn from(subject: Subject) -> Self {
        DistinguishedName {
            common_name: subject.common_name,
            country_name: subject.country_name,
            state_or_province_name: subject.state_or_province_name,
            locality_name: subject.locality_name,
            organization_name: subject.organization_name,
            organizational_unit_name: subject.organizational_unit_name,
            email_address: subject.email_address,
            subject_alternative_names: subject.subject_alternative_names,
        }
    }
}

fn insert_optional(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

impl Codec for DistinguishedNameCodec {
    type Item = DistinguishedName;

    fn encode(dn: &DistinguishedName) -> Vec<u8> {
        let mut subject = Map::new();
        subject.insert(
            "common-name".to_string(),
            Value::String(dn.common_name.clone()),
        );
        insert_optional(&mut subject, "country-name", &dn.country_name);
        insert_optional(&mut subject, "state-or-province-name", &dn.state_or_province_name);
        insert_optional(&mut subject, "locality-name", &dn.locality_name);
        insert_optional(&mut subject, "organization-name", &dn.organization_name);
        insert_optional(&mut subject, "organizational-unit-name", &dn.organizational_unit_name);
        insert_optional(&mut subject, "email-address", &dn.email_address);
        if !dn.subject_alternative_names.is_empty() {
            subject.insert(
                "subject-alternative-names".to_string(),
                Value::Array(
                    dn.subject_alternative_names
                        .iter()
                        .cloned()
                        .map(Value::String)
                        .collect(),
                ),
            );
        }

        let mut document = Map::new();
        document.insert("version".to_string(), Value::from(DN_FORMAT_VERSION));
        document.insert("subject".to_string(), Value::Object(subject));

        // Pretty printing a Value cannot fail
        format!("{:#}\n", Value::Object(document)).into_bytes()
    }

    fn decode(bytes: &[u8]) -> Result<DistinguishedName, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let versioned: Versioned =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
        if versioned.version != DN_FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(versioned.version));
        }

        let document: Document =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
        if document.subject.common_name.trim().is_empty() {
            return Err(DecodeError::MissingCommonName);
        }

        Ok(document.subject.into())
    }
}
