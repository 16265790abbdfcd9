//! Type-safe identifiers for certvault storage slots.
//!
//! Every stored artifact lives in a slot addressed by an [`Owner`] (the ACME
//! account or a domain) and an [`EntityKind`]. Domains are normalized once,
//! at construction, so a store and a later lookup always agree on the slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a domain name in its textual form
pub const MAX_DOMAIN_LEN: usize = 253;

/// Maximum length of a single DNS label
pub const MAX_LABEL_LEN: usize = 63;

/// Reasons a string cannot be used as a domain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("domain name is empty")]
    Empty,

    #[error("domain name is {len} bytes long, limit is {max}", max = MAX_DOMAIN_LEN)]
    TooLong { len: usize },

    #[error("domain name '{domain}' contains an empty label")]
    EmptyLabel { domain: String },

    #[error("label '{label}' exceeds {max} bytes", max = MAX_LABEL_LEN)]
    LabelTooLong { label: String },

    #[error("label '{label}' starts or ends with a hyphen")]
    HyphenBoundary { label: String },

    #[error("invalid character {ch:?} in domain name '{domain}'")]
    InvalidCharacter { domain: String, ch: char },

    #[error("wildcard is only allowed as the leftmost label of a longer name: '{domain}'")]
    InvalidWildcard { domain: String },
}

/// Normalized domain identifier.
///
/// Normalization trims surrounding whitespace, drops one trailing dot and
/// lower-cases ASCII letters. Only `[a-z0-9-_]` labels and a leading `*`
/// wildcard label survive validation, so a `DomainName` is always safe to
/// use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Parse and normalize a domain name
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
        let name = trimmed.to_ascii_lowercase();

        if name.is_empty() {
            return Err(IdError::Empty);
        }
        if name.len() > MAX_DOMAIN_LEN {
            return Err(IdError::TooLong { len: name.len() });
        }

        let label_count = name.split('.').count();
        for (index, label) in name.split('.').enumerate() {
            if label.is_empty() {
                return Err(IdError::EmptyLabel { domain: name.clone() });
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(IdError::LabelTooLong {
                    label: label.to_string(),
                });
            }
            if label == "*" {
                if index != 0 || label_count == 1 {
                    return Err(IdError::InvalidWildcard { domain: name.clone() });
                }
                continue;
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(IdError::HyphenBoundary {
                    label: label.to_string(),
                });
            }
            if let Some(ch) = label
                .chars()
                .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
            {
                return Err(IdError::InvalidCharacter { domain: name.clone(), ch });
            }
        }

        Ok(Self(name))
    }

    /// Get the normalized string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a wildcard name (`*.example.com`)
    pub fn is_wildcard(&self) -> bool {
        self.0.starts_with("*.")
    }

    /// Convert to owned String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DomainName {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl TryFrom<&str> for DomainName {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<DomainName> for String {
    fn from(domain: DomainName) -> Self {
        domain.0
    }
}

/// Kind of artifact held by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    KeyPair,
    DistinguishedName,
    Certificate,
}

impl EntityKind {
    /// Whether content of this kind is private key material
    pub fn is_secret(self) -> bool {
        matches!(self, EntityKind::KeyPair)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::KeyPair => "key-pair",
            EntityKind::DistinguishedName => "distinguished-name",
            EntityKind::Certificate => "certificate",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of a slot.
///
/// The account has its own variant rather than a reserved domain string, so
/// no domain can ever alias the account key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Account,
    Domain(DomainName),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Account => f.write_str("account"),
            Owner::Domain(domain) => write!(f, "domain {}", domain),
        }
    }
}

/// Address of one independently committed unit of storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    owner: Owner,
    kind: EntityKind,
}

impl SlotKey {
    /// The account key pair slot
    pub fn account_key_pair() -> Self {
        Self {
            owner: Owner::Account,
            kind: EntityKind::KeyPair,
        }
    }

    /// A per-domain slot
    pub fn domain(domain: DomainName, kind: EntityKind) -> Self {
        Self {
            owner: Owner::Domain(domain),
            kind,
        }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether the slot holds private key material
    pub fn is_secret(&self) -> bool {
        self.kind.is_secret()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.owner, self.kind)
    }
}
