//! Values stored by the repository.
//!
//! Key and certificate bytes are opaque DER; nothing here parses X.509 or
//! key structures beyond checking that the pieces are present.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Asymmetric key algorithm of a [`KeyPair`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
}

impl KeyAlgorithm {
    /// Label used in PEM tags (`RSA PRIVATE KEY`, `EC PUBLIC KEY`, ...)
    pub fn pem_label(self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "ED25519",
        }
    }

    pub fn from_pem_label(label: &str) -> Option<Self> {
        match label {
            "RSA" => Some(KeyAlgorithm::Rsa),
            "EC" => Some(KeyAlgorithm::Ec),
            "ED25519" => Some(KeyAlgorithm::Ed25519),
            _ => None,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pem_label())
    }
}

/// Public and private halves of an account or domain key.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    algorithm: KeyAlgorithm,
    public_key: Vec<u8>,
    private_key: Vec<u8>,
}

impl KeyPair {
    pub fn new(
        algorithm: KeyAlgorithm,
        public_key: impl Into<Vec<u8>>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            algorithm,
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// DER-encoded public key
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// DER-encoded private key
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// Check that both halves are present
    pub fn validate(&self) -> StoreResult<()> {
        if self.private_key.is_empty() {
            return Err(StoreError::InvalidInput(
                "key pair has an empty private key".to_string(),
            ));
        }
        if self.public_key.is_empty() {
            return Err(StoreError::InvalidInput(
                "key pair has an empty public key".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("public_key_len", &self.public_key.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Subject fields used to build a certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country_name: Option<String>,
    pub state_or_province_name: Option<String>,
    pub locality_name: Option<String>,
    pub organization_name: Option<String>,
    pub organizational_unit_name: Option<String>,
    pub email_address: Option<String>,
    pub subject_alternative_names: Vec<String>,
}

impl DistinguishedName {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Default::default()
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country_name = Some(country.into());
        self
    }

    pub fn with_state_or_province(mut self, state: impl Into<String>) -> Self {
        self.state_or_province_name = Some(state.into());
        self
    }

    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality_name = Some(locality.into());
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization_name = Some(organization.into());
        self
    }

    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit_name = Some(unit.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_address = Some(email.into());
        self
    }

    pub fn with_subject_alternative_names<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.subject_alternative_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.common_name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "distinguished name has no common name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Issued certificate with its issuer chain.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    /// Issuers, nearest first
    chain: Vec<Vec<u8>>,
}

impl Certificate {
    pub fn new(der: impl Into<Vec<u8>>) -> Self {
        Self {
            der: der.into(),
            chain: Vec::new(),
        }
    }

    pub fn with_chain<I, T>(mut self, chain: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        self.chain = chain.into_iter().map(Into::into).collect();
        self
    }

    /// DER bytes of the leaf certificate
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// The issuing certificate, carrying the remainder of the chain
    pub fn issuer(&self) -> Option<Certificate> {
        let (first, rest) = self.chain.split_first()?;
        Some(Certificate {
            der: first.clone(),
            chain: rest.to_vec(),
        })
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.der.is_empty() {
            return Err(StoreError::InvalidInput("certificate is empty".to_string()));
        }
        if self.chain.iter().any(Vec::is_empty) {
            return Err(StoreError::InvalidInput(
                "certificate chain contains an empty certificate".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("der_len", &self.der.len())
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// Input of a certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    distinguished_name: DistinguishedName,
    key_pair: KeyPair,
}

impl CertificateRequest {
    pub fn new(distinguished_name: DistinguishedName, key_pair: KeyPair) -> Self {
        Self {
            distinguished_name,
            key_pair,
        }
    }

    pub fn distinguished_name(&self) -> &DistinguishedName {
        &self.distinguished_name
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}

/// Result of a completed issuance. Decomposed by the repository, never stored whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateResponse {
    request: CertificateRequest,
    certificate: Certificate,
}

impl CertificateResponse {
    pub fn new(request: CertificateRequest, certificate: Certificate) -> Self {
        Self {
            request,
            certificate,
        }
    }

    pub fn request(&self) -> &CertificateRequest {
        &self.request
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    pub fn distinguished_name(&self) -> &DistinguishedName {
        self.request.distinguished_name()
    }
}
