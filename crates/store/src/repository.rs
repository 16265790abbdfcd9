//! Repository façade over slot storage.
//!
//! Maps the ACME account and each domain to their stored key pair,
//! distinguished name and certificate. Domain arguments are normalized with
//! [`DomainName::parse`] on every call, so `"Example.COM."` and
//! `"example.com"` address the same slots.

use certvault_common::{DomainName, EntityKind, SlotKey};
use certvault_config::StorageConfig;
use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use crate::backend::{FsSlotStore, SlotStore};
use crate::codec::{CertificateCodec, Codec, DistinguishedNameCodec, KeyPairCodec};
use crate::error::{StoreError, StoreResult};
use crate::model::{Certificate, CertificateResponse, DistinguishedName, KeyPair};

/// Presence and last commit time of each slot of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: DomainName,
    pub key_pair: Option<DateTime<Utc>>,
    pub distinguished_name: Option<DateTime<Utc>>,
    pub certificate: Option<DateTime<Utc>>,
}

impl DomainReport {
    /// All three slots are present
    pub fn is_complete(&self) -> bool {
        self.key_pair.is_some() && self.distinguished_name.is_some() && self.certificate.is_some()
    }
}

/// Storage for ACME account and domain material.
///
/// Every store is an independent atomic write of one slot. Nothing is
/// retried; failures reach the caller as typed [`StoreError`]s.
#[derive(Debug)]
pub struct Repository<S = FsSlotStore> {
    store: S,
}

impl Repository<FsSlotStore> {
    /// Open a filesystem repository
    pub fn open(config: &StorageConfig) -> StoreResult<Self> {
        Ok(Self::with_store(FsSlotStore::open(config)?))
    }
}

impl<S: SlotStore> Repository<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    /// The underlying slot storage
    pub fn backend(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Store the key pair used to talk to the ACME server
    pub fn store_account_key_pair(&self, key_pair: &KeyPair) -> StoreResult<()> {
        key_pair.validate()?;
        self.save::<KeyPairCodec>(&SlotKey::account_key_pair(), key_pair)
    }

    pub fn has_account_key_pair(&self) -> bool {
        self.store.exists(&SlotKey::account_key_pair())
    }

    pub fn load_account_key_pair(&self) -> StoreResult<KeyPair> {
        self.fetch::<KeyPairCodec>(&SlotKey::account_key_pair())
    }

    // =========================================================================
    // Domain Operations
    // =========================================================================

    pub fn store_domain_key_pair(&self, domain: &str, key_pair: &KeyPair) -> StoreResult<()> {
        key_pair.validate()?;
        let slot = domain_slot(domain, EntityKind::KeyPair)?;
        self.save::<KeyPairCodec>(&slot, key_pair)
    }

    pub fn has_domain_key_pair(&self, domain: &str) -> bool {
        self.has(domain, EntityKind::KeyPair)
    }

    pub fn load_domain_key_pair(&self, domain: &str) -> StoreResult<KeyPair> {
        let slot = domain_slot(domain, EntityKind::KeyPair)?;
        self.fetch::<KeyPairCodec>(&slot)
    }

    pub fn store_domain_distinguished_name(
        &self,
        domain: &str,
        distinguished_name: &DistinguishedName,
    ) -> StoreResult<()> {
        distinguished_name.validate()?;
        let slot = domain_slot(domain, EntityKind::DistinguishedName)?;
        self.save::<DistinguishedNameCodec>(&slot, distinguished_name)
    }

    pub fn has_domain_distinguished_name(&self, domain: &str) -> bool {
        self.has(domain, EntityKind::DistinguishedName)
    }

    pub fn load_domain_distinguished_name(&self, domain: &str) -> StoreResult<DistinguishedName> {
        let slot = domain_slot(domain, EntityKind::DistinguishedName)?;
        self.fetch::<DistinguishedNameCodec>(&slot)
    }

    pub fn store_domain_certificate(&self, domain: &str, certificate: &Certificate) -> StoreResult<()> {
        certificate.validate()?;
        let slot = domain_slot(domain, EntityKind::Certificate)?;
        self.save::<CertificateCodec>(&slot, certificate)
    }

    pub fn has_domain_certificate(&self, domain: &str) -> bool {
        self.has(domain, EntityKind::Certificate)
    }

    pub fn load_domain_certificate(&self, domain: &str) -> StoreResult<Certificate> {
        let slot = domain_slot(domain, EntityKind::Certificate)?;
        self.fetch::<CertificateCodec>(&slot)
    }

    /// Store the artifacts of a completed issuance
    ///
    /// The domain is the normalized common name of the request's
    /// distinguished name. The request key pair, the distinguished name and
    /// the certificate are written in that order, each atomically. The
    /// certificate goes last so it is never newer than the key it was issued
    /// for. A crash part-way leaves earlier slots updated and later slots
    /// stale until issuance is re-run.
    ///
    /// Returns the domain the artifacts were stored under.
    pub fn store_certificate_response(&self, response: &CertificateResponse) -> StoreResult<DomainName> {
        let distinguished_name = response.distinguished_name();
        let domain = DomainName::parse(distinguished_name.common_name()).map_err(|e| {
            StoreError::InvalidInput(format!(
                "certificate response common name {:?} is not a usable domain: {}",
                distinguished_name.common_name(),
                e
            ))
        })?;

        let key_pair = response.request().key_pair();
        key_pair.validate()?;
        distinguished_name.validate()?;
        response.certificate().validate()?;

        self.save::<KeyPairCodec>(&SlotKey::domain(domain.clone(), EntityKind::KeyPair), key_pair)?;
        self.save::<DistinguishedNameCodec>(
            &SlotKey::domain(domain.clone(), EntityKind::DistinguishedName),
            distinguished_name,
        )?;
        self.save::<CertificateCodec>(
            &SlotKey::domain(domain.clone(), EntityKind::Certificate),
            response.certificate(),
        )?;

        info!(domain = %domain, "Stored certificate response");
        Ok(domain)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Domains with at least one stored slot
    pub fn list_domains(&self) -> StoreResult<Vec<DomainName>> {
        self.store.list_domains()
    }

    /// Which slots of a domain exist, and when each was last committed
    pub fn domain_report(&self, domain: &str) -> StoreResult<DomainReport> {
        let domain = DomainName::parse(domain)?;
        let modified = |kind| self.store.modified(&SlotKey::domain(domain.clone(), kind));

        Ok(DomainReport {
            key_pair: modified(EntityKind::KeyPair),
            distinguished_name: modified(EntityKind::DistinguishedName),
            certificate: modified(EntityKind::Certificate),
            domain,
        })
    }

    // =========================================================================
    // Slot helpers
    // =========================================================================

    fn has(&self, domain: &str, kind: EntityKind) -> bool {
        match domain_slot(domain, kind) {
            Ok(slot) => self.store.exists(&slot),
            Err(e) => {
                trace!(domain = %domain, error = %e, "Invalid domain cannot have stored slots");
                false
            }
        }
    }

    fn save<C: Codec>(&self, slot: &SlotKey, item: &C::Item) -> StoreResult<()> {
        let bytes = C::encode(item);
        self.store.write(slot, &bytes)?;
        info!(slot = %slot, size = bytes.len(), "Stored slot");
        Ok(())
    }

    fn fetch<C: Codec>(&self, slot: &SlotKey) -> StoreResult<C::Item> {
        let bytes = self.store.read(slot)?;
        let item = C::decode(&bytes).map_err(|e| {
            warn!(slot = %slot, error = %e, "Stored content failed to decode");
            StoreError::corrupt(slot, e)
        })?;
        debug!(slot = %slot, "Loaded slot");
        Ok(item)
    }
}

fn domain_slot(domain: &str, kind: EntityKind) -> StoreResult<SlotKey> {
    Ok(SlotKey::domain(DomainName::parse(domain)?, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemorySlotStore;
    use crate::model::{CertificateRequest, KeyAlgorithm};

    fn repository() -> Repository<MemorySlotStore> {
        Repository::with_store(MemorySlotStore::new())
    }

    fn key_pair(seed: u8) -> KeyPair {
        KeyPair::new(KeyAlgorithm::Ec, vec![seed; 65], vec![seed.wrapping_add(1); 32])
    }

    #[test]
    fn test_account_key_pair() {
        let repo = repository();
        assert!(!repo.has_account_key_pair());
        assert!(repo.load_account_key_pair().unwrap_err().is_not_found());

        repo.store_account_key_pair(&key_pair(1)).unwrap();
        assert!(repo.has_account_key_pair());
        assert_eq!(repo.load_account_key_pair().unwrap(), key_pair(1));
    }

    #[test]
    fn test_account_and_domain_do_not_alias() {
        let repo = repository();
        repo.store_domain_key_pair("account", &key_pair(2)).unwrap();

        assert!(!repo.has_account_key_pair());
        assert!(repo.has_domain_key_pair("account"));
    }

    #[test]
    fn test_domain_normalization_is_consistent() {
        let repo = repository();
        repo.store_domain_certificate("Example.COM.", &Certificate::new(vec![9]))
            .unwrap();

        assert!(repo.has_domain_certificate("example.com"));
        assert_eq!(
            repo.load_domain_certificate(" example.com ").unwrap(),
            Certificate::new(vec![9])
        );
    }

    #[test]
    fn test_invalid_domain() {
        let repo = repository();
        assert!(!repo.has_domain_key_pair("../etc"));
        assert!(matches!(
            repo.store_domain_key_pair("../etc", &key_pair(1)),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.load_domain_key_pair(""),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_incomplete_key_pair_never_written() {
        let repo = repository();
        repo.store_domain_key_pair("example.com", &key_pair(1)).unwrap();

        let partial = KeyPair::new(KeyAlgorithm::Ec, vec![1, 2, 3], Vec::new());
        assert!(matches!(
            repo.store_domain_key_pair("example.com", &partial),
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(repo.load_domain_key_pair("example.com").unwrap(), key_pair(1));
    }

    #[test]
    fn test_undecodable_content_is_corrupt() {
        let repo = repository();
        let slot = domain_slot("example.com", EntityKind::DistinguishedName).unwrap();
        repo.backend().write(&slot, b"{\"version\": 1, \"subj").unwrap();

        let err = repo.load_domain_distinguished_name("example.com").unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_certificate_response_requires_domain_common_name() {
        let repo = repository();
        let request = CertificateRequest::new(DistinguishedName::new("not a domain"), key_pair(1));
        let response = CertificateResponse::new(request, Certificate::new(vec![1]));

        assert!(matches!(
            repo.store_certificate_response(&response),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(repo.backend().is_empty());
    }

    #[test]
    fn test_certificate_response_with_empty_certificate_writes_nothing() {
        let repo = repository();
        let request = CertificateRequest::new(DistinguishedName::new("example.com"), key_pair(1));
        let response = CertificateResponse::new(request, Certificate::new(Vec::new()));

        assert!(repo.store_certificate_response(&response).is_err());
        assert!(repo.backend().is_empty());
    }

    #[test]
    fn test_domain_report() {
        let repo = repository();
        repo.store_domain_key_pair("example.com", &key_pair(1)).unwrap();

        let report = repo.domain_report("example.com").unwrap();
        assert!(report.key_pair.is_some());
        assert!(report.certificate.is_none());
        assert!(!report.is_complete());
    }
}
