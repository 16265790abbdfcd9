//! Certificate encoding: a `# certificates: N` header line, then `N`
//! `CERTIFICATE` blocks, leaf first, then issuers.
//!
//! The header makes a chain cut on a block boundary detectable; the blocks
//! alone would still parse as a shorter chain.

use pem::Pem;

use super::{parse_pem_blocks, Codec};
use crate::error::DecodeError;
use crate::model::Certificate;

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const COUNT_HEADER: &str = "# certificates: ";

/// Split the block count header from the PEM body
fn split_header(bytes: &[u8]) -> Result<(usize, &[u8]), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| DecodeError::Header("header line is not terminated".to_string()))?;
    let line = std::str::from_utf8(&bytes[..newline])
        .map_err(|e| DecodeError::Header(format!("not UTF-8: {}", e)))?;
    let count = line
        .trim_end_matches('\r')
        .strip_prefix(COUNT_HEADER)
        .ok_or_else(|| DecodeError::Header(format!("expected '{}N', found {:?}", COUNT_HEADER, line)))?
        .parse::<usize>()
        .map_err(|e| DecodeError::Header(format!("bad block count: {}", e)))?;
    if count == 0 {
        return Err(DecodeError::Header("block count is zero".to_string()));
    }
    Ok((count, &bytes[newline + 1..]))
}

pub struct CertificateCodec;

impl Codec for CertificateCodec {
    type Item = Certificate;

    fn encode(cert: &Certificate) -> Vec<u8> {
        let blocks: Vec<Pem> = std::iter::once(cert.der())
            .chain(cert.chain().iter().map(Vec::as_slice))
            .map(|der| Pem::new(CERTIFICATE_TAG, der))
            .collect();
        let mut out = format!("{}{}\n", COUNT_HEADER, blocks.len()).into_bytes();
        out.extend_from_slice(pem::encode_many(&blocks).as_bytes());
        out
    }

    fn decode(bytes: &[u8]) -> Result<Certificate, DecodeError> {
        let (expected, body) = split_header(bytes)?;
        let blocks = parse_pem_blocks(body)?;
        if blocks.len() != expected {
            return Err(DecodeError::BlockCount {
                expected,
                found: blocks.len(),
            });
        }

        if let Some(foreign) = blocks.iter().find(|block| block.tag() != CERTIFICATE_TAG) {
            return Err(DecodeError::UnexpectedTag(foreign.tag().to_string()));
        }

        let mut ders = blocks.into_iter().map(Pem::into_contents);
        let leaf = ders.next().ok_or(DecodeError::BlockCount {
            expected: 1,
            found: 0,
        })?;

        Ok(Certificate::new(leaf).with_chain(ders))
    }
}
