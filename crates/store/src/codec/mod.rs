//! Encodings for stored values.
//!
//! Every codec is pure and self-describing enough that truncated or foreign
//! content fails to decode instead of producing a partial value.

mod certificate;
mod distinguished_name;
mod key_pair;

pub use certificate::CertificateCodec;
pub use distinguished_name::{DistinguishedNameCodec, DN_FORMAT_VERSION};
pub use key_pair::KeyPairCodec;

use crate::error::DecodeError;

/// Bidirectional transform between a value and its stored bytes.
///
/// `decode(&encode(x)) == Ok(x)` for every valid `x`.
pub trait Codec {
    type Item;

    fn encode(item: &Self::Item) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> Result<Self::Item, DecodeError>;
}

const PEM_BEGIN: &str = "-----BEGIN ";

/// Parse every PEM block in `bytes`, rejecting any block left unterminated.
fn parse_pem_blocks(bytes: &[u8]) -> Result<Vec<pem::Pem>, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DecodeError::Pem(format!("not UTF-8: {}", e)))?;

    let blocks = pem::parse_many(text).map_err(|e| DecodeError::Pem(e.to_string()))?;

    // parse_many skips blocks without an END line
    let opened = text.matches(PEM_BEGIN).count();
    if opened != blocks.len() {
        return Err(DecodeError::Pem(format!(
            "{} block(s) opened but {} complete",
            opened,
            blocks.len()
        )));
    }

    if let Some(empty) = blocks.iter().find(|block| block.contents().is_empty()) {
        return Err(DecodeError::EmptyBlock(empty.tag().to_string()));
    }

    Ok(blocks)
}
