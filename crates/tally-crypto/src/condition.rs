//! PREIMAGE-SHA-256 crypto-conditions.
//!
//! Conditions and fulfillments use the DER encoding of the crypto-conditions
//! format. Only the preimage type is supported; the other defined types are
//! recognised and rejected as unsupported.
//!
//! ```text
//! condition   = A0 25 | 80 20 <sha256(preimage)> | 81 <n> <cost>
//! fulfillment = A0 <len> | 80 <len> <preimage>
//! ```
//!
//! Decoding is byte-exact: minimal lengths and integers, no trailing bytes.

use sha2::{Digest, Sha256};
use tally_types::limits::{MAX_FULFILLMENT_LEN, MAX_PREIMAGE_LEN};

const TAG_PREIMAGE_SHA256: u8 = 0xA0;
const TAG_FINGERPRINT: u8 = 0x80;
const TAG_COST: u8 = 0x81;
const TAG_PREIMAGE: u8 = 0x80;
const FINGERPRINT_LEN: usize = 32;

/// Errors from decoding or validating crypto-conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("input ended early")]
    Truncated,

    #[error("unexpected tag: expected {expected:#04x}, found {found:#04x}")]
    UnexpectedTag { expected: u8, found: u8 },

    #[error("unsupported condition type {0}")]
    UnsupportedType(u8),

    #[error("{0} trailing bytes after encoded value")]
    TrailingBytes(usize),

    #[error("length is not minimally encoded")]
    NonMinimalLength,

    #[error("length field too large")]
    LengthOverflow,

    #[error("integer is not minimally encoded or is negative")]
    InvalidInteger,

    #[error("integer does not fit in 32 bits")]
    IntegerOverflow,

    #[error("fingerprint must be {FINGERPRINT_LEN} bytes, got {0}")]
    BadFingerprintLength(usize),

    #[error("preimage of {0} bytes exceeds the maximum")]
    PreimageTooLong(usize),

    #[error("encoded fulfillment of {0} bytes exceeds the maximum")]
    FulfillmentTooLarge(usize),
}

/// Crypto-condition types, by their type id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConditionType {
    PreimageSha256 = 0,
    PrefixSha256 = 1,
    ThresholdSha256 = 2,
    RsaSha256 = 3,
    Ed25519Sha256 = 4,
}

impl ConditionType {
    fn from_tag(tag: u8) -> Result<Self, ConditionError> {
        match tag {
            0xA0 => Ok(Self::PreimageSha256),
            0xA1 => Err(ConditionError::UnsupportedType(Self::PrefixSha256 as u8)),
            0xA2 => Err(ConditionError::UnsupportedType(Self::ThresholdSha256 as u8)),
            0xA3 => Err(ConditionError::UnsupportedType(Self::RsaSha256 as u8)),
            0xA4 => Err(ConditionError::UnsupportedType(Self::Ed25519Sha256 as u8)),
            found => Err(ConditionError::UnexpectedTag {
                expected: TAG_PREIMAGE_SHA256,
                found,
            }),
        }
    }
}

/// A decoded condition: the hash commitment stored on an escrow.
///
/// Only [`Condition::decode`] and [`Fulfillment::condition`] construct one,
/// so every value encodes to bytes `decode` accepts.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Condition {
    kind: ConditionType,
    fingerprint: [u8; 32],
    cost: u32,
}

impl Condition {
    pub fn kind(&self) -> ConditionType {
        self.kind
    }

    /// SHA-256 of the preimage.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Decode a condition, rejecting any deviation from the canonical form.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConditionError> {
        let mut reader = DerReader::new(bytes);
        let kind = ConditionType::from_tag(reader.read_byte()?)?;
        let body_len = reader.read_length()?;
        let mut body = DerReader::new(reader.read_bytes(body_len)?);
        reader.finish()?;

        body.expect_tag(TAG_FINGERPRINT)?;
        let fp_len = body.read_length()?;
        if fp_len != FINGERPRINT_LEN {
            return Err(ConditionError::BadFingerprintLength(fp_len));
        }
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(body.read_bytes(FINGERPRINT_LEN)?);

        body.expect_tag(TAG_COST)?;
        let cost_len = body.read_length()?;
        let cost = decode_unsigned(body.read_bytes(cost_len)?)?;
        body.finish()?;

        if cost as usize > MAX_PREIMAGE_LEN {
            return Err(ConditionError::PreimageTooLong(cost as usize));
        }

        Ok(Self {
            kind,
            fingerprint,
            cost,
        })
    }

    /// Canonical DER encoding.
    pub fn encode(&self) -> Vec<u8> {
        let cost = encode_unsigned(self.cost);
        let mut body = Vec::with_capacity(2 + FINGERPRINT_LEN + 2 + cost.len());
        body.push(TAG_FINGERPRINT);
        write_length(&mut body, FINGERPRINT_LEN);
        body.extend_from_slice(&self.fingerprint);
        body.push(TAG_COST);
        write_length(&mut body, cost.len());
        body.extend_from_slice(&cost);

        let mut out = Vec::with_capacity(body.len() + 3);
        out.push(TAG_PREIMAGE_SHA256);
        write_length(&mut out, body.len());
        out.extend_from_slice(&body);
        out
    }
}

/// A decoded PREIMAGE-SHA-256 fulfillment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    preimage: Vec<u8>,
}

impl Fulfillment {
    /// Build a fulfillment for a preimage.
    pub fn from_preimage(preimage: impl Into<Vec<u8>>) -> Result<Self, ConditionError> {
        let preimage = preimage.into();
        if preimage.len() > MAX_PREIMAGE_LEN {
            return Err(ConditionError::PreimageTooLong(preimage.len()));
        }
        Ok(Self { preimage })
    }

    /// Decode a fulfillment, rejecting any deviation from the canonical form.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConditionError> {
        if bytes.len() > MAX_FULFILLMENT_LEN {
            return Err(ConditionError::FulfillmentTooLarge(bytes.len()));
        }
        let mut reader = DerReader::new(bytes);
        ConditionType::from_tag(reader.read_byte()?)?;
        let body_len = reader.read_length()?;
        let mut body = DerReader::new(reader.read_bytes(body_len)?);
        reader.finish()?;

        body.expect_tag(TAG_PREIMAGE)?;
        let preimage_len = body.read_length()?;
        if preimage_len > MAX_PREIMAGE_LEN {
            return Err(ConditionError::PreimageTooLong(preimage_len));
        }
        let preimage = body.read_bytes(preimage_len)?.to_vec();
        body.finish()?;

        Ok(Self { preimage })
    }

    /// Canonical DER encoding.
    pub fn encode(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.preimage.len() + 3);
        body.push(TAG_PREIMAGE);
        write_length(&mut body, self.preimage.len());
        body.extend_from_slice(&self.preimage);

        let mut out = Vec::with_capacity(body.len() + 3);
        out.push(TAG_PREIMAGE_SHA256);
        write_length(&mut out, body.len());
        out.extend_from_slice(&body);
        out
    }

    pub fn preimage(&self) -> &[u8] {
        &self.preimage
    }

    /// The condition this fulfillment satisfies.
    pub fn condition(&self) -> Condition {
        let digest = Sha256::digest(&self.preimage);
        let mut fingerprint = [0u8; 32];
        fingerprint.copy_from_slice(&digest);
        Condition {
            kind: ConditionType::PreimageSha256,
            fingerprint,
            cost: self.preimage.len() as u32,
        }
    }

    /// Returns `true` if this fulfillment satisfies `condition`.
    pub fn satisfies(&self, condition: &Condition) -> bool {
        self.condition() == *condition
    }
}

/// Decode both encodings and check that the fulfillment satisfies the
/// condition. Any decode failure is reported as an error.
pub fn validate(fulfillment: &[u8], condition: &[u8]) -> Result<bool, ConditionError> {
    let fulfillment = Fulfillment::decode(fulfillment)?;
    let condition = Condition::decode(condition)?;
    Ok(fulfillment.satisfies(&condition))
}

struct DerReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_byte(&mut self) -> Result<u8, ConditionError> {
        let byte = *self.buf.get(self.pos).ok_or(ConditionError::Truncated)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ConditionError> {
        let end = self.pos.checked_add(n).ok_or(ConditionError::Truncated)?;
        let slice = self.buf.get(self.pos..end).ok_or(ConditionError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn expect_tag(&mut self, expected: u8) -> Result<(), ConditionError> {
        let found = self.read_byte()?;
        if found != expected {
            return Err(ConditionError::UnexpectedTag { expected, found });
        }
        Ok(())
    }

    /// Short form below 128, long form with one or two length bytes.
    fn read_length(&mut self) -> Result<usize, ConditionError> {
        let first = self.read_byte()?;
        if first < 0x80 {
            return Ok(first as usize);
        }
        match first {
            0x81 => {
                let len = self.read_byte()? as usize;
                if len < 0x80 {
                    return Err(ConditionError::NonMinimalLength);
                }
                Ok(len)
            }
            0x82 => {
                let hi = self.read_byte()? as usize;
                let lo = self.read_byte()? as usize;
                let len = (hi << 8) | lo;
                if len < 0x100 {
                    return Err(ConditionError::NonMinimalLength);
                }
                Ok(len)
            }
            _ => Err(ConditionError::LengthOverflow),
        }
    }

    fn finish(&self) -> Result<(), ConditionError> {
        match self.buf.len() - self.pos {
            0 => Ok(()),
            extra => Err(ConditionError::TrailingBytes(extra)),
        }
    }
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
}

fn decode_unsigned(bytes: &[u8]) -> Result<u32, ConditionError> {
    let Some(&first) = bytes.first() else {
        return Err(ConditionError::InvalidInteger);
    };
    if first & 0x80 != 0 {
        return Err(ConditionError::InvalidInteger);
    }
    if bytes.len() > 1 && first == 0 && bytes[1] & 0x80 == 0 {
        return Err(ConditionError::InvalidInteger);
    }
    if bytes.len() > 5 || (bytes.len() == 5 && first != 0) {
        return Err(ConditionError::IntegerOverflow);
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)) as u32)
}

fn encode_unsigned(value: u32) -> Vec<u8> {
    let raw = value.to_be_bytes();
    let skip = raw.iter().take(3).take_while(|b| **b == 0).count();
    let mut out = raw[skip..].to_vec();
    if out[0] & 0x80 != 0 {
        out.insert(0, 0);
    }
    out
}
