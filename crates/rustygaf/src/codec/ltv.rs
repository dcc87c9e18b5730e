//! Length/Type/Value records
//!
//! Codec capabilities, codec configuration and metadata are sequences of LTV
//! records: one length byte covering type and value, one type byte, then the value.

use super::constants::*;
use super::types::{CodecError, CodecResult};
use std::fmt;

/// One LTV record. The value never exceeds 254 bytes so the length byte
/// always fits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ltv {
    ltv_type: u8,
    value: Vec<u8>,
}

impl Ltv {
    pub fn new(ltv_type: u8, value: Vec<u8>) -> CodecResult<Self> {
        if value.len() > u8::MAX as usize - 1 {
            return Err(CodecError::ValueTooLong(value.len()));
        }
        Ok(Self { ltv_type, value })
    }

    pub fn from_u8(ltv_type: u8, value: u8) -> Self {
        Self {
            ltv_type,
            value: vec![value],
        }
    }

    pub fn from_u16(ltv_type: u8, value: u16) -> Self {
        Self {
            ltv_type,
            value: value.to_le_bytes().to_vec(),
        }
    }

    pub fn from_u32(ltv_type: u8, value: u32) -> Self {
        Self {
            ltv_type,
            value: value.to_le_bytes().to_vec(),
        }
    }

    pub fn ltv_type(&self) -> u8 {
        self.ltv_type
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Value of the length byte
    pub fn length(&self) -> u8 {
        (self.value.len() + 1) as u8
    }

    /// Encoded size, length byte included
    pub fn encoded_len(&self) -> usize {
        BAP_LTV_HEADER_LEN + 1 + self.value.len()
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.length());
        buf.push(self.ltv_type);
        buf.extend_from_slice(&self.value);
    }

    fn expect_len(&self, length: usize) -> CodecResult<()> {
        if self.value.len() != length {
            return Err(CodecError::InvalidValueLength {
                ltv_type: self.ltv_type,
                length: self.value.len(),
            });
        }
        Ok(())
    }

    pub fn as_u8(&self) -> CodecResult<u8> {
        self.expect_len(1)?;
        Ok(self.value[0])
    }

    pub fn as_u16(&self) -> CodecResult<u16> {
        self.expect_len(2)?;
        Ok(u16::from_le_bytes([self.value[0], self.value[1]]))
    }

    pub fn as_u32(&self) -> CodecResult<u32> {
        self.expect_len(4)?;
        Ok(u32::from_le_bytes([
            self.value[0],
            self.value[1],
            self.value[2],
            self.value[3],
        ]))
    }
}

/// Ordered list of LTV records
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LtvList {
    records: Vec<Ltv>,
}

impl LtvList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete LTV sequence. Every record must have a non-zero length and
    /// fit entirely in `data`.
    pub fn parse(data: &[u8]) -> CodecResult<Self> {
        let mut records = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let length = data[offset];
            if length < BAP_LTV_LENGTH_MIN {
                return Err(CodecError::InvalidLtvLength(length));
            }

            let start = offset + BAP_LTV_HEADER_LEN;
            let end = start + length as usize;
            if end > data.len() {
                return Err(CodecError::LtvTruncated {
                    declared: length as usize,
                    available: data.len() - start,
                });
            }

            records.push(Ltv {
                ltv_type: data[start],
                value: data[start + 1..end].to_vec(),
            });
            offset = end;
        }

        Ok(Self { records })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        for record in &self.records {
            record.write_to(&mut buf);
        }
        buf
    }

    pub fn encoded_len(&self) -> usize {
        self.records.iter().map(Ltv::encoded_len).sum()
    }

    /// Add a record, replacing any record of the same type
    pub fn set(&mut self, record: Ltv) {
        match self.records.iter_mut().find(|r| r.ltv_type == record.ltv_type) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn push(&mut self, record: Ltv) {
        self.records.push(record);
    }

    /// First record of a given type
    pub fn get(&self, ltv_type: u8) -> Option<&Ltv> {
        self.records.iter().find(|r| r.ltv_type == ltv_type)
    }

    pub fn remove(&mut self, ltv_type: u8) -> Option<Ltv> {
        let pos = self.records.iter().position(|r| r.ltv_type == ltv_type)?;
        Some(self.records.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ltv> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for LtvList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for record in &self.records {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "{:02x}:{}", record.ltv_type, hex::encode(&record.value))?;
        }
        Ok(())
    }
}
