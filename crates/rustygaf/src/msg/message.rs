//! Message envelope and length-prefixed fields
//!
//! Every API message starts with its 16-bit code, optionally followed by a 16-bit
//! status, then the payload. Variable length fields are a u8 length followed by the
//! bytes it declares. Characteristic values can be longer and use a u16 length.

use super::code::MsgCode;
use super::constants::*;
use super::types::{MsgError, MsgResult};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// A GAF API message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message code
    pub code: MsgCode,
    /// Status, present on responses and confirmations
    pub status: Option<u16>,
    /// Message specific payload
    pub payload: Vec<u8>,
}

impl Message {
    /// Create a message without status
    pub fn new(code: MsgCode, payload: Vec<u8>) -> Self {
        Self {
            code,
            status: None,
            payload,
        }
    }

    /// Create a response or confirmation carrying a status
    pub fn with_status(code: MsgCode, status: u16, payload: Vec<u8>) -> Self {
        Self {
            code,
            status: Some(status),
            payload,
        }
    }

    /// Serialize the message
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(MSG_CODE_SIZE + MSG_STATUS_SIZE + self.payload.len());
        result.extend_from_slice(&self.code.value().to_le_bytes());
        if let Some(status) = self.status {
            result.extend_from_slice(&status.to_le_bytes());
        }
        result.extend_from_slice(&self.payload);
        result
    }

    /// Parse a message. The caller knows from the message code family whether a status follows.
    pub fn parse(data: &[u8], has_status: bool) -> MsgResult<Self> {
        let header_len = MSG_CODE_SIZE + if has_status { MSG_STATUS_SIZE } else { 0 };
        if data.len() < header_len {
            return Err(MsgError::Truncated {
                needed: header_len,
                available: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);
        let code = MsgCode::from_value(read_u16(&mut cursor)?);
        let status = if has_status {
            Some(read_u16(&mut cursor)?)
        } else {
            None
        };

        Ok(Self {
            code,
            status,
            payload: data[header_len..].to_vec(),
        })
    }

    /// True when the message has no status or a success status
    pub fn is_success(&self) -> bool {
        self.status.map_or(true, |status| status == GAF_ERR_NO_ERROR)
    }
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> MsgResult<u16> {
    let available = cursor.get_ref().len() - cursor.position() as usize;
    cursor
        .read_u16::<LittleEndian>()
        .map_err(|_| MsgError::Truncated { needed: 2, available })
}

/// Append a length-prefixed field
pub fn write_var(buf: &mut Vec<u8>, value: &[u8]) -> MsgResult<()> {
    if value.len() > u8::MAX as usize {
        return Err(MsgError::FieldTooLong(value.len()));
    }
    buf.push(value.len() as u8);
    buf.extend_from_slice(value);
    Ok(())
}

/// Append a field with a little-endian u16 length prefix
pub fn write_var16(buf: &mut Vec<u8>, value: &[u8]) -> MsgResult<()> {
    let len = u16::try_from(value.len()).map_err(|_| MsgError::FieldTooLong(value.len()))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(value);
    Ok(())
}

/// Read a length-prefixed field. The declared length must fit in the remaining bytes.
pub fn read_var(cursor: &mut Cursor<&[u8]>) -> MsgResult<Vec<u8>> {
    let remaining = remaining(cursor);
    let len = cursor.read_u8().map_err(|_| MsgError::Truncated {
        needed: 1,
        available: remaining,
    })? as usize;

    let available = remaining - 1;
    if len > available {
        return Err(MsgError::LengthMismatch {
            declared: len,
            available,
        });
    }

    let mut value = vec![0u8; len];
    cursor
        .read_exact(&mut value)
        .map_err(|_| MsgError::Truncated { needed: len, available })?;
    Ok(value)
}

/// Read a length-prefixed field that must end the buffer exactly
pub fn read_var_tail(cursor: &mut Cursor<&[u8]>) -> MsgResult<Vec<u8>> {
    let value = read_var(cursor)?;
    let left = remaining(cursor);
    if left != 0 {
        return Err(MsgError::LengthMismatch {
            declared: value.len(),
            available: value.len() + left,
        });
    }
    Ok(value)
}

/// Bytes left to read in a cursor
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}
