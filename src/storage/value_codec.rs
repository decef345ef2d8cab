use crate::{
    storage::errors::{StorageError, StorageResult},
    types::value::Value,
};

const TAG_NULL: u8 = 0;
const TAG_INT32: u8 = 1;
const TAG_INT64: u8 = 2;
const TAG_FLOAT64: u8 = 3;
const TAG_BOOL: u8 = 4;
const TAG_STRING: u8 = 5;

/// Tagged little-endian encoding of values. A row is its values
/// concatenated in schema order.
pub struct ValueCodec;

impl ValueCodec {
    pub fn serialize(value: &Value, buf: &mut Vec<u8>) {
        match value {
            Value::Null => buf.push(TAG_NULL),
            Value::Int32(v) => {
                buf.push(TAG_INT32);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            Value::Int64(v) => {
                buf.push(TAG_INT64);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            Value::Float64(v) => {
                buf.push(TAG_FLOAT64);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            Value::Boolean(v) => {
                buf.push(TAG_BOOL);
                buf.push(if *v { 1 } else { 0 });
            }
            Value::String(s) => {
                buf.push(TAG_STRING);
                let bytes = s.as_bytes();
                let len = bytes.len() as u32;
                buf.extend_from_slice(&len.to_le_bytes());
                buf.extend_from_slice(bytes);
            }
        }
    }

    pub fn deserialize(buf: &mut &[u8]) -> StorageResult<Value> {
        let tag = take::<1>(buf)?[0];

        match tag {
            TAG_NULL => Ok(Value::Null),
            TAG_INT32 => Ok(Value::Int32(i32::from_le_bytes(take(buf)?))),
            TAG_INT64 => Ok(Value::Int64(i64::from_le_bytes(take(buf)?))),
            TAG_FLOAT64 => Ok(Value::Float64(f64::from_le_bytes(take(buf)?))),
            TAG_BOOL => Ok(Value::Boolean(take::<1>(buf)?[0] != 0)),
            TAG_STRING => {
                let len = u32::from_le_bytes(take(buf)?) as usize;
                if buf.len() < len {
                    return Err(corrupted("string payload truncated"));
                }
                let (bytes, rest) = buf.split_at(len);
                *buf = rest;
                String::from_utf8(bytes.to_vec())
                    .map(Value::String)
                    .map_err(|_| corrupted("invalid UTF-8 string"))
            }
            other => Err(corrupted(format!("unknown value tag {other}"))),
        }
    }

    pub fn encode_row(values: &[Value]) -> Vec<u8> {
        let mut buf = Vec::new();
        for v in values {
            Self::serialize(v, &mut buf);
        }
        buf
    }

    pub fn decode_row(mut buf: &[u8]) -> StorageResult<Vec<Value>> {
        let mut values = Vec::new();
        while !buf.is_empty() {
            values.push(Self::deserialize(&mut buf)?);
        }
        Ok(values)
    }
}

fn take<const N: usize>(buf: &mut &[u8]) -> StorageResult<[u8; N]> {
    if buf.len() < N {
        return Err(corrupted("buffer underflow while deserializing value"));
    }
    let (head, rest) = buf.split_at(N);
    *buf = rest;
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok(out)
}

fn corrupted(reason: impl Into<String>) -> StorageError {
    StorageError::Corrupted {
        reason: reason.into(),
    }
}
