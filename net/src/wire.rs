//! Concrete binary wire codec (§6, SPEC_FULL §2).
//!
//! One-byte type discriminant, then the sender address, then the
//! type's own fields in declaration order. Every variable-length field
//! (a digest list, a key, a value) is a `u16` length prefix followed by
//! that many inline bytes copied into the buffer — never a pointer
//! into a separately heap-allocated array, which is the use-after-free
//! hazard §9 calls out in the original C++ source.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::{Address, Digest, Message};

#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer truncated: needed {needed} more byte(s)")]
    Truncated { needed: usize },
    #[error("unknown message tag {0}")]
    BadTag(u8),
    #[error("value is not valid utf-8")]
    BadUtf8,
}

const TAG_JOINREQ: u8 = 0;
const TAG_JOINREP: u8 = 1;
const TAG_PING: u8 = 2;
const TAG_CREATE: u8 = 3;
const TAG_READ: u8 = 4;
const TAG_UPDATE: u8 = 5;
const TAG_DELETE: u8 = 6;
const TAG_REPLY: u8 = 7;
const TAG_READREPLY: u8 = 8;

pub fn encode(msg: &Message) -> Bytes {
    let mut buf = BytesMut::with_capacity(64);
    match msg {
        Message::JoinReq { from } => {
            buf.put_u8(TAG_JOINREQ);
            put_address(&mut buf, *from);
        }
        Message::JoinRep { from, digest } => {
            buf.put_u8(TAG_JOINREP);
            put_address(&mut buf, *from);
            put_digest(&mut buf, digest);
        }
        Message::Ping {
            from,
            heartbeat,
            digest,
        } => {
            buf.put_u8(TAG_PING);
            put_address(&mut buf, *from);
            buf.put_u64_le(*heartbeat);
            put_digest(&mut buf, digest);
        }
        Message::Create {
            from,
            trans_id,
            key,
            value,
        } => {
            buf.put_u8(TAG_CREATE);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
            put_string(&mut buf, value);
        }
        Message::Read {
            from,
            trans_id,
            key,
        } => {
            buf.put_u8(TAG_READ);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
        }
        Message::Update {
            from,
            trans_id,
            key,
            value,
        } => {
            buf.put_u8(TAG_UPDATE);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
            put_string(&mut buf, value);
        }
        Message::Delete {
            from,
            trans_id,
            key,
        } => {
            buf.put_u8(TAG_DELETE);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
        }
        Message::Reply {
            from,
            trans_id,
            key,
            success,
        } => {
            buf.put_u8(TAG_REPLY);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
            buf.put_u8(*success as u8);
        }
        Message::ReadReply {
            from,
            trans_id,
            key,
            value,
            success,
        } => {
            buf.put_u8(TAG_READREPLY);
            put_address(&mut buf, *from);
            buf.put_i64_le(*trans_id);
            put_string(&mut buf, key);
            put_string(&mut buf, value);
            buf.put_u8(*success as u8);
        }
    }
    buf.freeze()
}

pub fn decode(bytes: &[u8]) -> Result<Message, Error> {
    let mut buf = bytes;
    let tag = get_u8(&mut buf)?;
    let from = get_address(&mut buf)?;
    let msg = match tag {
        TAG_JOINREQ => Message::JoinReq { from },
        TAG_JOINREP => {
            let digest = get_digest(&mut buf)?;
            Message::JoinRep { from, digest }
        }
        TAG_PING => {
            let heartbeat = get_u64(&mut buf)?;
            let digest = get_digest(&mut buf)?;
            Message::Ping {
                from,
                heartbeat,
                digest,
            }
        }
        TAG_CREATE => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            let value = get_string(&mut buf)?;
            Message::Create {
                from,
                trans_id,
                key,
                value,
            }
        }
        TAG_READ => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            Message::Read {
                from,
                trans_id,
                key,
            }
        }
        TAG_UPDATE => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            let value = get_string(&mut buf)?;
            Message::Update {
                from,
                trans_id,
                key,
                value,
            }
        }
        TAG_DELETE => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            Message::Delete {
                from,
                trans_id,
                key,
            }
        }
        TAG_REPLY => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            let success = get_u8(&mut buf)? != 0;
            Message::Reply {
                from,
                trans_id,
                key,
                success,
            }
        }
        TAG_READREPLY => {
            let trans_id = get_i64(&mut buf)?;
            let key = get_string(&mut buf)?;
            let value = get_string(&mut buf)?;
            let success = get_u8(&mut buf)? != 0;
            Message::ReadReply {
                from,
                trans_id,
                key,
                value,
                success,
            }
        }
        other => return Err(Error::BadTag(other)),
    };
    Ok(msg)
}

fn put_address(buf: &mut BytesMut, addr: Address) {
    buf.put_slice(&addr.to_bytes());
}

fn put_digest(buf: &mut BytesMut, digest: &[Digest]) {
    buf.put_u16_le(digest.len() as u16);
    for entry in digest {
        buf.put_slice(&entry.address.to_bytes());
        buf.put_u64_le(entry.heartbeat);
    }
}

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u16_le(s.len() as u16);
    buf.put_slice(s.as_bytes());
}

fn need(buf: &[u8], n: usize) -> Result<(), Error> {
    if buf.len() < n {
        Err(Error::Truncated { needed: n - buf.len() })
    } else {
        Ok(())
    }
}

fn get_u8(buf: &mut &[u8]) -> Result<u8, Error> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn get_u64(buf: &mut &[u8]) -> Result<u64, Error> {
    need(buf, 8)?;
    Ok(buf.get_u64_le())
}

fn get_i64(buf: &mut &[u8]) -> Result<i64, Error> {
    need(buf, 8)?;
    Ok(buf.get_i64_le())
}

fn get_address(buf: &mut &[u8]) -> Result<Address, Error> {
    need(buf, 6)?;
    let mut raw = [0u8; 6];
    buf.copy_to_slice(&mut raw);
    Ok(Address::from_bytes(raw))
}

fn get_digest(buf: &mut &[u8]) -> Result<Vec<Digest>, Error> {
    need(buf, 2)?;
    let count = buf.get_u16_le() as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let address = get_address(buf)?;
        let heartbeat = get_u64(buf)?;
        out.push(Digest { address, heartbeat });
    }
    Ok(out)
}

fn get_string(buf: &mut &[u8]) -> Result<String, Error> {
    need(buf, 2)?;
    let len = buf.get_u16_le() as usize;
    need(buf, len)?;
    let mut raw = vec![0u8; len];
    buf.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| Error::BadUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: u32, port: u16) -> Address {
        Address::new(id, port)
    }

    #[test]
    fn round_trips_ping_with_digest() {
        let msg = Message::Ping {
            from: addr(1, 0),
            heartbeat: 7,
            digest: vec![
                Digest { address: addr(2, 0), heartbeat: 3 },
                Digest { address: addr(3, 0), heartbeat: 9 },
            ],
        };
        let bytes = encode(&msg);
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn round_trips_every_kv_variant() {
        let msgs = vec![
            Message::Create { from: addr(1, 0), trans_id: 5, key: "k".into(), value: "v".into() },
            Message::Read { from: addr(1, 0), trans_id: 5, key: "k".into() },
            Message::Update { from: addr(1, 0), trans_id: 5, key: "k".into(), value: "v2".into() },
            Message::Delete { from: addr(1, 0), trans_id: 5, key: "k".into() },
            Message::Reply { from: addr(2, 0), trans_id: 5, key: "k".into(), success: true },
            Message::ReadReply {
                from: addr(2, 0),
                trans_id: 5,
                key: "k".into(),
                value: "v".into(),
                success: true,
            },
        ];
        for msg in msgs {
            let bytes = encode(&msg);
            assert_eq!(decode(&bytes).unwrap(), msg);
        }
    }

    #[test]
    fn stabilization_create_uses_trans_id_negative_one() {
        let msg = Message::Create {
            from: addr(1, 0),
            trans_id: -1,
            key: "k".into(),
            value: "v".into(),
        };
        assert!(msg.is_stabilization());
        let bytes = encode(&msg);
        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_stabilization());
    }

    #[test]
    fn truncated_buffer_is_an_error_not_a_panic() {
        let msg = Message::JoinReq { from: addr(1, 0) };
        let bytes = encode(&msg);
        let err = decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let mut bytes = encode(&Message::JoinReq { from: addr(1, 0) }).to_vec();
        bytes[0] = 200;
        assert!(matches!(decode(&bytes), Err(Error::BadTag(200))));
    }
}
