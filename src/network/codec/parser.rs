//! Inbound message parsing.
//!
//! A received datagram may carry several netlink messages back to back;
//! [`frames`] walks them. [`QueueMessage`] then decodes one packet-delivery
//! message body into a fixed table of attribute slots. Unknown attribute
//! types are tolerated and skipped; an attribute whose length exceeds the
//! remaining buffer is a parse error.

use super::{
    nla_align, NFGEN_HDRLEN, NFQA_SLOTS, NLA_HDRLEN, NLA_TYPE_MASK, NLMSG_HDRLEN,
};
use crate::error::{RedirqError, Result};

/// One netlink message within a received datagram, header fields decoded
/// and body left raw.
#[derive(Debug)]
pub struct NetlinkMessage<'a> {
    /// Full message type (subsystem in the upper byte for nfnetlink).
    pub msg_type: u16,
    pub flags: u16,
    /// Netlink port id the message is addressed to (0 for broadcasts).
    pub port_id: u32,
    /// Message body after the fixed header.
    pub body: &'a [u8],
}

impl<'a> NetlinkMessage<'a> {
    /// For `NLMSG_ERROR` messages: the kernel's error code (0 is an ack).
    pub fn error_code(&self) -> Result<i32> {
        if self.body.len() < 4 {
            return Err(RedirqError::parse("truncated error message"));
        }
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.body[..4]);
        Ok(i32::from_ne_bytes(raw))
    }
}

/// Iterates over the complete netlink messages in one received datagram.
pub fn frames(buf: &[u8]) -> FrameIter<'_> {
    FrameIter { buf }
}

pub struct FrameIter<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Result<NetlinkMessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = self.buf;
        if buf.is_empty() {
            return None;
        }
        if buf.len() < NLMSG_HDRLEN {
            self.buf = &[];
            return Some(Err(RedirqError::parse("truncated netlink header")));
        }

        let mut raw = [0u8; 4];
        raw.copy_from_slice(&buf[0..4]);
        let msg_len = u32::from_ne_bytes(raw) as usize;
        if msg_len < NLMSG_HDRLEN || msg_len > buf.len() {
            self.buf = &[];
            return Some(Err(RedirqError::parse(format!(
                "message length {} exceeds remaining buffer",
                msg_len
            ))));
        }

        let mut half = [0u8; 2];
        half.copy_from_slice(&buf[4..6]);
        let msg_type = u16::from_ne_bytes(half);
        half.copy_from_slice(&buf[6..8]);
        let flags = u16::from_ne_bytes(half);
        raw.copy_from_slice(&buf[12..16]);
        let port_id = u32::from_ne_bytes(raw);

        let body = &buf[NLMSG_HDRLEN..msg_len];
        let advance = nla_align(msg_len).min(buf.len());
        self.buf = &buf[advance..];

        Some(Ok(NetlinkMessage {
            msg_type,
            flags,
            port_id,
            body,
        }))
    }
}

/// A parsed packet-delivery message: the originating queue number plus a
/// slot per attribute type. Ephemeral, scoped to one receive-dispatch cycle.
pub struct QueueMessage<'a> {
    /// Queue number echoed by the kernel in the extra header.
    pub queue_num: u16,
    attrs: [Option<&'a [u8]>; NFQA_SLOTS],
}

impl<'a> QueueMessage<'a> {
    /// Parses a message body (extra header followed by the attribute stream).
    pub fn parse(body: &'a [u8]) -> Result<Self> {
        if body.len() < NFGEN_HDRLEN {
            return Err(RedirqError::parse("message too short for extra header"));
        }
        let queue_num = u16::from_be_bytes([body[2], body[3]]);

        let mut attrs: [Option<&'a [u8]>; NFQA_SLOTS] = [None; NFQA_SLOTS];
        let mut rest = &body[NFGEN_HDRLEN..];
        while rest.len() >= NLA_HDRLEN {
            let nla_len = u16::from_ne_bytes([rest[0], rest[1]]) as usize;
            if nla_len < NLA_HDRLEN || nla_len > rest.len() {
                return Err(RedirqError::parse(format!(
                    "attribute length {} exceeds remaining {} bytes",
                    nla_len,
                    rest.len()
                )));
            }
            let attr_type = u16::from_ne_bytes([rest[2], rest[3]]) & NLA_TYPE_MASK;
            if (attr_type as usize) < NFQA_SLOTS {
                attrs[attr_type as usize] = Some(&rest[NLA_HDRLEN..nla_len]);
            }
            // Unknown types fall through: skipped, not failed.
            rest = &rest[nla_align(nla_len).min(rest.len())..];
        }

        Ok(QueueMessage { queue_num, attrs })
    }

    /// Raw value of an attribute, or `None` when absent.
    pub fn attr(&self, attr_type: u16) -> Option<&'a [u8]> {
        self.attrs.get(attr_type as usize).copied().flatten()
    }

    /// 32-bit attribute value converted from network byte order. `None`
    /// when the attribute is absent or shorter than four bytes.
    pub fn attr_u32(&self, attr_type: u16) -> Option<u32> {
        let value = self.attr(attr_type)?;
        if value.len() < 4 {
            return None;
        }
        Some(u32::from_be_bytes([value[0], value[1], value[2], value[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::codec::{
        MessageBuilder, NFQA_CAP_LEN, NFQA_PAYLOAD, NFQNL_MSG_PACKET,
    };

    #[test]
    fn test_attribute_round_trip() {
        // Encoding then parsing yields the original tag and byte-exact value,
        // including zero-length and odd-length (padded) values.
        for value in [&[0u8; 0][..], &[9][..], &[1, 2, 3, 4][..], &[5, 6, 7][..]] {
            let mut buf = Vec::new();
            let mut msg = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 3);
            msg.put_bytes(NFQA_PAYLOAD, value);
            let frame = msg.finish();

            let parsed = QueueMessage::parse(&frame[16..]).unwrap();
            assert_eq!(parsed.queue_num, 3);
            assert_eq!(parsed.attr(NFQA_PAYLOAD), Some(value));
        }
    }

    #[test]
    fn test_u32_attribute_network_byte_order() {
        let mut buf = Vec::new();
        let mut msg = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 0);
        msg.put_u32(NFQA_CAP_LEN, 0xdeadbeef);
        let frame = msg.finish();

        let parsed = QueueMessage::parse(&frame[16..]).unwrap();
        assert_eq!(parsed.attr_u32(NFQA_CAP_LEN), Some(0xdeadbeef));
    }

    #[test]
    fn test_unknown_attribute_skipped() {
        let mut buf = Vec::new();
        let mut msg = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 0);
        msg.put_bytes(25, &[1, 2]); // known slot range, unused by us
        msg.put_bytes((NFQA_SLOTS + 4) as u16, &[3, 4]); // beyond the table
        msg.put_bytes(NFQA_PAYLOAD, &[5]);
        let frame = msg.finish();

        let parsed = QueueMessage::parse(&frame[16..]).unwrap();
        assert_eq!(parsed.attr(NFQA_PAYLOAD), Some(&[5][..]));
    }

    #[test]
    fn test_overlong_attribute_rejected() {
        let mut body = vec![0u8; NFGEN_HDRLEN];
        // Attribute claims 64 bytes with only 8 present
        body.extend_from_slice(&64u16.to_ne_bytes());
        body.extend_from_slice(&NFQA_PAYLOAD.to_ne_bytes());
        body.extend_from_slice(&[0; 4]);

        assert!(QueueMessage::parse(&body).is_err());
    }

    #[test]
    fn test_frame_iteration() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        let first = MessageBuilder::new(&mut a, NFQNL_MSG_PACKET, 1)
            .finish()
            .to_vec();
        let second = MessageBuilder::new(&mut b, NFQNL_MSG_PACKET, 2)
            .finish()
            .to_vec();

        let mut datagram = first;
        datagram.extend_from_slice(&second);

        let msgs: Vec<_> = frames(&datagram).collect::<Result<_>>().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(QueueMessage::parse(msgs[0].body).unwrap().queue_num, 1);
        assert_eq!(QueueMessage::parse(msgs[1].body).unwrap().queue_num, 2);
    }

    #[test]
    fn test_truncated_frame_rejected() {
        let mut buf = Vec::new();
        let frame = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 1).finish();
        let cut = &frame[..frame.len() - 4];
        assert!(frames(cut).any(|m| m.is_err()));
    }
}
