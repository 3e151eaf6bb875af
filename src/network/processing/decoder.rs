//! Packet-delivery message decoding.
//!
//! Turns a parsed [`QueueMessage`] into a [`PacketContext`]: the packet
//! id and hook from the packet-header attribute, the raw IPv4 payload,
//! and the auxiliary skb flags. The packet-header attribute is required;
//! the payload attribute should be present under full-packet copy mode
//! but an absent one is decoded as an empty payload.

use crate::error::{RedirqError, Result};
use crate::network::codec::{
    QueueMessage, NFQA_CAP_LEN, NFQA_PACKET_HDR, NFQA_PAYLOAD, NFQA_SKB_CSUMNOTREADY,
    NFQA_SKB_GSO, NFQA_SKB_INFO,
};
use log::debug;

/// Packet-header attribute size: id (4), hardware protocol (2), hook (1).
const PACKET_HDR_LEN: usize = 7;

/// One queued packet, decoded from a single delivery message and consumed
/// within the same dispatch cycle.
#[derive(Debug)]
pub struct PacketContext {
    /// Queue number echoed by the kernel; the verdict answers on it.
    pub queue_num: u16,
    /// Identifier correlating the verdict with this in-flight packet.
    pub id: u32,
    /// Kernel hook point that enqueued the packet.
    pub hook: u8,
    /// Link layer protocol number, e.g. the EtherType.
    pub hw_protocol: u16,
    /// Raw IPv4 packet bytes, mutated in place by the rewrite logic.
    pub payload: Vec<u8>,
    /// Set when the capture length differs from the delivered payload.
    pub truncated: bool,
    /// The payload may be a larger, not-yet-segmented packet.
    pub gso: bool,
    /// Checksums are not yet valid, e.g. due to GRO/GSO offload.
    pub checksum_not_ready: bool,
    /// Pre-truncation length, when the kernel reported one.
    pub original_len: Option<u32>,
}

/// Decodes one packet-delivery message.
///
/// Fails when the packet-header attribute is missing or too short; the
/// dispatch loop then drops the message without issuing a verdict.
pub fn decode_packet(msg: &QueueMessage<'_>) -> Result<PacketContext> {
    let hdr = msg
        .attr(NFQA_PACKET_HDR)
        .ok_or_else(|| RedirqError::parse("metaheader not set"))?;
    if hdr.len() < PACKET_HDR_LEN {
        return Err(RedirqError::parse(format!(
            "packet header attribute too short: {} bytes",
            hdr.len()
        )));
    }

    let id = u32::from_be_bytes([hdr[0], hdr[1], hdr[2], hdr[3]]);
    let hw_protocol = u16::from_be_bytes([hdr[4], hdr[5]]);
    let hook = hdr[6];

    let payload = match msg.attr(NFQA_PAYLOAD) {
        Some(bytes) => bytes.to_vec(),
        None => {
            debug!("packet {} delivered without payload attribute", id);
            Vec::new()
        }
    };

    let skbinfo = msg.attr_u32(NFQA_SKB_INFO).unwrap_or(0);
    let original_len = msg.attr_u32(NFQA_CAP_LEN);
    let truncated = original_len.map_or(false, |len| len as usize != payload.len());

    Ok(PacketContext {
        queue_num: msg.queue_num,
        id,
        hook,
        hw_protocol,
        payload,
        truncated,
        gso: skbinfo & NFQA_SKB_GSO != 0,
        checksum_not_ready: skbinfo & NFQA_SKB_CSUMNOTREADY != 0,
        original_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::codec::{MessageBuilder, NFQNL_MSG_PACKET};

    fn packet_header(id: u32, hw_protocol: u16, hook: u8) -> [u8; 7] {
        let mut hdr = [0u8; 7];
        hdr[0..4].copy_from_slice(&id.to_be_bytes());
        hdr[4..6].copy_from_slice(&hw_protocol.to_be_bytes());
        hdr[6] = hook;
        hdr
    }

    fn delivery(
        buf: &mut Vec<u8>,
        id: u32,
        payload: &[u8],
        cap_len: Option<u32>,
        skbinfo: Option<u32>,
    ) -> Vec<u8> {
        let mut msg = MessageBuilder::new(buf, NFQNL_MSG_PACKET, 5);
        msg.put_bytes(NFQA_PACKET_HDR, &packet_header(id, 0x0800, 2));
        msg.put_bytes(NFQA_PAYLOAD, payload);
        if let Some(len) = cap_len {
            msg.put_u32(NFQA_CAP_LEN, len);
        }
        if let Some(flags) = skbinfo {
            msg.put_u32(NFQA_SKB_INFO, flags);
        }
        msg.finish().to_vec()
    }

    #[test]
    fn test_decode_basic_fields() {
        let mut buf = Vec::new();
        let frame = delivery(&mut buf, 77, &[1, 2, 3, 4], None, None);
        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        let ctx = decode_packet(&msg).unwrap();

        assert_eq!(ctx.queue_num, 5);
        assert_eq!(ctx.id, 77);
        assert_eq!(ctx.hook, 2);
        assert_eq!(ctx.hw_protocol, 0x0800);
        assert_eq!(ctx.payload, vec![1, 2, 3, 4]);
        assert!(!ctx.truncated);
        assert!(!ctx.gso);
        assert!(!ctx.checksum_not_ready);
        assert_eq!(ctx.original_len, None);
    }

    #[test]
    fn test_missing_packet_header_is_parse_error() {
        let mut buf = Vec::new();
        let mut msg = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 5);
        msg.put_bytes(NFQA_PAYLOAD, &[1, 2, 3]);
        let frame = msg.finish().to_vec();

        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        let err = decode_packet(&msg).unwrap_err();
        assert!(err.to_string().contains("metaheader not set"));
    }

    #[test]
    fn test_truncation_flagged_without_altering_payload() {
        let payload = [9u8; 32];
        let mut buf = Vec::new();
        // Kernel reports 1500 original bytes while delivering 32
        let frame = delivery(&mut buf, 1, &payload, Some(1500), None);
        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        let ctx = decode_packet(&msg).unwrap();

        assert!(ctx.truncated);
        assert_eq!(ctx.original_len, Some(1500));
        assert_eq!(ctx.payload, payload);
    }

    #[test]
    fn test_matching_cap_len_is_not_truncated() {
        let payload = [3u8; 20];
        let mut buf = Vec::new();
        let frame = delivery(&mut buf, 1, &payload, Some(20), None);
        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        assert!(!decode_packet(&msg).unwrap().truncated);
    }

    #[test]
    fn test_skb_info_flags() {
        let mut buf = Vec::new();
        let frame = delivery(
            &mut buf,
            1,
            &[0; 20],
            None,
            Some(NFQA_SKB_GSO | NFQA_SKB_CSUMNOTREADY),
        );
        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        let ctx = decode_packet(&msg).unwrap();
        assert!(ctx.gso);
        assert!(ctx.checksum_not_ready);
    }

    #[test]
    fn test_absent_payload_decodes_empty() {
        let mut buf = Vec::new();
        let mut msg = MessageBuilder::new(&mut buf, NFQNL_MSG_PACKET, 5);
        msg.put_bytes(NFQA_PACKET_HDR, &packet_header(8, 0x0800, 0));
        let frame = msg.finish().to_vec();

        let msg = QueueMessage::parse(&frame[16..]).unwrap();
        let ctx = decode_packet(&msg).unwrap();
        assert_eq!(ctx.id, 8);
        assert!(ctx.payload.is_empty());
    }
}
