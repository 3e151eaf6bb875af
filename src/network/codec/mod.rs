//! Nfnetlink message codec.
//!
//! This module builds and parses the binary messages exchanged with the
//! kernel's nfnetlink_queue subsystem: a 16-byte netlink header, a 4-byte
//! nfnetlink extra header carrying the queue number, then a stream of
//! 4-byte-aligned type-tagged attributes. Attribute headers are native
//! endian; multi-byte attribute values are network byte order.

pub mod builder;
pub mod parser;

// Re-export commonly used types
pub use builder::MessageBuilder;
pub use parser::{frames, NetlinkMessage, QueueMessage};

/// Size of the fixed netlink message header.
pub const NLMSG_HDRLEN: usize = 16;
/// Size of the nfnetlink extra header (family, version, queue number).
pub const NFGEN_HDRLEN: usize = 4;
/// Size of an attribute header (length + type).
pub const NLA_HDRLEN: usize = 4;
/// Attributes and messages are padded to this alignment.
pub const NLA_ALIGNTO: usize = 4;

pub const NLM_F_REQUEST: u16 = 0x0001;

// Netlink control message types. Anything below NLMSG_MIN_TYPE is reserved.
pub const NLMSG_ERROR: u16 = 0x2;
pub const NLMSG_DONE: u16 = 0x3;
pub const NLMSG_MIN_TYPE: u16 = 0x10;

/// Flag bit marking an attribute whose value is itself an attribute stream.
pub const NLA_F_NESTED: u16 = 1 << 15;
/// Mask clearing the nested and byte-order flag bits from an attribute type.
pub const NLA_TYPE_MASK: u16 = 0x3fff;

/// Nfnetlink subsystem id for the packet queue, carried in the upper byte
/// of the netlink message type.
pub const NFNL_SUBSYS_QUEUE: u16 = 3;
pub const NFNETLINK_V0: u8 = 0;

// nfnetlink_queue message kinds (lower byte of the message type)
pub const NFQNL_MSG_PACKET: u16 = 0;
pub const NFQNL_MSG_VERDICT: u16 = 1;
pub const NFQNL_MSG_CONFIG: u16 = 2;

// Attributes of packet-delivery and verdict messages
pub const NFQA_PACKET_HDR: u16 = 1;
pub const NFQA_VERDICT_HDR: u16 = 2;
pub const NFQA_PAYLOAD: u16 = 10;
pub const NFQA_CT: u16 = 11;
pub const NFQA_CAP_LEN: u16 = 13;
pub const NFQA_SKB_INFO: u16 = 14;

/// Number of attribute slots tracked by the parser. Types at or above this
/// are tolerated and skipped.
pub const NFQA_SLOTS: usize = 32;

// Attributes of configuration messages
pub const NFQA_CFG_CMD: u16 = 1;
pub const NFQA_CFG_PARAMS: u16 = 2;
pub const NFQA_CFG_FLAGS: u16 = 4;
pub const NFQA_CFG_MASK: u16 = 5;

pub const NFQNL_CFG_CMD_BIND: u8 = 1;

/// Request delivery of GSO packets without kernel-side segmentation.
pub const NFQA_CFG_F_GSO: u32 = 1 << 2;

// skb-info flag bits, delivered in network byte order
pub const NFQA_SKB_CSUMNOTREADY: u32 = 1 << 0;
pub const NFQA_SKB_GSO: u32 = 1 << 1;

/// Verdict dispositions understood by the kernel. Only accept is issued by
/// this tool; drop is structurally available.
pub const NF_DROP: u32 = 0;
pub const NF_ACCEPT: u32 = 1;

/// Conntrack mark attribute inside a nested `NFQA_CT` group.
pub const CTA_MARK: u16 = 8;

/// One minimum netlink buffer unit, matching the kernel's page-sized
/// socket buffer convention.
pub const SOCKET_BUFFER_SIZE: usize = 8192;

/// Receive buffer size: the largest possible packet payload plus netlink
/// overhead.
pub const RECV_BUFFER_SIZE: usize = 0xffff + SOCKET_BUFFER_SIZE / 2;

/// Rounds `len` up to the attribute alignment boundary.
pub const fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}
