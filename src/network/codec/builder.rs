//! Outbound message construction.
//!
//! `MessageBuilder` assembles one nfnetlink_queue message in a caller-supplied
//! buffer: fixed header, extra header, then attributes appended with 4-byte
//! alignment padding. Nested attribute groups are bracketed with
//! [`MessageBuilder::begin_nest`] / [`MessageBuilder::end_nest`], which
//! back-patch the enclosing attribute's length once the contents are known.

use super::{
    nla_align, NFGEN_HDRLEN, NFNETLINK_V0, NFNL_SUBSYS_QUEUE, NLA_F_NESTED, NLA_HDRLEN,
    NLMSG_HDRLEN, NLM_F_REQUEST,
};

/// An in-progress outbound message. Built, sent, then discarded.
pub struct MessageBuilder<'a> {
    buf: &'a mut Vec<u8>,
}

/// Marker for an open nested attribute group. Must be closed with
/// [`MessageBuilder::end_nest`] before the message is finished.
#[must_use]
pub struct Nest {
    header_offset: usize,
}

impl<'a> MessageBuilder<'a> {
    /// Starts a message of the given nfnetlink_queue kind targeting `queue_num`.
    ///
    /// Writes the netlink header (queue-subsystem-tagged type, request flag,
    /// sequence and port left to the transport) followed by the nfnetlink
    /// extra header (unspecified family, protocol version 0, queue number in
    /// network byte order). Any previous content of `buf` is discarded.
    pub fn new(buf: &'a mut Vec<u8>, msg_type: u16, queue_num: u16) -> Self {
        buf.clear();
        buf.resize(NLMSG_HDRLEN, 0);

        let full_type = (NFNL_SUBSYS_QUEUE << 8) | msg_type;
        buf[4..6].copy_from_slice(&full_type.to_ne_bytes());
        buf[6..8].copy_from_slice(&NLM_F_REQUEST.to_ne_bytes());

        buf.push(0); // nfgen_family: AF_UNSPEC
        buf.push(NFNETLINK_V0);
        buf.extend_from_slice(&queue_num.to_be_bytes());
        debug_assert_eq!(buf.len(), NLMSG_HDRLEN + NFGEN_HDRLEN);

        MessageBuilder { buf }
    }

    /// Appends an attribute with a raw byte value, padded to alignment.
    pub fn put_bytes(&mut self, attr_type: u16, value: &[u8]) {
        let nla_len = NLA_HDRLEN + value.len();
        self.buf.extend_from_slice(&(nla_len as u16).to_ne_bytes());
        self.buf.extend_from_slice(&attr_type.to_ne_bytes());
        self.buf.extend_from_slice(value);
        self.pad();
    }

    /// Appends a 32-bit attribute in network byte order.
    pub fn put_u32(&mut self, attr_type: u16, value: u32) {
        self.put_bytes(attr_type, &value.to_be_bytes());
    }

    /// Opens a nested attribute group. The group's length is unknown until
    /// [`MessageBuilder::end_nest`] writes it back.
    pub fn begin_nest(&mut self, attr_type: u16) -> Nest {
        let header_offset = self.buf.len();
        self.buf.extend_from_slice(&0u16.to_ne_bytes());
        self.buf
            .extend_from_slice(&(attr_type | NLA_F_NESTED).to_ne_bytes());
        Nest { header_offset }
    }

    /// Closes a nested group, patching the enclosing attribute's length.
    /// Nested contents are already aligned, so no trailing pad is needed.
    pub fn end_nest(&mut self, nest: Nest) {
        let nla_len = self.buf.len() - nest.header_offset;
        self.buf[nest.header_offset..nest.header_offset + 2]
            .copy_from_slice(&(nla_len as u16).to_ne_bytes());
    }

    /// Finalizes the message: writes the total length into the netlink
    /// header and returns the complete frame.
    pub fn finish(self) -> &'a [u8] {
        let total = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&total.to_ne_bytes());
        self.buf
    }

    fn pad(&mut self) {
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }
}
