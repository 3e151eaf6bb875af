//! Queue binding, configuration, and verdicts.
//!
//! `Queue` couples the netlink [`Channel`] with one nfnetlink_queue number.
//! Configuration is fire-and-forget: the bind and parameter messages are
//! sent once at startup with no acknowledgment awaited; misconfiguration
//! shows up as absent packet flow. One verdict is sent per delivered
//! packet, never batched or retried.

use crate::error::Result;
use crate::network::codec::{
    MessageBuilder, CTA_MARK, NFQA_CFG_CMD, NFQA_CFG_FLAGS, NFQA_CFG_F_GSO, NFQA_CFG_MASK,
    NFQA_CFG_PARAMS, NFQA_CT, NFQA_PAYLOAD, NFQA_VERDICT_HDR, NFQNL_CFG_CMD_BIND,
    NFQNL_MSG_CONFIG, NFQNL_MSG_VERDICT, NF_ACCEPT,
};
use crate::network::core::channel::Channel;
use crate::network::processing::decoder::PacketContext;
use crate::settings::QueueOptions;
use log::info;

/// A configured queue binding. Owns the channel for its whole lifetime.
pub struct Queue {
    channel: Channel,
    queue_num: u16,
    mark: u32,
    out: Vec<u8>,
}

impl Queue {
    /// Wraps a bound channel for the given queue number. `mark` is the
    /// conntrack mark attached to every verdict.
    pub fn new(channel: Channel, queue_num: u16, mark: u32) -> Self {
        Queue {
            channel,
            queue_num,
            mark,
            out: Vec::new(),
        }
    }

    /// Performs the startup configuration sequence: bind the queue for
    /// IPv4, select the copy mode and capture range, request the GSO
    /// capability, and silence ENOBUFS. Any send failure here is fatal.
    pub fn configure(&mut self, options: &QueueOptions) -> Result<()> {
        let frame = encode_bind(&mut self.out, self.queue_num);
        self.channel.send(frame)?;

        let frame = encode_params(
            &mut self.out,
            self.queue_num,
            options.copy_mode.code(),
            options.range,
            !options.no_gso,
        );
        self.channel.send(frame)?;

        self.channel.set_no_enobufs(true)?;

        info!(
            "queue {} configured: copy mode {:?}, range {}, gso {}",
            self.queue_num,
            options.copy_mode,
            options.range,
            !options.no_gso
        );
        Ok(())
    }

    /// Blocks for the next datagram from the kernel.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        self.channel.recv(buf)
    }

    /// Port id of the underlying channel.
    pub fn port_id(&self) -> u32 {
        self.channel.port_id()
    }

    /// Accepts the packet: sends its id, the conntrack mark, and the
    /// (possibly rewritten) payload back to the kernel.
    pub fn verdict(&mut self, ctx: &PacketContext) -> Result<()> {
        let frame = encode_verdict(
            &mut self.out,
            ctx.queue_num,
            ctx.id,
            self.mark,
            &ctx.payload,
        );
        self.channel.send(frame)
    }
}

/// Builds the bind command message, declaring the IPv4 address family.
pub fn encode_bind(buf: &mut Vec<u8>, queue_num: u16) -> &[u8] {
    let mut msg = MessageBuilder::new(buf, NFQNL_MSG_CONFIG, queue_num);
    // Command struct: command, pad, protocol family in network byte order
    let pf = (libc::AF_INET as u16).to_be_bytes();
    msg.put_bytes(NFQA_CFG_CMD, &[NFQNL_CFG_CMD_BIND, 0, pf[0], pf[1]]);
    msg.finish()
}

/// Builds the parameter message: copy mode, capture range, and the GSO
/// flag/mask pair.
pub fn encode_params(
    buf: &mut Vec<u8>,
    queue_num: u16,
    copy_mode: u8,
    range: u32,
    gso: bool,
) -> &[u8] {
    let mut msg = MessageBuilder::new(buf, NFQNL_MSG_CONFIG, queue_num);
    // Params struct: copy range in network byte order, then the mode byte
    let mut params = [0u8; 5];
    params[0..4].copy_from_slice(&range.to_be_bytes());
    params[4] = copy_mode;
    msg.put_bytes(NFQA_CFG_PARAMS, &params);
    msg.put_u32(NFQA_CFG_FLAGS, if gso { NFQA_CFG_F_GSO } else { 0 });
    msg.put_u32(NFQA_CFG_MASK, NFQA_CFG_F_GSO);
    msg.finish()
}

/// Builds a verdict message: accept disposition and packet id, a nested
/// conntrack group carrying the mark, then the full payload.
pub fn encode_verdict<'a>(
    buf: &'a mut Vec<u8>,
    queue_num: u16,
    id: u32,
    mark: u32,
    payload: &[u8],
) -> &'a [u8] {
    let mut msg = MessageBuilder::new(buf, NFQNL_MSG_VERDICT, queue_num);

    let mut vh = [0u8; 8];
    vh[0..4].copy_from_slice(&NF_ACCEPT.to_be_bytes());
    vh[4..8].copy_from_slice(&id.to_be_bytes());
    msg.put_bytes(NFQA_VERDICT_HDR, &vh);

    let nest = msg.begin_nest(NFQA_CT);
    msg.put_u32(CTA_MARK, mark);
    msg.end_nest(nest);

    msg.put_bytes(NFQA_PAYLOAD, payload);
    msg.finish()
}
