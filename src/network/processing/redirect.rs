//! IPv4 inspection and destination rewrite.
//!
//! `Ipv4Header` is a validated mutable view over the fixed part of an IPv4
//! header; construction rejects buffers shorter than 20 bytes or with a
//! version field other than 4. `RedirectPolicy` applies the single rule
//! this tool exists for: traffic not originating from the local address
//! gets its destination rewritten, in place, to the configured target.
//!
//! Checksums are deliberately left untouched. The kernel or hardware
//! corrects them after the verdict when offload is active, matching the
//! checksum-not-ready skb flag semantics.

use crate::error::{RedirqError, Result};
use crate::settings::RedirectOptions;
use log::info;
use std::net::Ipv4Addr;

const SRC_OFFSET: usize = 12;
const DST_OFFSET: usize = 16;

/// Validated mutable view over an IPv4 header. Options are not parsed;
/// only the fixed 20 bytes are touched.
pub struct Ipv4Header<'a> {
    data: &'a mut [u8],
}

impl<'a> Ipv4Header<'a> {
    pub const MIN_LEN: usize = 20;

    /// Creates the view, rejecting short buffers and non-IPv4 versions.
    pub fn new(data: &'a mut [u8]) -> Result<Self> {
        if data.len() < Self::MIN_LEN {
            return Err(RedirqError::parse(format!(
                "payload too short for an IPv4 header: {} bytes",
                data.len()
            )));
        }
        let version = data[0] >> 4;
        if version != 4 {
            return Err(RedirqError::parse(format!(
                "not an IPv4 packet: version {}",
                version
            )));
        }
        Ok(Ipv4Header { data })
    }

    /// Source address, decoded big endian from bytes 12..16.
    pub fn source(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from_be_bytes([
            self.data[SRC_OFFSET],
            self.data[SRC_OFFSET + 1],
            self.data[SRC_OFFSET + 2],
            self.data[SRC_OFFSET + 3],
        ]))
    }

    /// Destination address, decoded big endian from bytes 16..20.
    pub fn destination(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from_be_bytes([
            self.data[DST_OFFSET],
            self.data[DST_OFFSET + 1],
            self.data[DST_OFFSET + 2],
            self.data[DST_OFFSET + 3],
        ]))
    }

    /// Overwrites the destination field in network byte order. All other
    /// header fields, checksums included, stay as they are.
    pub fn set_destination(&mut self, addr: Ipv4Addr) {
        self.data[DST_OFFSET..DST_OFFSET + 4].copy_from_slice(&addr.octets());
    }
}

/// The redirect rule, built once from configuration.
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    local_addr: Ipv4Addr,
    redirect_to: Ipv4Addr,
}

impl RedirectPolicy {
    pub fn new(options: &RedirectOptions) -> Self {
        RedirectPolicy {
            local_addr: options.local_addr,
            redirect_to: options.redirect_to,
        }
    }

    /// Inspects the payload and rewrites the destination when the source
    /// is not the local address. Payload length is always preserved.
    ///
    /// Returns whether a rewrite happened. Fails when the payload is not
    /// an inspectable IPv4 packet.
    pub fn apply(&self, payload: &mut [u8]) -> Result<bool> {
        let mut header = Ipv4Header::new(payload)?;

        let source = header.source();
        if source == self.local_addr {
            return Ok(false);
        }

        info!(
            "redirecting {} -> {} (destination was {})",
            source,
            self.redirect_to,
            header.destination()
        );
        header.set_destination(self.redirect_to);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_packet(source: [u8; 4], destination: [u8; 4]) -> Vec<u8> {
        let mut packet = vec![0u8; 20];
        packet[0] = 0x45; // version 4, IHL 5
        packet[12..16].copy_from_slice(&source);
        packet[16..20].copy_from_slice(&destination);
        packet
    }

    fn policy(local: [u8; 4], target: [u8; 4]) -> RedirectPolicy {
        RedirectPolicy::new(&RedirectOptions {
            local_addr: Ipv4Addr::from(local),
            redirect_to: Ipv4Addr::from(target),
            mark: 42,
        })
    }

    #[test]
    fn test_address_extraction() {
        let mut packet = ipv4_packet([192, 168, 1, 10], [10, 0, 0, 1]);
        let header = Ipv4Header::new(&mut packet).unwrap();
        assert_eq!(u32::from(header.source()), 3232235786);
        assert_eq!(header.destination(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut short = vec![0x45u8; 19];
        assert!(Ipv4Header::new(&mut short).is_err());
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut packet = ipv4_packet([1, 1, 1, 1], [2, 2, 2, 2]);
        packet[0] = 0x60; // IPv6
        assert!(Ipv4Header::new(&mut packet).is_err());
    }

    #[test]
    fn test_non_local_source_rewritten() {
        let policy = policy([192, 168, 199, 189], [10, 9, 8, 7]);
        let mut packet = ipv4_packet([8, 8, 8, 8], [172, 16, 0, 1]);

        assert!(policy.apply(&mut packet).unwrap());
        assert_eq!(&packet[16..20], &[10, 9, 8, 7]);
        // Source and everything else untouched
        assert_eq!(&packet[12..16], &[8, 8, 8, 8]);
        assert_eq!(packet.len(), 20);
    }

    #[test]
    fn test_local_source_left_alone() {
        let policy = policy([192, 168, 199, 189], [10, 9, 8, 7]);
        let mut packet = ipv4_packet([192, 168, 199, 189], [172, 16, 0, 1]);

        assert!(!policy.apply(&mut packet).unwrap());
        assert_eq!(&packet[16..20], &[172, 16, 0, 1]);
    }

    #[test]
    fn test_rewrite_is_a_fixed_point() {
        // A second application with the same target changes nothing.
        let policy = policy([192, 168, 199, 189], [10, 9, 8, 7]);
        let mut packet = ipv4_packet([8, 8, 8, 8], [172, 16, 0, 1]);

        policy.apply(&mut packet).unwrap();
        let after_first = packet.clone();
        policy.apply(&mut packet).unwrap();
        assert_eq!(packet, after_first);
    }
}
