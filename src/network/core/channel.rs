//! Netlink channel ownership.
//!
//! This module owns the `AF_NETLINK` / `NETLINK_NETFILTER` datagram socket
//! used to talk to the kernel's packet queue subsystem: creation, binding
//! to a kernel-assigned port id, raw frame send/receive, and socket
//! options. The channel is an explicitly owned value passed into the
//! dispatch loop; there is no process-wide handle.

use crate::error::{RedirqError, Result};
use log::debug;
use std::mem;

/// A bound, connectionless netlink endpoint. Opened once at startup and
/// closed when dropped.
#[derive(Debug)]
pub struct Channel {
    fd: libc::c_int,
    port_id: u32,
}

impl Channel {
    /// Opens a netfilter netlink socket.
    ///
    /// Fails with a channel error when the socket cannot be created, e.g.
    /// for lack of `CAP_NET_ADMIN`.
    pub fn open() -> Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_NETLINK, libc::SOCK_RAW, libc::NETLINK_NETFILTER) };
        if fd < 0 {
            return Err(RedirqError::channel("open"));
        }
        Ok(Channel { fd, port_id: 0 })
    }

    /// Binds the socket, letting the kernel assign the local port id.
    ///
    /// Returns the assigned id; inbound messages addressed to other ports
    /// are not for this process.
    pub fn bind(&mut self) -> Result<u32> {
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;

        let rc = unsafe {
            libc::bind(
                self.fd,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(RedirqError::channel("bind"));
        }

        // Read back the kernel-assigned port id.
        let mut len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
        let rc = unsafe {
            libc::getsockname(
                self.fd,
                &mut addr as *mut libc::sockaddr_nl as *mut libc::sockaddr,
                &mut len,
            )
        };
        if rc < 0 {
            return Err(RedirqError::channel("getsockname"));
        }

        self.port_id = addr.nl_pid;
        debug!("netlink socket bound, port id {}", self.port_id);
        Ok(self.port_id)
    }

    /// The port id assigned at bind time.
    pub fn port_id(&self) -> u32 {
        self.port_id
    }

    /// Transmits one complete message to the kernel.
    pub fn send(&self, frame: &[u8]) -> Result<()> {
        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;

        let rc = unsafe {
            libc::sendto(
                self.fd,
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(RedirqError::channel("send"));
        }
        Ok(())
    }

    /// Blocks until one datagram arrives, returning the received byte count.
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let rc = unsafe { libc::recv(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
        if rc < 0 {
            return Err(RedirqError::channel("receive"));
        }
        Ok(rc as usize)
    }

    /// Suppresses ENOBUFS delivery. Kernel-side packet loss is then silent
    /// instead of surfacing as a receive error.
    pub fn set_no_enobufs(&self, enabled: bool) -> Result<()> {
        let value: libc::c_int = enabled as libc::c_int;
        let rc = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_NETLINK,
                libc::NETLINK_NO_ENOBUFS,
                &value as *const libc::c_int as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(RedirqError::channel("setsockopt"));
        }
        Ok(())
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}
