//! Outbound address discovery.
//!
//! Connecting a UDP socket sends nothing; it only makes the OS pick a route
//! and bind the socket to the interface address that route uses.

use std::cell::OnceCell;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Default routing probe: a well-known public resolver.
pub const DEFAULT_PROBE_ADDRESS: &str = "8.8.8.8:80";

/// Resolves the local IPv4 address used for outbound traffic.
pub trait AddressResolver {
    /// The local address the OS would use to reach the probe address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutboundAddress`] when no route or interface is
    /// available, or the selected address is not IPv4.
    fn outbound_ipv4(&self) -> Result<Ipv4Addr>;
}

/// Queries the OS routing table on every call through a transient UDP socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpProbe {
    probe: SocketAddr,
}

impl UdpProbe {
    /// Probe routes towards `probe`.
    #[must_use]
    pub const fn new(probe: SocketAddr) -> Self {
        Self { probe }
    }

    /// The remote address used for route selection.
    #[must_use]
    pub const fn probe(&self) -> SocketAddr {
        self.probe
    }

    fn error(&self, source: io::Error) -> Error {
        Error::OutboundAddress {
            probe: self.probe.to_string(),
            source,
        }
    }
}

impl Default for UdpProbe {
    fn default() -> Self {
        Self::new(SocketAddr::from(([8, 8, 8, 8], 80)))
    }
}

impl AddressResolver for UdpProbe {
    fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
            .map_err(|e| self.error(e))?;
        socket.connect(self.probe).map_err(|e| self.error(e))?;
        let local = socket.local_addr().map_err(|e| self.error(e))?;
        trace!(probe = %self.probe, local = %local, "Resolved outbound socket");

        match local.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
            IpAddr::V4(_) => Err(self.error(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no outbound interface selected",
            ))),
            IpAddr::V6(ip) => ip.to_ipv4_mapped().ok_or_else(|| {
                self.error(io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("outbound address {ip} is not IPv4"),
                ))
            }),
        }
    }
}

/// Resolves once through the wrapped resolver and reuses the answer.
///
/// Errors are not cached; a failed lookup is retried on the next call.
pub struct CachedResolver<R> {
    inner: R,
    cached: OnceCell<Ipv4Addr>,
}

impl<R: fmt::Debug> fmt::Debug for CachedResolver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedResolver")
            .field("inner", &self.inner)
            .field("cached", &self.cached.get())
            .finish()
    }
}

impl<R: AddressResolver> CachedResolver<R> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cached: OnceCell::new(),
        }
    }
}

impl<R: AddressResolver> AddressResolver for CachedResolver<R> {
    fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
        if let Some(ip) = self.cached.get() {
            return Ok(*ip);
        }
        let ip = self.inner.outbound_ipv4()?;
        debug!(%ip, "Caching outbound address for this run");
        Ok(*self.cached.get_or_init(|| ip))
    }
}

impl<R: AddressResolver + ?Sized> AddressResolver for &R {
    fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
        (**self).outbound_ipv4()
    }
}

impl<R: AddressResolver + ?Sized> AddressResolver for Box<R> {
    fn outbound_ipv4(&self) -> Result<Ipv4Addr> {
        (**self).outbound_ipv4()
    }
}
