//! Lazy enumeration of every address in a range.
//!
//! Addresses are produced on demand so that a /8 costs no more memory than a
//! /30. [`feed`] moves the iterator onto a producer task and hands out a
//! bounded channel, which keeps the dispatch loop supplied without letting the
//! lookahead grow past its capacity.

use crate::types::AddressRange;
use std::iter::FusedIterator;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio::sync::mpsc;

/// Ascending iterator over all addresses admitted by a range's mask.
///
/// Boundary addresses (all-zeros and all-ones host parts) are included.
#[derive(Debug, Clone)]
pub struct AddressIter {
    current: [u8; 16],
    network: [u8; 16],
    mask: [u8; 16],
    width: usize,
    done: bool,
}

impl AddressIter {
    /// Start at `base & mask`.
    pub fn new(range: &AddressRange) -> Self {
        let (base, width) = octets(range.base());
        let (mask, _) = octets(range.mask());

        let mut network = [0u8; 16];
        for i in 0..width {
            network[i] = base[i] & mask[i];
        }

        Self {
            current: network,
            network,
            mask,
            width,
            done: false,
        }
    }

    /// Big-endian increment. Returns false when the value wrapped to zero.
    fn increment(&mut self) -> bool {
        for byte in self.current[..self.width].iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                return true;
            }
        }
        false
    }

    fn in_range(&self) -> bool {
        (0..self.width).all(|i| self.current[i] & self.mask[i] == self.network[i])
    }

    fn current_addr(&self) -> IpAddr {
        if self.width == 4 {
            let mut v4 = [0u8; 4];
            v4.copy_from_slice(&self.current[..4]);
            IpAddr::V4(Ipv4Addr::from(v4))
        } else {
            IpAddr::V6(Ipv6Addr::from(self.current))
        }
    }
}

impl Iterator for AddressIter {
    type Item = IpAddr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let addr = self.current_addr();
        if !self.increment() || !self.in_range() {
            self.done = true;
        }
        Some(addr)
    }
}

impl FusedIterator for AddressIter {}

fn octets(ip: IpAddr) -> ([u8; 16], usize) {
    let mut bytes = [0u8; 16];
    match ip {
        IpAddr::V4(v4) => {
            bytes[..4].copy_from_slice(&v4.octets());
            (bytes, 4)
        }
        IpAddr::V6(v6) => (v6.octets(), 16),
    }
}

/// Spawn a producer that pushes the range's addresses into a bounded channel.
///
/// The producer suspends whenever `capacity` addresses are waiting and stops
/// early if the receiver is dropped. Must be called inside a tokio runtime.
pub fn feed(range: &AddressRange, capacity: usize) -> mpsc::Receiver<IpAddr> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let addresses = AddressIter::new(range);

    tokio::spawn(async move {
        for addr in addresses {
            if tx.send(addr).await.is_err() {
                tracing::debug!("address feed closed early");
                break;
            }
        }
    });

    rx
}
