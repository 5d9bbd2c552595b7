//! Configuration for a [Dht](crate::Dht) node.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::common::{Id, DEFAULT_BUCKET_SIZE_K};

/// Default lookup fan-out; how many closest nodes a lookup returns.
pub const DEFAULT_ALPHA: usize = 3;
/// Default interval between two maintenance ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);
/// Default duration a caller blocked on a reply channel waits before the
/// request is reported failed.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
/// Dht node configurations
pub struct Config {
    /// Known node addresses used to join the network.
    ///
    /// Stored verbatim; resolving and contacting them is the transport's job.
    ///
    /// Defaults to none.
    pub seeds: Vec<String>,
    /// Local ip address this node advertises.
    ///
    /// Defaults to the loopback address.
    pub local_ip: IpAddr,
    /// Local port this node advertises.
    ///
    /// Defaults to 0.
    pub port: u16,
    /// This node's [Id].
    ///
    /// Defaults to a random id.
    pub id: Id,
    /// K, the maximum number of nodes a single bucket tracks.
    ///
    /// Defaults to [DEFAULT_BUCKET_SIZE_K]
    pub bucket_size: usize,
    /// How many closest nodes lookups return.
    ///
    /// Defaults to [DEFAULT_ALPHA]
    pub alpha: usize,
    /// Interval between two maintenance ticks.
    ///
    /// Defaults to [DEFAULT_TICK_INTERVAL]
    pub tick_interval: Duration,
    /// How long synchronous calls and outbound mail wait for their reply.
    ///
    /// The longer this duration is, the longer callers block on unresponsive
    /// peers. The shorter it is, the more replies from busy nodes are missed
    /// and reported as failures.
    ///
    /// Defaults to [DEFAULT_REQUEST_TIMEOUT]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            local_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            id: Id::random(),
            bucket_size: DEFAULT_BUCKET_SIZE_K,
            alpha: DEFAULT_ALPHA,
            tick_interval: DEFAULT_TICK_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
