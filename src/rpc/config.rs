use std::time::Duration;

use super::socket::DEFAULT_REQUEST_TIMEOUT;

/// Default interval of both stabilization loops.
pub const DEFAULT_STABILIZE_INTERVAL: Duration = Duration::from_millis(100);
/// Default interval between two finger refreshes.
pub const DEFAULT_FIX_FINGERS_INTERVAL: Duration = Duration::from_millis(100);
/// Default interval of the seed watchdog.
pub const DEFAULT_REJOIN_INTERVAL: Duration = Duration::from_millis(3000);
/// Default interval of successor replication.
pub const DEFAULT_REPLICATION_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
/// Chord node configurations
pub struct Config {
    /// Host this node listens on and advertises to its peers.
    ///
    /// Defaults to `127.0.0.1`
    pub host: String,
    /// Explicit port to listen on.
    ///
    /// Defaults to None, where the OS picks a free port.
    pub port: Option<u16>,
    /// Width `m` of the identifier space, also the number of fingers.
    ///
    /// Defaults to `64`
    pub id_bits: u8,
    /// UDP socket request timeout duration.
    ///
    /// A hung peer can stall a maintenance tick at most this long.
    ///
    /// Defaults to [DEFAULT_REQUEST_TIMEOUT]
    pub request_timeout: Duration,
    /// Defaults to [DEFAULT_STABILIZE_INTERVAL]
    pub stabilize_interval: Duration,
    /// Defaults to [DEFAULT_FIX_FINGERS_INTERVAL]
    pub fix_fingers_interval: Duration,
    /// Defaults to [DEFAULT_REJOIN_INTERVAL]
    pub rejoin_interval: Duration,
    /// Defaults to [DEFAULT_REPLICATION_INTERVAL]
    pub replication_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: None,
            id_bits: 64,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stabilize_interval: DEFAULT_STABILIZE_INTERVAL,
            fix_fingers_interval: DEFAULT_FIX_FINGERS_INTERVAL,
            rejoin_interval: DEFAULT_REJOIN_INTERVAL,
            replication_interval: DEFAULT_REPLICATION_INTERVAL,
        }
    }
}
