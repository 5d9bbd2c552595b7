//! Main Crate Error

/// Alias for a Result with the crate [Error].
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
/// Kadroute crate error enum.
pub enum Error {
    /// Indicates that id bytes were not exactly [ID_SIZE](crate::ID_SIZE) long.
    #[error("Invalid Id size, expected 20 bytes, received {0}")]
    InvalidIdSize(usize),

    /// Indicates that an id string was not valid hex of the right length.
    #[error("Invalid Id encoding: {0}")]
    InvalidIdEncoding(String),

    /// Returned from [find_one](crate::Dht::find_one) when no bucket holds
    /// the requested id.
    #[error("No node with the requested id in any bucket")]
    NodeNotFound,

    /// A reply channel was closed, or timed out, before a result arrived.
    ///
    /// Treat as "try again or peer unreachable", never as fatal.
    #[error("Request failed")]
    RequestFailed,

    /// The transport did not produce a reply for an outbound ping.
    #[error("Ping failed")]
    PingFailed,

    /// The transport did not produce a reply for an outbound find.
    #[error("Find failed")]
    FindFailed,
}
