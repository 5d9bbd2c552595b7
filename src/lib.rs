#![doc = include_str!("../README.md")]

mod actor;
mod common;
mod config;
mod dht;
mod error;
mod gateway;

pub use crate::common::{
    AddOutcome, Distance, Id, KBucket, Node, RoutingTable, Storage, DEFAULT_BUCKET_SIZE_K,
    ID_SIZE, MAX_DISTANCE,
};
pub use crate::config::{
    Config, DEFAULT_ALPHA, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TICK_INTERVAL,
};
pub use crate::dht::{Dht, Info};
pub use crate::error::{Error, Result};
pub use crate::gateway::Mail;

pub use flume::{Receiver, Sender};
