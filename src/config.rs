//! Command line configuration
//!
//! `chat_server <port>` with optional limit overrides. Defaults match the
//! protocol limits clients expect.

use std::net::IpAddr;

use clap::{Args, Parser};

use crate::codec::DEFAULT_MAX_LINE_LENGTH;
use crate::registry::DEFAULT_MAX_CLIENTS;
use crate::types::MAX_NAME_LENGTH;

/// Default byte budget for a `/list` response
pub const DEFAULT_LIST_CAPACITY: usize = 1024;

/// Server command line
#[derive(Debug, Clone, Parser)]
#[command(name = "chat_server", version, about = "Multi-client line-based chat server")]
pub struct ServerConfig {
    /// TCP port to listen on (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    #[command(flatten)]
    pub limits: Limits,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind, self.port)
    }
}

/// Per-server resource limits
#[derive(Debug, Clone, Args)]
pub struct Limits {
    /// Maximum number of registered clients
    #[arg(long, default_value_t = DEFAULT_MAX_CLIENTS)]
    pub max_clients: usize,

    /// Longest accepted line in bytes; longer lines are discarded
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Display names are truncated to this many bytes
    #[arg(long, default_value_t = MAX_NAME_LENGTH)]
    pub max_name_length: usize,

    /// Byte budget for a `/list` response
    #[arg(long, default_value_t = DEFAULT_LIST_CAPACITY)]
    pub list_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_name_length: MAX_NAME_LENGTH,
            list_capacity: DEFAULT_LIST_CAPACITY,
        }
    }
}
