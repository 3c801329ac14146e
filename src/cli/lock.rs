//! Single-instance guard for the interactive session.

use anyhow::{Context, Result};
use std::net::{Ipv4Addr, TcpListener};

/// Holds a loopback port for as long as it lives.
pub struct InstanceLock {
    _listener: TcpListener,
    port: u16,
}

impl InstanceLock {
    pub fn acquire(port: u16) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).with_context(|| {
            format!("Another quota-analyzer instance appears to be running (port {port} is taken)")
        })?;
        let port = listener.local_addr().map(|addr| addr.port()).unwrap_or(port);
        tracing::debug!("Acquired instance lock on port {}", port);
        Ok(Self { _listener: listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        tracing::debug!("Released instance lock on port {}", self.port);
    }
}
