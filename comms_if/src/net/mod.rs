//! # Network Module
//!
//! This module provides the datagram transport used to publish the trajectory. Every payload is
//! prefixed with a [`FrameHeader`](crate::traj::FrameHeader) carrying a per-socket frame counter.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use log::debug;
use serde::{Serialize, Deserialize};

use crate::traj::{self, FrameHeader, WireError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest datagram the receive side will accept.
pub const MAX_DATAGRAM_LEN: usize = 65_507;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Local address to bind the socket to, for example `"0.0.0.0:0"`.
    pub bind_addr: String,

    /// Endpoint the trajectory datagrams are sent to, for example `"192.168.1.10:6000"`.
    pub dest_addr: String
}

/// A UDP socket which frames and sends trajectory payloads.
#[derive(Debug)]
pub struct TrajSocket {
    socket: UdpSocket,

    dest: Option<SocketAddr>,

    frame_number: u32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum TrajSocketError {
    #[error("Could not bind the socket to {0}: {1}")]
    BindError(String, std::io::Error),

    #[error("Could not resolve the address {0}")]
    InvalidAddress(String),

    #[error("The socket has no destination endpoint")]
    NoDestination,

    #[error("Could not send the datagram: {0}")]
    SendError(std::io::Error),

    #[error("Could not receive a datagram: {0}")]
    RecvError(std::io::Error),

    #[error("Could not set a socket option: {0}")]
    SocketOptionError(std::io::Error),

    #[error("Received an invalid frame: {0}")]
    InvalidFrame(WireError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrajSocket {
    /// Create a sending socket bound to `params.bind_addr` and targeting `params.dest_addr`.
    pub fn new(params: &NetParams) -> Result<Self, TrajSocketError> {
        let mut socket = Self::bind(&params.bind_addr)?;
        socket.dest = Some(resolve(&params.dest_addr)?);

        debug!(
            "TrajSocket bound to {:?}, sending to {:?}", 
            socket.local_addr(), 
            socket.dest
        );

        Ok(socket)
    }

    /// Create a socket bound to the given address with no destination, used to listen.
    pub fn bind(addr: &str) -> Result<Self, TrajSocketError> {
        let socket = UdpSocket::bind(addr)
            .map_err(|e| TrajSocketError::BindError(addr.into(), e))?;

        Ok(Self {
            socket,
            dest: None,
            frame_number: 0
        })
    }

    /// Set the receive timeout, `None` blocks forever.
    pub fn set_recv_timeout(&self, timeout: Option<Duration>) -> Result<(), TrajSocketError> {
        self.socket.set_read_timeout(timeout)
            .map_err(TrajSocketError::SocketOptionError)
    }

    /// The address the socket is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    /// Number of the next frame to be sent.
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    /// Frame and send a payload to the destination endpoint.
    ///
    /// Returns the number of bytes sent, including the header.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<usize, TrajSocketError> {
        let dest = match self.dest {
            Some(d) => d,
            None => return Err(TrajSocketError::NoDestination)
        };

        let datagram = traj::frame(self.frame_number, payload);

        let sent = self.socket.send_to(&datagram, dest)
            .map_err(TrajSocketError::SendError)?;

        self.frame_number = self.frame_number.wrapping_add(1);

        Ok(sent)
    }

    /// Receive one framed datagram, returning its header and payload.
    pub fn recv_frame(&self) -> Result<(FrameHeader, Vec<u8>), TrajSocketError> {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];

        let (len, _) = self.socket.recv_from(&mut buf)
            .map_err(TrajSocketError::RecvError)?;

        let (header, payload) = traj::unframe(&buf[..len])
            .map_err(TrajSocketError::InvalidFrame)?;

        Ok((header, payload.to_vec()))
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn resolve(addr: &str) -> Result<SocketAddr, TrajSocketError> {
    match addr.to_socket_addrs() {
        Ok(mut addrs) => addrs.next()
            .ok_or_else(|| TrajSocketError::InvalidAddress(addr.into())),
        Err(_) => Err(TrajSocketError::InvalidAddress(addr.into()))
    }
}
