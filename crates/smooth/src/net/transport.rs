use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

pub const MAX_DATAGRAM_SIZE: usize = 1200;

pub trait Transport {
    fn send_datagram(&mut self, data: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_datagram(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).send_datagram(data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransportStats {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

#[derive(Debug, Default)]
pub struct RecordingTransport {
    datagrams: Vec<Vec<u8>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datagrams(&self) -> &[Vec<u8>] {
        &self.datagrams
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.datagrams.last().map(Vec::as_slice)
    }

    pub fn take(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.datagrams)
    }

    pub fn len(&self) -> usize {
        self.datagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datagrams.is_empty()
    }
}

impl Transport for RecordingTransport {
    fn send_datagram(&mut self, data: &[u8]) -> io::Result<()> {
        self.datagrams.push(data.to_vec());
        Ok(())
    }
}

pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    target: Option<SocketAddr>,
    stats: TransportStats,
    recv_buffer: [u8; MAX_DATAGRAM_SIZE],
}

impl UdpTransport {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            target: None,
            stats: TransportStats::default(),
            recv_buffer: [0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn target(&self) -> Option<SocketAddr> {
        self.target
    }

    pub fn set_target(&mut self, addr: SocketAddr) {
        self.target = Some(addr);
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    pub fn receive(&mut self) -> io::Result<Vec<(Vec<u8>, SocketAddr)>> {
        let mut received = Vec::new();

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((len, addr)) => {
                    self.stats.datagrams_received += 1;
                    self.stats.bytes_received += len as u64;
                    received.push((self.recv_buffer[..len].to_vec(), addr));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        Ok(received)
    }
}

impl Transport for UdpTransport {
    fn send_datagram(&mut self, data: &[u8]) -> io::Result<()> {
        let target = self
            .target
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no target address set"))?;

        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "datagram exceeds MTU",
            ));
        }

        let sent = self.socket.send_to(data, target)?;
        self.stats.datagrams_sent += 1;
        self.stats.bytes_sent += sent as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_via<T: Transport>(mut transport: T, data: &[u8]) -> io::Result<()> {
        transport.send_datagram(data)
    }

    #[test]
    fn recording_transport_keeps_order() {
        let mut transport = RecordingTransport::new();
        transport.send_datagram(&[1]).unwrap();
        send_via(&mut transport, &[2, 3]).unwrap();

        assert_eq!(transport.len(), 2);
        assert_eq!(transport.last(), Some(&[2u8, 3][..]));
        assert_eq!(transport.take(), vec![vec![1], vec![2, 3]]);
        assert!(transport.is_empty());
    }

    #[test]
    fn udp_requires_target() {
        let mut transport = UdpTransport::bind("127.0.0.1:0").unwrap();
        let err = transport.send_datagram(&[0]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
