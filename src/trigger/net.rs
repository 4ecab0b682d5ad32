//! TCP/UDP listener trigger.
//!
//! Every successful read becomes one [`NetMessage`]: no framing, no
//! reassembly. TCP runs one accept thread plus one reader thread per
//! connection; UDP runs a single reader thread. Closing the listener stops
//! the accept/read loops, shuts down open connections and joins every thread
//! before returning.

use super::{emit, CancelToken, EventSource, TriggerError, TriggerResult};
use crate::event::Event;
use crate::host::{Capability, Host};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
pub const DEFAULT_READ_BUFFER: usize = 64 * 1024;

/// How often blocked accept/recv calls wake up to check for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Transport a listener is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetProtocol {
    Tcp,
    Udp,
    Icmp,
}

impl NetProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetProtocol::Tcp => "tcp",
            NetProtocol::Udp => "udp",
            NetProtocol::Icmp => "icmp",
        }
    }
}

impl fmt::Display for NetProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetProtocol {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(NetProtocol::Tcp),
            "udp" => Ok(NetProtocol::Udp),
            "icmp" => Ok(NetProtocol::Icmp),
            other => Err(TriggerError::NotImplemented(other.to_string())),
        }
    }
}

/// One read's worth of bytes plus the addresses it travelled between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetMessage {
    pub protocol: NetProtocol,
    pub payload: Vec<u8>,
    pub remote_host: String,
    pub remote_port: u16,
    pub local_host: String,
    pub local_port: u16,
    pub time: DateTime<Utc>,
}

impl NetMessage {
    fn new(protocol: NetProtocol, payload: Vec<u8>, remote: SocketAddr, local: SocketAddr) -> Self {
        Self {
            protocol,
            payload,
            remote_host: remote.ip().to_string(),
            remote_port: remote.port(),
            local_host: local.ip().to_string(),
            local_port: local.port(),
            time: Utc::now(),
        }
    }
}

/// Tunables for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetOptions {
    pub channel_capacity: usize,
    pub read_buffer: usize,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            read_buffer: DEFAULT_READ_BUFFER,
        }
    }
}

enum Socket {
    Tcp(Arc<TcpListener>),
    Udp(Arc<UdpSocket>),
}

impl Socket {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Socket::Tcp(l) => l.local_addr(),
            Socket::Udp(s) => s.local_addr(),
        }
    }
}

/// Open TCP connections, kept so close can shut them down.
type ConnectionRegistry = Arc<Mutex<HashMap<u64, TcpStream>>>;

/// A running TCP or UDP listener.
pub struct NetListener {
    protocol: NetProtocol,
    events: Receiver<Event<NetMessage>>,
    token: CancelToken,
    socket: Mutex<Option<Socket>>,
    main_worker: Mutex<Option<JoinHandle<()>>>,
    conn_workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    connections: ConnectionRegistry,
}

impl NetListener {
    /// Bind with default options.
    pub fn listen(host: &Host, protocol: NetProtocol, addr: &str, port: u16) -> TriggerResult<Self> {
        Self::listen_with(host, protocol, addr, port, NetOptions::default())
    }

    /// Bind `addr:port` and start reading. Port 0 picks an ephemeral port.
    pub fn listen_with(
        host: &Host,
        protocol: NetProtocol,
        addr: &str,
        port: u16,
        options: NetOptions,
    ) -> TriggerResult<Self> {
        // Unsupported transports fail before the capability check.
        if protocol == NetProtocol::Icmp {
            return Err(TriggerError::NotImplemented(format!("{} listener", protocol)));
        }
        host.check(Capability::Net)?;

        let (tx, rx) = bounded(options.channel_capacity);
        let token = CancelToken::new();
        let conn_workers = Arc::new(Mutex::new(Vec::new()));
        let connections: ConnectionRegistry = Arc::new(Mutex::new(HashMap::new()));

        let (socket, worker) = match protocol {
            NetProtocol::Tcp => {
                let listener = Arc::new(TcpListener::bind((addr, port))?);
                listener.set_nonblocking(true)?;
                let worker = spawn_tcp_accept(
                    Arc::clone(&listener),
                    tx,
                    token.clone(),
                    options.read_buffer,
                    Arc::clone(&conn_workers),
                    Arc::clone(&connections),
                )?;
                (Socket::Tcp(listener), worker)
            }
            NetProtocol::Udp => {
                let socket = Arc::new(UdpSocket::bind((addr, port))?);
                socket.set_read_timeout(Some(POLL_INTERVAL))?;
                let worker =
                    spawn_udp_reader(Arc::clone(&socket), tx, token.clone(), options.read_buffer)?;
                (Socket::Udp(socket), worker)
            }
            NetProtocol::Icmp => {
                return Err(TriggerError::NotImplemented(format!("{} listener", protocol)))
            }
        };

        match socket.local_addr() {
            Ok(local) => tracing::info!("{} listener bound on {}", protocol, local),
            Err(e) => tracing::warn!("{} listener bound, local address unavailable: {}", protocol, e),
        }

        Ok(Self {
            protocol,
            events: rx,
            token,
            socket: Mutex::new(Some(socket)),
            main_worker: Mutex::new(Some(worker)),
            conn_workers,
            connections,
        })
    }

    pub fn protocol(&self) -> NetProtocol {
        self.protocol
    }

    pub fn events(&self) -> &Receiver<Event<NetMessage>> {
        &self.events
    }

    /// Address of the live socket, or empty once closed.
    pub fn local_addr(&self) -> String {
        self.socket
            .lock()
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.to_string())
            .unwrap_or_default()
    }

    /// Always empty: UDP is connectionless and a TCP listener has many peers.
    /// Per-message peers are on [`NetMessage`].
    pub fn remote_addr(&self) -> String {
        String::new()
    }

    /// Number of TCP connections currently open.
    pub fn open_connections(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signal every producer to stop without waiting for it.
    ///
    /// Open connections are shut down so readers blocked on an idle peer
    /// return; the channel disconnects once all threads have exited.
    pub fn cancel(&self) {
        self.token.cancel();
        for stream in self.connections.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }

    /// Stop all loops and join every thread. Idempotent.
    pub fn close(&self) {
        self.token.cancel();

        // The accept loop must exit first so no connection registers after
        // the shutdown sweep below.
        if let Some(worker) = self.main_worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!("{} listener thread panicked", self.protocol);
            }
        }

        for (_, stream) in self.connections.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }

        let workers: Vec<_> = self.conn_workers.lock().drain(..).collect();
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("{} connection thread panicked", self.protocol);
            }
        }

        if self.socket.lock().take().is_some() {
            tracing::info!("{} listener closed", self.protocol);
        }
    }
}

impl EventSource<NetMessage> for NetListener {
    fn events(&self) -> &Receiver<Event<NetMessage>> {
        NetListener::events(self)
    }

    fn cancel(&self) {
        NetListener::cancel(self);
    }
}

impl Drop for NetListener {
    fn drop(&mut self) {
        self.close();
    }
}

fn is_poll_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn spawn_tcp_accept(
    listener: Arc<TcpListener>,
    tx: Sender<Event<NetMessage>>,
    token: CancelToken,
    read_buffer: usize,
    workers: Arc<Mutex<Vec<JoinHandle<()>>>>,
    connections: ConnectionRegistry,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("tcp-accept".to_string())
        .spawn(move || {
            let mut next_id = 0u64;
            while !token.is_cancelled() {
                match listener.accept() {
                    Ok((stream, peer)) => {
                        next_id += 1;
                        match start_connection(
                            next_id,
                            stream,
                            peer,
                            tx.clone(),
                            token.clone(),
                            read_buffer,
                            &connections,
                        ) {
                            Ok(handle) => {
                                let mut workers = workers.lock();
                                // Finished readers need no join.
                                workers.retain(|h| !h.is_finished());
                                workers.push(handle);
                            }
                            Err(e) => tracing::warn!("Dropping connection from {}: {}", peer, e),
                        }
                    }
                    Err(e) if is_poll_timeout(&e) => {
                        if token.wait_timeout(POLL_INTERVAL) {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => continue,
                    Err(e) => {
                        tracing::warn!("TCP accept failed, listener stopping: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("TCP accept loop exiting");
        })
}

fn start_connection(
    id: u64,
    stream: TcpStream,
    peer: SocketAddr,
    tx: Sender<Event<NetMessage>>,
    token: CancelToken,
    read_buffer: usize,
    connections: &ConnectionRegistry,
) -> io::Result<JoinHandle<()>> {
    // Accepted sockets inherit non-blocking mode on some platforms.
    stream.set_nonblocking(false)?;
    let local = stream.local_addr()?;
    {
        let mut open = connections.lock();
        open.insert(id, stream.try_clone()?);
        // A cancel that swept the registry before this insert never saw us.
        if token.is_cancelled() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
    tracing::debug!("TCP connection {} from {}", id, peer);

    let registry = Arc::clone(connections);
    let spawned = thread::Builder::new()
        .name(format!("tcp-conn-{}", id))
        .spawn(move || {
            read_connection(stream, peer, local, &tx, &token, read_buffer);
            registry.lock().remove(&id);
            tracing::debug!("TCP connection {} from {} closed", id, peer);
        });
    if spawned.is_err() {
        connections.lock().remove(&id);
    }
    spawned
}

fn read_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    local: SocketAddr,
    tx: &Sender<Event<NetMessage>>,
    token: &CancelToken,
    read_buffer: usize,
) {
    let mut buf = vec![0u8; read_buffer];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let msg = NetMessage::new(NetProtocol::Tcp, buf[..n].to_vec(), peer, local);
                if !emit(tx, token, Event::new(msg)) {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("TCP read from {} ended: {}", peer, e);
                break;
            }
        }
    }
}

fn spawn_udp_reader(
    socket: Arc<UdpSocket>,
    tx: Sender<Event<NetMessage>>,
    token: CancelToken,
    read_buffer: usize,
) -> io::Result<JoinHandle<()>> {
    let local = socket.local_addr()?;
    thread::Builder::new()
        .name("udp-reader".to_string())
        .spawn(move || {
            let mut buf = vec![0u8; read_buffer];
            while !token.is_cancelled() {
                match socket.recv_from(&mut buf) {
                    Ok((0, _)) => continue,
                    Ok((n, peer)) => {
                        let msg = NetMessage::new(NetProtocol::Udp, buf[..n].to_vec(), peer, local);
                        if !emit(&tx, &token, Event::new(msg)) {
                            break;
                        }
                    }
                    Err(e) if is_poll_timeout(&e) => continue,
                    Err(e) => {
                        tracing::debug!("UDP read on {} ended: {}", local, e);
                        break;
                    }
                }
            }
            tracing::debug!("UDP reader exiting");
        })
}
