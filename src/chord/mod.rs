//! Chord node: routing, stabilization, membership and storage over a [Transport].

mod directory;
mod fingers;
mod maintenance;
mod membership;
mod router;
mod server;
mod stabilize;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::common::{FingerTable, Id, IdSpace, Node, RequestSpecific, ResponseSpecific};
use crate::rpc::{Config, Peer, RequestError, RequestHandler, RpcSocket, Transport, UdpTransport};
use crate::{Error, Result};

pub use fingers::FingerRefresher;
pub use membership::{JoinError, RejoinWatchdog};
pub use router::{LookupError, ProbeError};
pub use storage::{LocalStore, StoreError};

use directory::RingDirectory;
use maintenance::Maintenance;

#[derive(Debug, Clone)]
/// A Chord node.
///
/// Cheap to clone, all clones share the same state.
pub struct Chord(Arc<Inner>);

#[derive(Debug)]
struct Inner {
    local: Node,
    space: IdSpace,
    config: Config,
    directory: RwLock<RingDirectory>,
    store: LocalStore,
    transport: Arc<dyn Transport>,
    maintenance: Mutex<Option<Maintenance>>,
    socket: Option<Arc<RpcSocket>>,
}

#[derive(Debug, Default, Clone)]
/// Chord node builder
pub struct ChordBuilder(Config);

impl ChordBuilder {
    /// Host to listen on and advertise to peers.
    pub fn host(&mut self, host: &str) -> &mut Self {
        self.0.host = host.to_string();

        self
    }

    /// Explicit port to listen on.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.0.port = Some(port);

        self
    }

    /// Width of the identifier space, in bits.
    pub fn id_bits(&mut self, bits: u8) -> &mut Self {
        self.0.id_bits = bits;

        self
    }

    /// UDP socket request timeout duration.
    pub fn request_timeout(&mut self, request_timeout: Duration) -> &mut Self {
        self.0.request_timeout = request_timeout;

        self
    }

    pub fn stabilize_interval(&mut self, interval: Duration) -> &mut Self {
        self.0.stabilize_interval = interval;

        self
    }

    pub fn fix_fingers_interval(&mut self, interval: Duration) -> &mut Self {
        self.0.fix_fingers_interval = interval;

        self
    }

    pub fn rejoin_interval(&mut self, interval: Duration) -> &mut Self {
        self.0.rejoin_interval = interval;

        self
    }

    pub fn replication_interval(&mut self, interval: Duration) -> &mut Self {
        self.0.replication_interval = interval;

        self
    }

    /// Bind a UDP socket and start answering requests. The node still has to [Chord::join].
    pub fn build(&self) -> Result<Chord> {
        Chord::new(self.0.clone())
    }

    /// Create a node named `host:port` that talks through `transport` instead of UDP.
    ///
    /// Nothing answers requests addressed to it until it is registered with the transport,
    /// see [crate::rpc::LocalNetwork::register].
    pub fn build_with_transport(
        &self,
        host: &str,
        port: u16,
        transport: Arc<dyn Transport>,
    ) -> Result<Chord> {
        let space = IdSpace::new(self.0.id_bits)?;
        let local = Node::new(host, port, &space);

        Ok(Chord::from_parts(local, space, self.0.clone(), transport, None))
    }

    /// Same as [ChordBuilder::build_with_transport] with an explicit id.
    pub fn build_with_id(
        &self,
        host: &str,
        port: u16,
        id: Id,
        transport: Arc<dyn Transport>,
    ) -> Result<Chord> {
        let space = IdSpace::new(self.0.id_bits)?;
        if !space.contains(id) {
            return Err(Error::IdOutOfSpace(id.0, space.bits()));
        }

        let local = Node::with_id(host, port, id);

        Ok(Chord::from_parts(local, space, self.0.clone(), transport, None))
    }
}

impl Chord {
    /// Create a new builder.
    pub fn builder() -> ChordBuilder {
        ChordBuilder::default()
    }

    /// Bind a UDP socket according to `config` and start answering requests.
    pub fn new(config: Config) -> Result<Self> {
        let space = IdSpace::new(config.id_bits)?;

        let (socket, incoming) = RpcSocket::bind(&config)?;
        let local = Node::new(&config.host, socket.local_addr().port(), &space);

        let transport = Arc::new(UdpTransport::new(socket.clone()));
        let chord = Chord::from_parts(local, space, config, transport, Some(socket.clone()));

        let server = chord.clone();
        thread::Builder::new()
            .name(format!("chord-server-{}", socket.local_addr().port()))
            .spawn(move || server.serve(socket, incoming))?;

        info!(local = %chord.local(), "Chord node listening");

        Ok(chord)
    }

    fn from_parts(
        local: Node,
        space: IdSpace,
        config: Config,
        transport: Arc<dyn Transport>,
        socket: Option<Arc<RpcSocket>>,
    ) -> Self {
        Chord(Arc::new(Inner {
            directory: RwLock::new(RingDirectory::new(local.clone(), &space)),
            local,
            space,
            config,
            store: LocalStore::new(),
            transport,
            maintenance: Mutex::new(None),
            socket,
        }))
    }

    // === Getters ===

    pub fn local(&self) -> &Node {
        &self.0.local
    }

    pub fn id(&self) -> &Id {
        self.0.local.id()
    }

    pub fn space(&self) -> &IdSpace {
        &self.0.space
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    /// Address of the UDP socket, if this node has one.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.0.socket.as_ref().map(|socket| socket.local_addr())
    }

    pub fn successor(&self) -> Node {
        self.directory().successor()
    }

    pub fn predecessor(&self) -> Option<Node> {
        self.directory().predecessor().cloned()
    }

    pub fn successor_list(&self) -> Vec<Node> {
        self.directory().successor_list()
    }

    pub fn finger_table(&self) -> FingerTable {
        self.directory().fingers().clone()
    }

    pub fn seed(&self) -> Option<Node> {
        self.directory().seed().cloned()
    }

    pub fn store(&self) -> &LocalStore {
        &self.0.store
    }

    /// Whether the maintenance threads are running.
    pub fn is_maintained(&self) -> bool {
        self.0.maintenance.lock().is_some()
    }

    // === Public Methods ===

    /// Callable handle for `node`. Calls to this node never leave the process.
    pub fn peer<'a>(&'a self, node: &'a Node) -> Peer<'a> {
        Peer::new(self, node)
    }

    /// Stop maintenance and, for UDP nodes, close the socket. Does not depart from the ring.
    pub fn shutdown(&self) {
        self.stop_maintenance();

        if let Some(socket) = &self.0.socket {
            socket.shutdown();
        }
    }

    // === Private Methods ===

    pub(crate) fn directory(&self) -> RwLockReadGuard<'_, RingDirectory> {
        self.0.directory.read()
    }

    pub(crate) fn directory_mut(&self) -> RwLockWriteGuard<'_, RingDirectory> {
        self.0.directory.write()
    }

    fn start_maintenance(&self) -> std::result::Result<(), std::io::Error> {
        let mut maintenance = self.0.maintenance.lock();

        if maintenance.is_none() {
            *maintenance = Some(Maintenance::start(self)?);
        }

        Ok(())
    }

    fn stop_maintenance(&self) {
        let maintenance = self.0.maintenance.lock().take();

        if let Some(maintenance) = maintenance {
            maintenance.stop();
        }
    }
}

impl Transport for Chord {
    fn request(
        &self,
        to: &Node,
        request: RequestSpecific,
    ) -> std::result::Result<ResponseSpecific, RequestError> {
        if to == self.local() {
            return self
                .handle_request(request)
                .map_err(RequestError::ErrorResponse);
        }

        self.0.transport.request(to, request)
    }
}
