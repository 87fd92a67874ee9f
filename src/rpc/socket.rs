//! UDP socket layer managing incoming/outgoing requests and responses.

mod inflight_requests;

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::common::{
    undecodable_request, ErrorSpecific, Message, MessageType, RequestSpecific, ResponseSpecific,
    ERROR_METHOD_UNKNOWN,
};

use super::config::Config;
use super::RequestError;
use inflight_requests::InflightRequests;

const VERSION: [u8; 4] = [67, 72, 0, 1]; // "CH" version 01
const MTU: usize = 2048;

/// Default request timeout before abandoning an inflight request to a non-responding node.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000); // 2 seconds
/// How long the listener blocks on an empty socket before checking for shutdown.
pub const MAX_THREAD_BLOCK_DURATION: Duration = Duration::from_millis(10);

#[derive(Debug)]
/// A request received from a remote node, waiting for [RpcSocket::respond].
pub struct IncomingRequest {
    pub from: SocketAddr,
    pub transaction_id: u16,
    pub request: RequestSpecific,
}

/// A UdpSocket wrapper that formats and correlates Chord requests and responses.
///
/// Callers block in [RpcSocket::request] until the listener thread hands them the matching
/// response, or the request times out.
#[derive(Debug)]
pub struct RpcSocket {
    socket: UdpSocket,
    local_addr: SocketAddr,
    request_timeout: Duration,
    inflight_requests: Mutex<InflightRequests>,
    shutdown: AtomicBool,
}

impl RpcSocket {
    /// Bind a socket and spawn its listener thread.
    ///
    /// Incoming requests are delivered to the returned receiver, which disconnects once the
    /// socket is shutdown.
    pub fn bind(config: &Config) -> Result<(Arc<Self>, Receiver<IncomingRequest>), std::io::Error> {
        let socket = UdpSocket::bind((config.host.as_str(), config.port.unwrap_or(0)))?;
        socket.set_read_timeout(Some(MAX_THREAD_BLOCK_DURATION))?;

        let local_addr = socket.local_addr()?;

        let rpc_socket = Arc::new(RpcSocket {
            socket,
            local_addr,
            request_timeout: config.request_timeout,
            inflight_requests: Mutex::new(InflightRequests::new()),
            shutdown: AtomicBool::new(false),
        });

        let (sender, receiver) = flume::unbounded();

        let listener = rpc_socket.clone();
        thread::Builder::new()
            .name(format!("chord-socket-{}", local_addr.port()))
            .spawn(move || listener.listen(sender))?;

        Ok((rpc_socket, receiver))
    }

    // === Getters ===

    /// Returns the address the server is listening to.
    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    // === Public Methods ===

    /// Send a request to the given address and block until its response arrives.
    pub fn request(
        &self,
        address: SocketAddr,
        request: RequestSpecific,
    ) -> Result<ResponseSpecific, RequestError> {
        let (sender, receiver) = flume::bounded(1);

        let transaction_id = self.inflight_requests.lock().add(address, sender);

        let message = Message {
            transaction_id,
            version: Some(VERSION.to_vec()),
            message_type: MessageType::Request(request),
        };

        if let Err(error) = self.send(address, &message) {
            self.inflight_requests.lock().remove(transaction_id);
            return Err(error);
        }

        match receiver.recv_timeout(self.request_timeout) {
            Ok(MessageType::Response(response)) => Ok(response),
            Ok(MessageType::Error(error)) => Err(RequestError::ErrorResponse(error)),
            Ok(MessageType::Request(_)) => Err(RequestError::UnexpectedResponse(
                "request in place of a response",
            )),
            Err(_) => {
                self.inflight_requests.lock().remove(transaction_id);
                Err(RequestError::Timeout)
            }
        }
    }

    /// Answer an [IncomingRequest] with either a response or an error.
    pub fn respond(
        &self,
        address: SocketAddr,
        transaction_id: u16,
        response: Result<ResponseSpecific, ErrorSpecific>,
    ) {
        let message = Message {
            transaction_id,
            version: Some(VERSION.to_vec()),
            message_type: match response {
                Ok(response) => MessageType::Response(response),
                Err(error) => MessageType::Error(error),
            },
        };

        let _ = self.send(address, &message).map_err(|e| {
            debug!(?e, "Error sending response message");
        });
    }

    /// Stop the listener thread, disconnecting the incoming requests receiver.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    // === Private Methods ===

    fn listen(&self, incoming: Sender<IncomingRequest>) {
        let mut buf = [0u8; MTU];

        while !self.shutdown.load(Ordering::Relaxed) {
            self.inflight_requests.lock().cleanup(self.request_timeout);

            let (amt, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => {
                    trace!(context = "socket_error", ?e, "recv_from failed unexpectedly");
                    continue;
                }
            };

            if from.port() == 0 {
                trace!(context = "socket_validation", message = "Response from port 0");
                continue;
            }

            let bytes = &buf[..amt];

            let message = match Message::from_bytes(bytes) {
                Ok(message) => message,
                Err(error) => {
                    trace!(
                        context = "socket_error",
                        ?error,
                        ?from,
                        message = ?String::from_utf8_lossy(bytes),
                        "Received invalid Bencode message."
                    );

                    if let Some((transaction_id, method)) = undecodable_request(bytes) {
                        self.respond(
                            from,
                            transaction_id,
                            Err(ErrorSpecific {
                                code: ERROR_METHOD_UNKNOWN,
                                description: format!("Method Unknown: {method}"),
                            }),
                        );
                    }

                    continue;
                }
            };

            match message.message_type {
                MessageType::Request(request) => {
                    trace!(context = "socket_message_receiving", ?request, ?from, "Received request message");

                    let incoming_request = IncomingRequest {
                        from,
                        transaction_id: message.transaction_id,
                        request,
                    };

                    if incoming.send(incoming_request).is_err() {
                        debug!("Chord server loop is gone, stopping the socket listener.");
                        break;
                    }
                }
                message_type => {
                    trace!(context = "socket_message_receiving", ?message_type, ?from, "Received response message");

                    let inflight = self
                        .inflight_requests
                        .lock()
                        .remove_matching(message.transaction_id, &from);

                    match inflight {
                        Some(request) => {
                            let _ = request.sender.send(message_type);
                        }
                        None => {
                            trace!(
                                context = "socket_validation",
                                message = "Unexpected response id or wrong address"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Send a raw chord message
    fn send(&self, address: SocketAddr, message: &Message) -> Result<(), RequestError> {
        self.socket.send_to(&message.to_bytes()?, address)?;
        trace!(context = "socket_message_sending", ?message);
        Ok(())
    }
}
