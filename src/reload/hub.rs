//! WebSocket hub for live reload.
//!
//! An accept thread handshakes browsers into the client set; a reader thread
//! polls the (non-blocking) sockets and drops closed ones. `broadcast` writes
//! to every client and drops those that fail.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;
use crate::{debug, log};

const READ_POLL: Duration = Duration::from_millis(100);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Connected browsers of one dev server.
#[derive(Clone, Default)]
pub struct ReloadHub {
    clients: Clients,
}

impl ReloadHub {
    /// Bind the reload port and start accepting clients.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .with_context(|| format!("failed to bind reload channel on {addr}"))?;
        let hub = Self::default();

        let clients = Arc::clone(&hub.clients);
        thread::Builder::new()
            .name("reload-accept".into())
            .spawn(move || accept_loop(&listener, &clients))?;

        let clients = Arc::clone(&hub.clients);
        thread::Builder::new()
            .name("reload-read".into())
            .spawn(move || reader_loop(&clients))?;

        Ok(hub)
    }

    /// Send `message` to every client; returns how many received it.
    pub fn broadcast(&self, message: &HotReloadMessage) -> usize {
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            debug!("reload"; "no clients connected");
            return 0;
        }

        let frame = Message::Text(message.to_json().into());
        clients.retain_mut(|ws| match ws.send(frame.clone()) {
            Ok(()) => true,
            Err(e) => {
                debug!("reload"; "client dropped: {}", e);
                false
            }
        });
        clients.len()
    }
}

fn accept_loop(listener: &TcpListener, clients: &Clients) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => add_client(stream, clients),
            Err(e) => log!("reload"; "accept error: {}", e),
        }
    }
}

/// Handshake in blocking mode, then switch to non-blocking for polling reads.
fn add_client(stream: TcpStream, clients: &Clients) {
    let peer = stream.peer_addr().ok();
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            debug!("reload"; "handshake failed: {}", e);
            return;
        }
    };

    let hello = Message::Text(HotReloadMessage::connected().to_json().into());
    if let Err(e) = ws.send(hello) {
        debug!("reload"; "failed to greet client: {}", e);
        return;
    }
    if let Err(e) = ws.get_ref().set_nonblocking(true) {
        debug!("reload"; "failed to configure client socket: {}", e);
        return;
    }

    let mut clients = clients.lock();
    clients.push(ws);
    debug!("reload"; "client connected {:?} (total: {})", peer, clients.len());
}

/// Browsers never send anything we act on; reading only detects closes.
fn reader_loop(clients: &Clients) {
    loop {
        thread::sleep(READ_POLL);

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
    }
}
