use std::io::{self, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{unbounded, Sender};

/// Fan-out of push records to connected observers, one JSON line each.
pub struct PushServer {
    sender: Sender<String>,
}

impl PushServer {
    pub fn broadcast(&self, line: &str) {
        if let Err(err) = self.sender.send(line.to_string()) {
            log::error!("Failed to queue push record: {}", err);
        }
    }
}

pub fn start_push_server(bind_addr: std::net::SocketAddr) -> Option<PushServer> {
    let listener = match TcpListener::bind(bind_addr) {
        Ok(listener) => listener,
        Err(err) => {
            log::warn!(
                "Push server bind failed at {}: {}. Broadcasting disabled.",
                bind_addr,
                err
            );
            return None;
        }
    };

    let (sender, receiver) = unbounded::<String>();
    listener
        .set_nonblocking(true)
        .expect("set nonblocking failed");
    let clients: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));
    let accept_clients = Arc::clone(&clients);

    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                log::info!("Push client connected: {}", addr);
                if let Err(err) = stream.set_nodelay(true) {
                    log::warn!("Failed to set TCP_NODELAY: {}", err);
                }
                if let Err(err) = stream.set_nonblocking(false) {
                    log::warn!(
                        "Failed to set blocking mode for push client {}: {}",
                        addr,
                        err
                    );
                }
                accept_clients
                    .lock()
                    .expect("clients mutex poisoned")
                    .push(stream);
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(std::time::Duration::from_millis(50));
            }
            Err(err) => {
                log::error!("Error accepting push client: {}", err);
                thread::sleep(std::time::Duration::from_millis(200));
            }
        }

        while let Ok(line) = receiver.try_recv() {
            broadcast_line(&clients, &line);
        }
    });

    Some(PushServer { sender })
}

fn write_line(stream: &mut TcpStream, line: &str) -> io::Result<()> {
    let mut buffer = Vec::with_capacity(line.len() + 1);
    buffer.extend_from_slice(line.as_bytes());
    buffer.push(b'\n');
    stream.write_all(&buffer)
}

fn broadcast_line(clients: &Arc<Mutex<Vec<TcpStream>>>, line: &str) {
    let mut guard = clients.lock().expect("clients mutex poisoned");
    guard.retain_mut(|stream| match write_line(stream, line) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("Dropping push client: {}", err);
            false
        }
    });
}
