//! In-process SMTP server used by the integration tests.
//!
//! Listens on `127.0.0.1:0`, one thread per connection, and answers with a
//! fixed behavior so tests can drive success and each failure kind.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// How the mock server treats every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Accept every transaction.
    Accept,
    /// Refuse EHLO and HELO with 554.
    RejectHandshake,
    /// Refuse every recipient with 550.
    RejectRecipient,
    /// Accept the TCP connection but never say anything.
    Silent,
}

/// Handle to a running mock server. The server thread lives until the test
/// process exits.
pub struct MockSmtpServer {
    port: u16,
    messages: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl MockSmtpServer {
    /// Bind to an ephemeral port and start serving.
    pub fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock smtp server");
        let port = listener.local_addr().expect("local addr").port();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = Arc::clone(&messages);
        let counter = Arc::clone(&connections);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                counter.fetch_add(1, Ordering::SeqCst);
                let accepted = Arc::clone(&accepted);
                thread::spawn(move || {
                    let _ = handle(stream, behavior, &accepted);
                });
            }
        });

        Self {
            port,
            messages,
            connections,
        }
    }

    /// Port the server listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bodies of every message accepted so far (dot-unstuffed).
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// A port on 127.0.0.1 with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

fn handle(stream: TcpStream, behavior: Behavior, accepted: &Mutex<Vec<String>>) -> std::io::Result<()> {
    if behavior == Behavior::Silent {
        let mut stream = stream;
        let mut buf = [0_u8; 256];
        while stream.read(&mut buf)? > 0 {}
        return Ok(());
    }

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    writer.write_all(b"220 mock.local ESMTP ready\r\n")?;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let verb = line.trim_end().to_ascii_uppercase();

        if verb.starts_with("EHLO") || verb.starts_with("HELO") {
            if behavior == Behavior::RejectHandshake {
                writer.write_all(b"554 no service\r\n")?;
            } else if verb.starts_with("EHLO") {
                writer.write_all(b"250-mock.local\r\n250-8BITMIME\r\n250 OK\r\n")?;
            } else {
                writer.write_all(b"250 mock.local\r\n")?;
            }
        } else if verb.starts_with("MAIL FROM:") {
            writer.write_all(b"250 sender ok\r\n")?;
        } else if verb.starts_with("RCPT TO:") {
            if behavior == Behavior::RejectRecipient {
                writer.write_all(b"550 no such user\r\n")?;
            } else {
                writer.write_all(b"250 recipient ok\r\n")?;
            }
        } else if verb == "DATA" {
            writer.write_all(b"354 end with <CRLF>.<CRLF>\r\n")?;
            let mut body = String::new();
            loop {
                let mut data_line = String::new();
                if reader.read_line(&mut data_line)? == 0 {
                    return Ok(());
                }
                if data_line == ".\r\n" {
                    break;
                }
                let unstuffed = data_line.strip_prefix('.').unwrap_or(&data_line);
                body.push_str(unstuffed);
            }
            accepted.lock().unwrap().push(body);
            writer.write_all(b"250 queued\r\n")?;
        } else if verb == "QUIT" {
            writer.write_all(b"221 bye\r\n")?;
            return Ok(());
        } else {
            writer.write_all(b"500 unrecognized command\r\n")?;
        }
    }
}
