/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::io;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::net::Shutdown;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use rustls::ClientConnection;

mod private {
    pub trait Sealed {}
}

/// Transport security state of a [Connection](super::Connection).
///
/// Only [Plain] and [Secure] implement this trait. Each state fixes the
/// byte stream types of the two connection halves, so a decoder bound
/// to the plain socket cannot survive the TLS upgrade.
pub trait Security: private::Sealed {
    type Reader: Read + Send;
    type Writer: Write + Close + Send;
}

/// Unencrypted TCP stream, the state after dialing.
#[derive(Debug)]
pub struct Plain;

/// TLS protected stream, the state after the upgrade.
#[derive(Debug)]
pub struct Secure;

impl private::Sealed for Plain {}
impl private::Sealed for Secure {}

impl Security for Plain {
    type Reader = TcpStream;
    type Writer = TcpStream;
}

impl Security for Secure {
    type Reader = TlsReadHalf;
    type Writer = TlsWriteHalf;
}

/// Shuts down both directions of a transport.
pub trait Close {
    fn close(&mut self) -> io::Result<()>;
}

impl Close for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

const TLS_BUFFER_SIZE: usize = 4096;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Lock order is always tls then socket. Neither lock is held while
// waiting for incoming bytes, and the tls lock is not held while
// records are written to the socket.
struct Session {
    tls: Mutex<ClientConnection>,
    socket: Mutex<TcpStream>,
}

impl Session {
    /// Sends the records the TLS state produced so far.
    ///
    /// The socket lock is taken before the tls lock is released, so
    /// records from both halves reach the wire in the order they were
    /// produced.
    fn send_pending(&self, mut tls: MutexGuard<'_, ClientConnection>) -> io::Result<()> {
        if !tls.wants_write() {
            return Ok(());
        }
        let mut records = Vec::new();
        while tls.wants_write() {
            tls.write_tls(&mut records)?;
        }
        let mut socket = lock(&self.socket);
        drop(tls);
        socket.write_all(&records)?;
        socket.flush()
    }
}

/// Splits a TLS session over a socket into independently usable halves.
///
/// Each half owns a handle of the same socket. A blocked reader does not
/// stop the writer, and a writer stuck on a full send window does not
/// stop the reader from decrypting what arrives.
pub(super) fn tls_halves(
    read_socket: TcpStream,
    write_socket: TcpStream,
    session: ClientConnection,
) -> (TlsReadHalf, TlsWriteHalf) {
    let session = Arc::new(Session {
        tls: Mutex::new(session),
        socket: Mutex::new(write_socket),
    });
    (
        TlsReadHalf {
            socket: read_socket,
            session: Arc::clone(&session),
            incoming: Box::new([0; TLS_BUFFER_SIZE]),
        },
        TlsWriteHalf { session },
    )
}

pub struct TlsReadHalf {
    socket: TcpStream,
    session: Arc<Session>,
    incoming: Box<[u8; TLS_BUFFER_SIZE]>,
}

impl Read for TlsReadHalf {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            // Handshake messages must go out before we wait for a reply
            self.session.send_pending(lock(&self.session.tls))?;
            match lock(&self.session.tls).reader().read(buf) {
                Ok(nr_read) => return Ok(nr_read),
                Err(err) if err.kind() == ErrorKind::WouldBlock => {}
                Err(err) => return Err(err),
            }
            let nr_read = self.socket.read(&mut self.incoming[..])?;
            if nr_read == 0 {
                return Ok(0);
            }
            let mut tls = lock(&self.session.tls);
            let mut bytes = &self.incoming[..nr_read];
            let mut failure = None;
            while !bytes.is_empty() {
                tls.read_tls(&mut bytes)?;
                if let Err(err) = tls.process_new_packets() {
                    failure = Some(err);
                    break;
                }
            }
            if let Some(err) = failure {
                // Best effort to deliver the alert, the session is dead anyway
                let _ = self.session.send_pending(tls);
                return Err(io::Error::new(ErrorKind::InvalidData, err));
            }
        }
    }
}

pub struct TlsWriteHalf {
    session: Arc<Session>,
}

impl Write for TlsWriteHalf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut tls = lock(&self.session.tls);
        let nr_written = tls.writer().write(buf)?;
        self.session.send_pending(tls)?;
        Ok(nr_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut tls = lock(&self.session.tls);
        tls.writer().flush()?;
        self.session.send_pending(tls)
    }
}

impl Close for TlsWriteHalf {
    fn close(&mut self) -> io::Result<()> {
        let mut tls = lock(&self.session.tls);
        tls.send_close_notify();
        let flushed = self.session.send_pending(tls);
        lock(&self.session.socket).shutdown(Shutdown::Both)?;
        flushed
    }
}
