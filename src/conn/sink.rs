/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::sync::mpsc::SendError;
use std::sync::mpsc::Sender;
use std::sync::mpsc::SyncSender;
use std::sync::mpsc::TrySendError;

use tracing::warn;

use super::ConnError;

/// Destination of write errors from the fire-and-forget stanza methods.
///
/// Every error is reported at most once and reporting must never block
/// the writer. Sinks can be shared by several writers at the same
/// time, hence the `Sync` requirement.
pub trait ErrorSink: Send + Sync {
    fn report(&self, err: ConnError);
}

/// Sink used until the caller installs one. Errors are logged and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn report(&self, err: ConnError) {
        warn!(%err, "no error sink installed, dropping error");
    }
}

impl ErrorSink for Sender<ConnError> {
    fn report(&self, err: ConnError) {
        if let Err(SendError(err)) = self.send(err) {
            warn!(%err, "error sink disconnected, dropping error");
        }
    }
}

impl ErrorSink for SyncSender<ConnError> {
    fn report(&self, err: ConnError) {
        match self.try_send(err) {
            Ok(()) => {}
            Err(TrySendError::Full(err)) => {
                warn!(%err, "error sink is full, dropping error");
            }
            Err(TrySendError::Disconnected(err)) => {
                warn!(%err, "error sink disconnected, dropping error");
            }
        }
    }
}
