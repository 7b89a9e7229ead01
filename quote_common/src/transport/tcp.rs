//! Newline-delimited JSON framing over TCP.
//!
//! Each message is serialized with `serde_json` and terminated by `\n`. The socket
//! is cloned with `try_clone` so the reading and writing halves can live on
//! different threads. A zero-byte read is end-of-stream, unless the local sink
//! aborted the socket, in which case the source reports `ConnectionAborted` like
//! the in-memory transport does.
use std::io::{self, BufRead, BufReader, Read, Write};
use std::marker::PhantomData;
use std::net::{Shutdown, TcpStream};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{MessageSink, MessageSource};
use crate::error::StreamError;
use crate::result::Result;
use crate::signal::TerminationSignal;

/// Longest accepted line, excluding the trailing `\n`.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Writing half of a JSON-lines stream.
pub struct JsonLineSink<T> {
    stream: TcpStream,
    closed: bool,
    aborted: TerminationSignal,
    _message: PhantomData<fn(&T)>,
}

/// Reading half of a JSON-lines stream.
pub struct JsonLineSource<T> {
    reader: BufReader<TcpStream>,
    line: String,
    aborted: TerminationSignal,
    _message: PhantomData<fn() -> T>,
}

/// Split a connected socket into a sink for `Out` and a source for `In`.
pub fn split_stream<Out, In>(stream: TcpStream) -> Result<(JsonLineSink<Out>, JsonLineSource<In>)> {
    stream.set_nodelay(true)?;
    let read_half = stream.try_clone()?;
    let aborted = TerminationSignal::new();
    let sink = JsonLineSink {
        stream,
        closed: false,
        aborted: aborted.clone(),
        _message: PhantomData,
    };
    let source = JsonLineSource {
        reader: BufReader::new(read_half),
        line: String::new(),
        aborted,
        _message: PhantomData,
    };
    Ok((sink, source))
}

impl<T: Serialize> MessageSink<T> for JsonLineSink<T> {
    fn send(&mut self, message: &T) -> Result<()> {
        if self.closed {
            return Err(StreamError::SendClosed);
        }
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');
        self.stream.write_all(&line)?;
        self.stream.flush()?;
        Ok(())
    }

    fn close_send(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream.shutdown(Shutdown::Write)?;
        Ok(())
    }

    fn abort(&mut self) {
        self.closed = true;
        // Raised before the shutdown wakes a blocked reader.
        self.aborted.raise();
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Shutdown of aborted stream failed: {}", e);
        }
    }
}

impl<T: DeserializeOwned> MessageSource<T> for JsonLineSource<T> {
    fn receive(&mut self) -> Result<Option<T>> {
        self.line.clear();
        let limit = MAX_LINE_BYTES as u64 + 1;
        let read = (&mut self.reader).take(limit).read_line(&mut self.line);
        if self.aborted.is_raised() {
            return Err(aborted());
        }
        let size = read?;
        if size == 0 {
            return Ok(None);
        }
        if size > MAX_LINE_BYTES && !self.line.ends_with('\n') {
            return Err(StreamError::LineTooLong(MAX_LINE_BYTES));
        }
        let message = serde_json::from_str(self.line.trim_end())?;
        Ok(Some(message))
    }
}

fn aborted() -> StreamError {
    StreamError::Io(io::Error::new(
        io::ErrorKind::ConnectionAborted,
        "stream aborted",
    ))
}
