use std::fs::Permissions;
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::bail;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::control_msg::{Request, Response};
use crate::deckbright_api::Handle;

/// Longest line we accept from a client.
pub const MAX_LINE_LEN: usize = 4096;

/// Reads one newline-terminated message into `line`.
/// Returns false on a clean end of stream.
///
/// Bytes are not checked for UTF-8 here, decoding reports that.
pub fn read_line(reader: &mut impl BufRead, line: &mut Vec<u8>) -> anyhow::Result<bool> {
    line.clear();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 1)
        .read_until(b'\n', line)?;
    if n == 0 {
        return Ok(false);
    }
    if n > MAX_LINE_LEN {
        bail!("message exceeds {} bytes", MAX_LINE_LEN);
    }
    return Ok(true);
}

pub fn parse_request(line: &[u8]) -> anyhow::Result<Request> {
    return Ok(serde_json::from_slice(line)?);
}

/// Reads and decodes one message, `None` on end of stream.
pub fn read_message<T: DeserializeOwned>(reader: &mut impl BufRead) -> anyhow::Result<Option<T>> {
    let mut line = Vec::new();
    if !read_line(reader, &mut line)? {
        return Ok(None);
    }
    return Ok(Some(serde_json::from_slice(&line)?));
}

pub fn write_message<T: Serialize>(writer: &mut impl Write, msg: &T) -> anyhow::Result<()> {
    let mut encoded = serde_json::to_vec(msg)?;
    encoded.push(b'\n');
    writer.write_all(&encoded)?;
    writer.flush()?;
    return Ok(());
}

fn lock_and_handle(handle: &Mutex<Handle>, request: Request) -> Response {
    match handle.lock() {
        Ok(handle) => handle.handle_request(request),
        Err(e) => {
            warn!("shared state is poisoned: {}", e);
            Response::failed("daemon state is poisoned")
        }
    }
}

/// Serves one client until it hangs up. Bad lines get an error response,
/// the connection stays open.
pub fn handle_client(stream: UnixStream, handle: Arc<Mutex<Handle>>) -> anyhow::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        let more = match read_line(&mut reader, &mut line) {
            Ok(more) => more,
            Err(e) => {
                // An oversized line leaves the rest of it in the buffer,
                // give up on this client.
                let _ = write_message(&mut writer, &Response::failed(e.to_string()));
                return Err(e);
            }
        };
        if !more {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let response = match parse_request(&line) {
            Ok(request) => {
                debug!(?request, "got request");
                lock_and_handle(&handle, request)
            }
            Err(e) => {
                warn!("malformed request: {}", e);
                Response::failed(format!("malformed request: {}", e))
            }
        };
        write_message(&mut writer, &response)?;
    }
    debug!("client disconnected");
    return Ok(());
}

/// Binds the control socket, replacing a stale one.
pub fn bind(path: &Path) -> anyhow::Result<UnixListener> {
    // Cleaning up on shutdown doesn't work since we don't unwind
    // after signals, so do it on startup instead.
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, Permissions::from_mode(0o666))?;
    info!("listening on {}", path.display());
    return Ok(listener);
}

/// Accept loop, one thread per client.
pub fn serve(listener: UnixListener, handle: Arc<Mutex<Handle>>) -> anyhow::Result<()> {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let thread_handle = handle.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_client(stream, thread_handle) {
                        warn!("client error: {:#}", e);
                    }
                });
            }
            Err(err) => {
                warn!("couldn't accept client: {}", err);
                continue;
            }
        }
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_msg::Brightness;
    use std::io::Cursor;

    #[test]
    fn reads_messages_line_by_line() {
        let input = b"{\"action\":\"sd_set_brightness\",\"brightness\":12}\n{\"action\":\"sd_reset\"}\n";
        let mut reader = Cursor::new(&input[..]);
        let first: Request = read_message(&mut reader).unwrap().unwrap();
        assert_eq!(first, Request::SetBrightness { brightness: Brightness::new(12) });
        let second: Request = read_message(&mut reader).unwrap().unwrap();
        assert_eq!(second, Request::Reset);
        assert!(read_message::<Request>(&mut reader).unwrap().is_none());
    }

    #[test]
    fn oversized_lines_are_rejected() {
        let input = vec![b'x'; MAX_LINE_LEN + 10];
        let mut reader = Cursor::new(input);
        let mut line = Vec::new();
        assert!(read_line(&mut reader, &mut line).is_err());
    }

    #[test]
    fn invalid_utf8_is_a_parse_error_not_a_read_error() {
        let mut reader = Cursor::new(&b"\xff\xfe garbage\n{\"action\":\"sd_status\"}\n"[..]);
        let mut line = Vec::new();
        assert!(read_line(&mut reader, &mut line).unwrap());
        assert!(parse_request(&line).is_err());
        assert!(read_line(&mut reader, &mut line).unwrap());
        assert_eq!(parse_request(&line).unwrap(), Request::Status);
    }

    #[test]
    fn written_messages_are_newline_terminated() {
        let mut out = Vec::new();
        write_message(&mut out, &Response::accepted()).unwrap();
        assert_eq!(out, b"{\"ok\":true}\n");
    }
}
