use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::path::Path;

use anyhow::{anyhow, bail};

use crate::control_msg::{Action, Brightness, Request, Response, Status};
use crate::daemon;

/// Connection to a running daemon.
pub struct Client {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl Client {
    pub fn connect(path: impl AsRef<Path>) -> anyhow::Result<Client> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .map_err(|e| anyhow!("cannot connect to {}: {}", path.display(), e))?;
        return Ok(Client {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        });
    }

    pub fn invoke(&mut self, request: &Request) -> anyhow::Result<Response> {
        daemon::write_message(&mut self.writer, request)?;
        daemon::read_message(&mut self.reader)?
            .ok_or_else(|| anyhow!("daemon closed the connection"))
    }

    /// Invokes `action` and turns a refusal into an error.
    pub fn invoke_action(&mut self, action: Action, brightness: Brightness) -> anyhow::Result<()> {
        let response = self.invoke(&action.request(brightness))?;
        if !response.ok {
            bail!(
                "{} refused: {}",
                action,
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        return Ok(());
    }

    pub fn set_brightness(&mut self, brightness: Brightness) -> anyhow::Result<()> {
        self.invoke_action(Action::SetBrightness, brightness)
    }

    pub fn fade_brightness(&mut self, brightness: Brightness) -> anyhow::Result<()> {
        self.invoke_action(Action::FadeBrightness, brightness)
    }

    pub fn status(&mut self) -> anyhow::Result<Status> {
        let response = self.invoke(&Request::Status)?;
        match response.status {
            Some(status) if response.ok => Ok(status),
            _ => bail!(
                "status refused: {}",
                response.error.unwrap_or_else(|| "no status in response".to_string())
            ),
        }
    }
}
