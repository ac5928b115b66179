use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};

use crate::control_msg::FadeDefaults;
use crate::streamdeck::{DeviceSelector, Model};

pub const DEFAULT_SOCKET: &str = "/tmp/deckbright.sock";

/// Fade defaults for requests that don't carry their own.
#[derive(Args, Debug)]
pub struct FadeArgs {
    /// Duration of a fade in milliseconds.
    #[clap(long, default_value = "10000")]
    pub fade_ms: u64,

    /// Number of brightness steps in a fade (1-250).
    #[clap(long, default_value = "50")]
    pub fade_steps: u32,
}

impl FadeArgs {
    pub fn defaults(&self) -> FadeDefaults {
        FadeDefaults {
            duration: Duration::from_millis(self.fade_ms),
            steps: self.fade_steps,
        }
    }
}

/// Owns a Stream Deck and executes brightness actions sent over a unix socket.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DaemonArgs {
    /// Path to the listening socket of the daemon.
    #[clap(short, long, env = "DECKBRIGHT_SOCKET", default_value = DEFAULT_SOCKET)]
    pub unix_socket: PathBuf,

    /// Only use a device of this model (original, original-v2, mini, xl, mk2, revised-mini).
    #[clap(short, long)]
    pub model: Option<Model>,

    /// Only use the device with this serial number.
    #[clap(short, long)]
    pub serial: Option<String>,

    /// Only use the device at this HID path.
    #[clap(short = 'p', long)]
    pub hid_path: Option<String>,

    #[clap(flatten)]
    pub fade: FadeArgs,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,
}

impl DaemonArgs {
    pub fn selector(&self) -> DeviceSelector {
        DeviceSelector {
            model: self.model,
            serial: self.serial.clone(),
            path: self.hid_path.clone(),
        }
    }
}

/// A debug version of the daemon that logs the reports it would send.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DummyDaemonArgs {
    /// Path to the listening socket of the daemon.
    #[clap(short, long, env = "DECKBRIGHT_SOCKET", default_value = DEFAULT_SOCKET)]
    pub unix_socket: PathBuf,

    /// The model to pretend to be.
    #[clap(short, long, default_value = "mini")]
    pub model: Model,

    #[clap(flatten)]
    pub fade: FadeArgs,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,
}

/// Starts a REST Api to invoke brightness actions
/// via homeassistant or a browser.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Path to the listening socket of the daemon.
    #[clap(short, long, env = "DECKBRIGHT_SOCKET", default_value = DEFAULT_SOCKET)]
    pub daemon_socket: PathBuf,

    /// The listen address to bind to.
    #[clap(short, long, default_value = "localhost:1313")]
    pub bind: String,

    /// A unique identifier for this server instance.
    #[clap(short, long, default_value = "stream-deck")]
    pub instance_name: String,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,
}

/// Interactive shell for invoking brightness actions on the daemon.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ShellArgs {
    /// Path to the listening socket of the daemon.
    #[clap(short, long, env = "DECKBRIGHT_SOCKET", default_value = DEFAULT_SOCKET)]
    pub daemon_socket: PathBuf,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,
}

/// Lists attached Stream Deck devices.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ListArgs {
    /// Print the firmware version of each device.
    #[clap(short, long)]
    pub firmware: bool,

    /// Log at debug level.
    #[clap(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daemon_args_build_selector() {
        let args = DaemonArgs::parse_from(["deckd", "-u", "/tmp/x.sock", "--model", "xl", "--fade-ms", "500"]);
        assert_eq!(args.unix_socket, PathBuf::from("/tmp/x.sock"));
        assert_eq!(args.selector().model, Some(Model::Xl));
        assert_eq!(args.fade.defaults().duration, Duration::from_millis(500));
        assert_eq!(args.fade.defaults().steps, 50);
    }

    #[test]
    fn server_args_defaults() {
        let args = ServerArgs::parse_from(["deck-rest", "-d", "/tmp/y.sock"]);
        assert_eq!(args.bind, "localhost:1313");
        assert_eq!(args.instance_name, "stream-deck");
    }
}
