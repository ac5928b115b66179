use std::sync::{Arc, Mutex};

use clap::Parser;

use deckbright::args::DummyDaemonArgs;
use deckbright::daemon;
use deckbright::panel::DummyPanel;

/// A debug version of deckd that only logs the reports it would send.
fn main() -> anyhow::Result<()> {
    let args = DummyDaemonArgs::parse();
    deckbright::logging::init(args.verbose);
    let handle = deckbright::Handle::new(DummyPanel::new(args.model), args.fade.defaults());
    let listener = daemon::bind(&args.unix_socket)?;
    daemon::serve(listener, Arc::new(Mutex::new(handle)))
}
