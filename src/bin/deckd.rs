use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::info;

use deckbright::args::DaemonArgs;
use deckbright::daemon;
use deckbright::hid::StreamDeck;
use deckbright::panel::Panel;

fn main() -> anyhow::Result<()> {
    let args = DaemonArgs::parse();
    deckbright::logging::init(args.verbose);
    let deck = StreamDeck::open(&args.selector())?;
    info!(model = %deck.model(), protocol = ?deck.model().protocol(), "using {}", deck.describe());
    let handle = deckbright::Handle::new(deck, args.fade.defaults());
    let listener = daemon::bind(&args.unix_socket)?;
    daemon::serve(listener, Arc::new(Mutex::new(handle)))
}
