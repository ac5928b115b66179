use clap::Parser;
use tracing::warn;

use deckbright::args::ListArgs;
use deckbright::hid;
use deckbright::panel::Panel;
use deckbright::streamdeck::DeviceSelector;

fn main() -> anyhow::Result<()> {
    let args = ListArgs::parse();
    deckbright::logging::init(args.verbose);
    let devices = hid::list_devices()?;
    if devices.is_empty() {
        println!("no Stream Deck found");
        return Ok(());
    }
    for device in devices {
        let serial = device.serial.clone().unwrap_or_else(|| "-".to_string());
        if !args.firmware {
            println!("{}\t{}\t{}", device.model, serial, device.path);
            continue;
        }
        let selector = DeviceSelector {
            path: Some(device.path.clone()),
            ..Default::default()
        };
        let firmware = match hid::StreamDeck::open(&selector).and_then(|mut deck| deck.firmware_version()) {
            Ok(version) => version,
            Err(e) => {
                warn!(path = %device.path, "could not read firmware: {}", e);
                "?".to_string()
            }
        };
        println!("{}\t{}\t{}\t{}", device.model, serial, device.path, firmware);
    }
    Ok(())
}
