use std::io::Write;

use clap::Parser;

use deckbright::args::ShellArgs;
use deckbright::shell::{self, ShellCommand};

macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Ok(val) => val,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        }
    };
}

/// A shell for interactive debugging.
fn main() -> anyhow::Result<()> {
    let args = ShellArgs::parse();
    deckbright::logging::init(args.verbose);
    let mut client = deckbright::Client::connect(&args.daemon_socket)?;
    let mut input = String::new();
    loop {
        print!("deck> ");
        std::io::stdout().flush()?;
        input.clear();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let command = match skip_fail!(shell::parse_line(&input)) {
            Some(command) => command,
            None => continue,
        };
        let request = match command {
            ShellCommand::Help => {
                println!("{}", shell::HELP);
                continue;
            }
            ShellCommand::Quit => break,
            ShellCommand::Invoke(request) => request,
        };
        let response = client.invoke(&request)?;
        match (response.ok, response.status, response.error) {
            (true, Some(status), _) => println!("{}", serde_json::to_string_pretty(&status)?),
            (true, None, _) => println!("ok"),
            (false, _, error) => println!("error: {}", error.unwrap_or_default()),
        }
    }
    Ok(())
}
