#![allow(unreachable_code)]
#[macro_use]
extern crate rouille;
extern crate serde;

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use deckbright::args::ServerArgs;
use deckbright::control_msg::{invocation, Request, Response};
use deckbright::Client;

#[derive(Serialize, Debug)]
struct AboutResponse {
    version: String,
    instance_name: String,
}

/// Lazily (re)connected link to the daemon.
struct ServerState {
    socket: PathBuf,
    client: Option<Client>,
}

impl ServerState {
    fn new(socket: PathBuf) -> ServerState {
        ServerState { socket, client: None }
    }

    /// Forwards a request, reconnecting once if the daemon went away.
    fn invoke(&mut self, request: &Request) -> anyhow::Result<Response> {
        if let Some(client) = self.client.as_mut() {
            match client.invoke(request) {
                Ok(response) => return Ok(response),
                Err(e) => warn!("lost daemon connection: {:#}", e),
            }
        }
        self.client = None;
        let mut client = Client::connect(&self.socket)?;
        let response = client.invoke(request)?;
        self.client = Some(client);
        Ok(response)
    }
}

fn forward(state: &Mutex<ServerState>, request: &Request) -> rouille::Response {
    let mut state = try_or_400!(state.lock());
    match state.invoke(request) {
        Ok(response) if response.ok => rouille::Response::json(&response),
        Ok(response) => rouille::Response::json(&response).with_status_code(500),
        Err(e) => rouille::Response::text(format!("daemon unavailable: {:#}", e)).with_status_code(503),
    }
}

fn handle(
    request: &rouille::Request,
    server_state: &Mutex<ServerState>,
    instance_name: &str,
    version: &str,
) -> rouille::Response {
    router!(request,
        (GET) (/) => {
            rouille::Response::redirect_302("/status")
        },

        (GET) (/status) => {
            forward(server_state, &Request::Status)
        },

        (GET) (/about) => {
            let about = AboutResponse {
                version: version.to_string(),
                instance_name: instance_name.to_string(),
            };
            rouille::Response::json(&about)
        },

        (POST) (/invoke/{action: String}) => {
            let input = try_or_400!(post_input!(request, {
                brightness: String,
                duration_ms: Option<u64>,
                steps: Option<u32>,
            }));
            info!(%action, ?input, "got '/invoke' input");
            match invocation(&action, &input.brightness) {
                Ok(invoked) => forward(server_state, &invoked.with_fade(input.duration_ms, input.steps)),
                Err(e) => rouille::Response::text(e.to_string()).with_status_code(400),
            }
        },

        (POST) (/reset) => {
            forward(server_state, &Request::Reset)
        },

        _ => rouille::Response::empty_404()
    )
}

fn main() -> anyhow::Result<()> {
    let deckbright_version: &str = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");
    let args = ServerArgs::parse();
    deckbright::logging::init(args.verbose);
    info!("starting server listening on {}", args.bind);
    let server_state = Mutex::new(ServerState::new(args.daemon_socket.clone()));

    rouille::start_server(args.bind.clone(), move |request| {
        let response = handle(request, &server_state, &args.instance_name, deckbright_version);
        info!(method = %request.method(), url = %request.raw_url(), status = response.status_code, "handled request");
        response
    });
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use deckbright::control_msg::FadeDefaults;
    use deckbright::daemon;
    use deckbright::panel::DummyPanel;
    use deckbright::streamdeck::Model;

    fn post_form(url: &str, body: &str) -> rouille::Request {
        return rouille::Request::fake_http(
            "POST",
            url,
            vec![(
                "Content-Type".to_owned(),
                "application/x-www-form-urlencoded".to_owned(),
            )],
            body.as_bytes().to_vec(),
        );
    }

    fn call(state: &Mutex<ServerState>, request: &rouille::Request) -> rouille::Response {
        return handle(request, state, "test-deck", "0.0.0");
    }

    /// State pointing at a socket nobody listens on.
    fn detached() -> (tempfile::TempDir, Mutex<ServerState>) {
        let dir = tempfile::tempdir().unwrap();
        let state = Mutex::new(ServerState::new(dir.path().join("missing.sock")));
        return (dir, state);
    }

    #[test]
    fn root_redirects_to_status() {
        let (_dir, state) = detached();
        let request = rouille::Request::fake_http("GET", "/", vec![], vec![]);
        assert_eq!(call(&state, &request).status_code, 302);
    }

    #[test]
    fn unknown_action_is_bad_request() {
        let (_dir, state) = detached();
        let response = call(&state, &post_form("/invoke/sd_blink", "brightness=40"));
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn bad_brightness_is_bad_request() {
        let (_dir, state) = detached();
        let response = call(&state, &post_form("/invoke/sd_set_brightness", "brightness=abc"));
        assert_eq!(response.status_code, 400);
        let response = call(&state, &post_form("/invoke/sd_fade_brightness", "brightness="));
        assert_eq!(response.status_code, 400);
        let response = call(&state, &post_form("/invoke/sd_set_brightness", "level=40"));
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn missing_daemon_is_unavailable() {
        let (_dir, state) = detached();
        let response = call(&state, &post_form("/invoke/sd_set_brightness", "brightness=40"));
        assert_eq!(response.status_code, 503);
        let response = call(&state, &post_form("/reset", ""));
        assert_eq!(response.status_code, 503);
        let status = rouille::Request::fake_http("GET", "/status", vec![], vec![]);
        assert_eq!(call(&state, &status).status_code, 503);
    }

    #[test]
    fn unknown_route_is_not_found() {
        let (_dir, state) = detached();
        let request = rouille::Request::fake_http("GET", "/brightness", vec![], vec![]);
        assert_eq!(call(&state, &request).status_code, 404);
    }

    #[test]
    fn invoke_reaches_running_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("deck.sock");
        let deck = deckbright::Handle::new(DummyPanel::new(Model::Mini), FadeDefaults::default());
        let listener = daemon::bind(&socket).unwrap();
        thread::spawn(move || daemon::serve(listener, Arc::new(Mutex::new(deck))));
        let state = Mutex::new(ServerState::new(socket));

        let response = call(&state, &post_form("/invoke/sd_set_brightness", "brightness=40"));
        assert_eq!(response.status_code, 200);
        let response = call(&state, &post_form("/invoke/sd_fade_brightness", "brightness=80&duration_ms=10&steps=2"));
        assert_eq!(response.status_code, 200);
        let request = rouille::Request::fake_http("GET", "/status", vec![], vec![]);
        assert_eq!(call(&state, &request).status_code, 200);
    }
}
