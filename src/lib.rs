// High-level overview:
//
// Protocol:                HID feature reports            domain socket (json lines)          HTTP / terminal
// Library Concept:  hardware <-----------------> panel+fader <------------------------> client <----------------> user
//
// Implementing Binary:                          deckd                                deck-rest        homeassistant
//                                               deckd-dummy                          debug-shell      actual human

pub mod args;
pub mod client;
pub mod control_msg;
pub mod daemon;
pub mod deckbright_api;
pub mod error;
pub mod fader;
#[cfg(feature = "hid")]
pub mod hid;
pub mod logging;
pub mod panel;
pub mod shell;
pub mod streamdeck;

pub use client::Client;
pub use control_msg::{Action, Brightness, Request, Response, Status};
pub use deckbright_api::*;
