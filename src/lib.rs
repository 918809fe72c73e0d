// Library root
// -----------
// Clients for the Pocket read-it-later API. The binaries (`main.rs` for
// `pocket-random`, `bin/pocket-add.rs`) are thin wrappers around these
// modules.
//
// Module responsibilities:
// - `auth`: the API key -> request code -> access token handshake.
// - `api`: HTTP interactions with the service, one typed call per endpoint.
// - `credentials`: the persisted credential record and its stores.
// - `config`: endpoints and file locations, from the environment.
// - `items`: saved items, the `get` query and the shuffle.
// - `ui`: the add/browse flows and the per-item action menu.
// - `terminal`: prompts, browser, spinner and terminal width.
// - `format`: truncation and relative dates for display.
// - `telemetry`: tracing subscriber setup.
// - `testing`: test doubles for the transport, console and browser.
pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod format;
pub mod items;
pub mod telemetry;
pub mod terminal;
pub mod testing;
pub mod ui;

pub use error::{Error, Result};
