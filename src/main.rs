// Entrypoint for `pocket-random`: shuffle saved items and act on them one
// at a time.
// - Keeps `main` small: build the collaborators and hand them to the UI.
// - Returns `anyhow::Result` so any fatal error ends the process non-zero
//   with its message on stderr.

use clap::Parser;
use pocket_random::api::ApiClient;
use pocket_random::config::Settings;
use pocket_random::credentials::FileCredentialStore;
use pocket_random::items::{ItemQuery, ItemState};
use pocket_random::telemetry;
use pocket_random::terminal::{color_enabled, terminal_width, SystemBrowser, TerminalConsole};
use pocket_random::ui::Session;

const FALLBACK_WIDTH: usize = 100;

/// Randomly pick items from your Pocket list and open, archive or delete them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// How many items to fetch (0 fetches all of them)
    #[arg(short, long, default_value_t = 10)]
    count: u32,

    /// Which items to fetch
    #[arg(short, long, value_enum, default_value_t = ItemState::Unread)]
    state: ItemState,

    /// Only fetch favorites
    #[arg(short, long)]
    favorites: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_subscriber("warn")?;

    let settings = Settings::from_env()?;
    let api = ApiClient::from_settings(&settings)?;
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = TerminalConsole::new();
    let mut browser = SystemBrowser;

    let query = ItemQuery {
        count: cli.count,
        state: cli.state,
        favorites_only: cli.favorites,
    };

    let mut session = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: terminal_width(FALLBACK_WIDTH),
        color: color_enabled(),
    };
    // Quitting early and running out of items both end with exit code 0.
    session.random(&query, &mut rand::thread_rng())?;
    Ok(())
}
