// Entrypoint for `pocket-add`: save one URL to Pocket.

use clap::Parser;
use pocket_random::api::ApiClient;
use pocket_random::config::Settings;
use pocket_random::credentials::FileCredentialStore;
use pocket_random::telemetry;
use pocket_random::terminal::{color_enabled, terminal_width, SystemBrowser, TerminalConsole};
use pocket_random::ui::Session;

const FALLBACK_WIDTH: usize = 80;

/// Save a URL to your Pocket list.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The URL to save
    url: String,

    /// Title to use instead of the page's own
    #[arg(short, long)]
    title: Option<String>,

    /// Comma-separated tags
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_subscriber("warn")?;

    let settings = Settings::from_env()?;
    let api = ApiClient::from_settings(&settings)?;
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = TerminalConsole::new();
    let mut browser = SystemBrowser;

    let mut session = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: terminal_width(FALLBACK_WIDTH),
        color: color_enabled(),
    };
    session.add(&cli.url, cli.title.as_deref(), &cli.tags)?;
    Ok(())
}
