// UI layer: the two user-facing flows (add a URL, browse random items) and
// the per-item action menu. Terminal I/O goes through `Console`/`Browser`
// so the flows can be driven from tests.

use chrono::{DateTime, Utc};
use crossterm::style::{style, Color, Stylize};
use rand::Rng;
use tracing::info;

use crate::api::{ApiClient, ItemAction, Transport};
use crate::auth::{ensure_authorized, Handshake};
use crate::config::Settings;
use crate::credentials::{Credential, CredentialStore};
use crate::error::Result;
use crate::format::{relative_date, truncate};
use crate::items::{shuffle, AddedItem, Item, ItemQuery};
use crate::terminal::{with_spinner, Browser, Console};

pub const ACTION_PROMPT: &str =
    "Action [open(o), favorite(f), archive(a), delete(d), next(n), quit(q), help(h)]";

const HELP: &[&str] = &[
    "  o, open       open the item in the browser",
    "  f, favorite   mark the item as favorite",
    "  a, archive    archive the item and move on",
    "  d, delete     delete the item and move on",
    "  n, next       move on without changing anything",
    "  q, quit       stop here",
    "  h, help       show this list",
];

/// One command of the per-item menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Open,
    Help,
    Favorite,
    Archive,
    Delete,
    Next,
    Quit,
}

impl Command {
    /// Parse one line of operator input; `None` for anything unrecognized.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "o" | "open" => Some(Command::Open),
            "h" | "help" | "?" => Some(Command::Help),
            "f" | "fav" | "favorite" => Some(Command::Favorite),
            "a" | "archive" => Some(Command::Archive),
            "d" | "delete" => Some(Command::Delete),
            "n" | "next" => Some(Command::Next),
            "q" | "quit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// What to do once the menu for an item is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    NextItem,
    Quit,
}

/// The collaborators every flow works with.
pub struct Session<'a, T, S, C, B> {
    pub api: &'a ApiClient<T>,
    pub settings: &'a Settings,
    pub store: &'a mut S,
    pub console: &'a mut C,
    pub browser: &'a mut B,
    /// Terminal width used for truncation.
    pub width: usize,
    /// Whether output may carry ANSI colors.
    pub color: bool,
}

impl<T, S, C, B> Session<'_, T, S, C, B>
where
    T: Transport,
    S: CredentialStore,
    C: Console,
    B: Browser,
{
    /// Complete the handshake if needed and greet the operator.
    pub fn authorize(&mut self) -> Result<Credential> {
        let credential = ensure_authorized(
            &mut *self.store,
            Handshake {
                api: self.api,
                settings: self.settings,
                console: &mut *self.console,
                browser: &mut *self.browser,
            },
        )?;
        let greeting = format!("Hello {}!", credential.username().unwrap_or_default());
        self.console.println(&paint(&greeting, Color::Yellow, self.color))?;
        Ok(credential)
    }

    /// Fetch items, shuffle them and walk through them one by one.
    pub fn random<R: Rng + ?Sized>(&mut self, query: &ItemQuery, rng: &mut R) -> Result<Flow> {
        let credential = self.authorize()?;

        let api = self.api;
        let mut items = with_spinner("Retrieving items from Pocket...", || {
            api.list_items(&credential, query)
        })?;
        self.console
            .println(&format!("{} items retrieved!", items.len()))?;

        shuffle(&mut items, rng);

        for item in &items {
            self.console.println("")?;
            for line in render_item(item, self.width, Utc::now(), self.color) {
                self.console.println(&line)?;
            }
            if interact_on_item(self.api, &credential, &mut *self.console, &mut *self.browser, item)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::NextItem)
    }

    /// Save `url` and print what the service made of it.
    pub fn add(&mut self, url: &str, title: Option<&str>, tags: &[String]) -> Result<AddedItem> {
        let credential = self.authorize()?;

        let api = self.api;
        let item = with_spinner("Saving item to Pocket ...", || {
            api.add_item(&credential, url, title, tags)
        })?;
        info!(item_id = %item.id, "item added");

        for line in render_added_item(&item, self.width) {
            self.console.println(&line)?;
        }
        Ok(item)
    }
}

/// Prompt for commands on `item` until one of them leaves the menu.
pub fn interact_on_item<T, C, B>(
    api: &ApiClient<T>,
    credential: &Credential,
    console: &mut C,
    browser: &mut B,
    item: &Item,
) -> Result<Flow>
where
    T: Transport,
    C: Console,
    B: Browser,
{
    loop {
        let input = console.read_line(ACTION_PROMPT)?;
        let Some(command) = Command::parse(&input) else {
            continue;
        };

        match command {
            Command::Open => browser.open(&item.resolved_url),
            Command::Help => {
                for line in HELP {
                    console.println(line)?;
                }
            }
            Command::Favorite => apply(api, credential, console, ItemAction::Favorite, item)?,
            Command::Archive => {
                apply(api, credential, console, ItemAction::Archive, item)?;
                return Ok(Flow::NextItem);
            }
            Command::Delete => {
                apply(api, credential, console, ItemAction::Delete, item)?;
                return Ok(Flow::NextItem);
            }
            Command::Next => return Ok(Flow::NextItem),
            Command::Quit => return Ok(Flow::Quit),
        }
    }
}

fn apply<T: Transport, C: Console>(
    api: &ApiClient<T>,
    credential: &Credential,
    console: &mut C,
    action: ItemAction,
    item: &Item,
) -> Result<()> {
    api.send_action(credential, action, &item.id)?;
    console.println(&format!("Item #{} {} :-)", item.id, action.past_tense()))
}

fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        style(text).with(color).to_string()
    } else {
        text.to_string()
    }
}

/// The three-line block shown above the action prompt.
pub fn render_item(item: &Item, width: usize, now: DateTime<Utc>, color: bool) -> Vec<String> {
    let id = format!("[#{}]", item.id);
    let title_width = width.saturating_sub(id.chars().count() + "\"\" ".len());
    let title = format!("\"{}\"", truncate(&item.title, title_width));
    let url = truncate(&item.resolved_url, width);

    let mut details = format!("Added {}", relative_date(item.added_at, now));
    if item.word_count > 0 {
        details.push_str(&format!(", {} words", item.word_count));
    }
    if item.favorite {
        details.push_str(", favorite");
    }

    vec![
        format!("{} {}", paint(&id, Color::Yellow, color), paint(&title, Color::White, color)),
        paint(&url, Color::Green, color),
        paint(&details, Color::Blue, color),
    ]
}

/// `Prefix: value` lines describing a freshly added item.
pub fn render_added_item(item: &AddedItem, width: usize) -> Vec<String> {
    [
        ("Item ID", item.id.as_str()),
        ("Item URL", item.resolved_url.as_str()),
        ("Item Title", item.title.as_str()),
        ("Item Excerpt", item.excerpt.as_str()),
    ]
    .into_iter()
    .map(|(prefix, value)| {
        let room = width.saturating_sub(prefix.len() + ": ".len() + 1);
        format!("{prefix}: {}", truncate(value, room))
    })
    .collect()
}
