// Saved items as the client sees them, plus the query used to fetch them.

use std::fmt;

use clap::ValueEnum;
use rand::Rng;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// One saved bookmark.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "RawItem")]
pub struct Item {
    pub id: String,
    pub resolved_url: String,
    pub title: String,
    pub excerpt: String,
    pub added_at: i64,
    pub word_count: u64,
    pub favorite: bool,
}

// Wire shape of an entry in the `get` response's `list`.
#[derive(Deserialize)]
struct RawItem {
    item_id: String,
    resolved_url: String,
    #[serde(default)]
    resolved_title: Option<String>,
    #[serde(default)]
    given_title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default, deserialize_with = "loose_integer")]
    time_added: i64,
    #[serde(default, deserialize_with = "loose_integer")]
    word_count: i64,
    #[serde(default, deserialize_with = "loose_flag")]
    favorite: bool,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let title = [raw.resolved_title, raw.given_title]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or_default();
        Item {
            id: raw.item_id,
            resolved_url: raw.resolved_url,
            title,
            excerpt: raw.excerpt.unwrap_or_default(),
            added_at: raw.time_added,
            word_count: u64::try_from(raw.word_count).unwrap_or(0),
            favorite: raw.favorite,
        }
    }
}

/// The item echoed back by `add`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "RawAddedItem")]
pub struct AddedItem {
    pub id: String,
    pub resolved_url: String,
    pub title: String,
    pub excerpt: String,
}

#[derive(Deserialize)]
struct RawAddedItem {
    item_id: String,
    #[serde(default)]
    resolved_normal_url: Option<String>,
    #[serde(default)]
    normal_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
}

impl From<RawAddedItem> for AddedItem {
    fn from(raw: RawAddedItem) -> Self {
        AddedItem {
            id: raw.item_id,
            resolved_url: raw
                .resolved_normal_url
                .filter(|u| !u.is_empty())
                .or(raw.normal_url)
                .unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            excerpt: raw.excerpt.unwrap_or_default(),
        }
    }
}

// The service sends numbers as decimal strings; accept real numbers too.
fn loose_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(i64),
        Text(String),
        Null(()),
    }

    match Loose::deserialize(deserializer)? {
        Loose::Number(n) => Ok(n),
        Loose::Null(()) => Ok(0),
        Loose::Text(s) if s.trim().is_empty() => Ok(0),
        Loose::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, found {s:?}"))),
    }
}

// `favorite` arrives as "0"/"1"; decode it into a real bool.
fn loose_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(i64),
        Text(String),
        Null(()),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Null(()) => Ok(false),
        Flag::Number(0) => Ok(false),
        Flag::Number(1) => Ok(true),
        Flag::Text(s) if s == "0" || s.is_empty() => Ok(false),
        Flag::Text(s) if s == "1" => Ok(true),
        Flag::Number(n) => Err(de::Error::custom(format!("expected 0 or 1, found {n}"))),
        Flag::Text(s) => Err(de::Error::custom(format!("expected \"0\" or \"1\", found {s:?}"))),
    }
}

/// Which part of the list to fetch.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemState {
    #[default]
    Unread,
    Archive,
    All,
}

impl ItemState {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemState::Unread => "unread",
            ItemState::Archive => "archive",
            ItemState::All => "all",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a `get` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    /// Maximum number of items; 0 fetches everything.
    pub count: u32,
    pub state: ItemState,
    pub favorites_only: bool,
}

impl Default for ItemQuery {
    fn default() -> Self {
        ItemQuery {
            count: 10,
            state: ItemState::Unread,
            favorites_only: false,
        }
    }
}

impl ItemQuery {
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("detailType".to_string(), "simple".to_string()),
            ("state".to_string(), self.state.as_str().to_string()),
        ];
        if self.count > 0 {
            params.push(("count".into(), self.count.to_string()));
        }
        if self.favorites_only {
            params.push(("favorite".into(), "1".into()));
        }
        params
    }
}

/// Fisher-Yates shuffle in place.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
