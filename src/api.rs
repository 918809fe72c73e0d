// API client module: a small blocking HTTP client for the Pocket v3 API.
//
// Every operation is one form-encoded POST to `<api_base><operation>` with
// `X-Accept: application/json`. Structured parameters (the `actions` list of
// `send`) travel JSON-encoded inside a single form field. Credentials are
// injected here so callers never assemble `consumer_key`/`access_token`
// themselves. Any failure is returned as an error and never retried.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::items::{AddedItem, Item, ItemQuery};

/// Form parameters of one request.
pub type Params = BTreeMap<String, String>;

/// What the client needs to know about an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `X-Error` header, if the service set one.
    pub x_error: Option<String>,
    /// `X-Error-Code` header, if the service set one.
    pub x_error_code: Option<String>,
    pub body: String,
}

/// The HTTP exchange, kept behind a trait so the client can be driven
/// without a network.
pub trait Transport: Send + Sync {
    fn post_form(&self, url: &str, form: &Params) -> Result<RawResponse>;
}

/// Real transport backed by a blocking reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        // No deadline: a call waits until the service answers or the
        // connection fails.
        let client = Client::builder()
            .user_agent(concat!("pocket-random/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .map_err(Error::ClientSetup)?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, url: &str, form: &Params) -> Result<RawResponse> {
        let transport_error = |e: reqwest::Error| Error::Transport {
            url: url.to_string(),
            source: Box::new(e),
        };

        let res = self
            .client
            .post(url)
            .header("X-Accept", "application/json")
            .form(form)
            .send()
            .map_err(transport_error)?;

        let header = |name: &str| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let status = res.status().as_u16();
        let x_error = header("X-Error");
        let x_error_code = header("X-Error-Code");
        let body = res.text().map_err(transport_error)?;

        Ok(RawResponse {
            status,
            x_error,
            x_error_code,
            body,
        })
    }
}

/// `oauth/request` response.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestCode {
    pub code: String,
}

/// `oauth/authorize` response.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub username: String,
    pub access_token: String,
}

#[derive(Deserialize)]
struct SendResponse {
    status: i64,
}

#[derive(Deserialize)]
struct AddResponse {
    item: AddedItem,
}

/// Remote action applied to a single item through `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Favorite,
    Archive,
    Delete,
}

impl ItemAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemAction::Favorite => "favorite",
            ItemAction::Archive => "archive",
            ItemAction::Delete => "delete",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            ItemAction::Favorite => "favorited",
            ItemAction::Archive => "archived",
            ItemAction::Delete => "deleted",
        }
    }
}

/// Client for the Pocket API. Holds the transport and the base URL; the
/// credential is passed to each call.
#[derive(Clone)]
pub struct ApiClient<T = HttpTransport> {
    transport: T,
    base_url: String,
}

impl ApiClient<HttpTransport> {
    /// Client talking to `settings.api_base` over HTTP.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(ApiClient::with_transport(HttpTransport::new()?, &settings.api_base))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(transport: T, base_url: &str) -> Self {
        ApiClient {
            transport,
            base_url: base_url.to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url_for(&self, operation: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            operation.trim_start_matches('/')
        )
    }

    /// POST `operation` and return the decoded JSON body.
    ///
    /// `consumer_key` and `access_token` are added whenever the credential
    /// has them, which lets the bootstrap calls go out before a token exists.
    #[instrument(skip(self, credential, params))]
    pub fn call(&self, credential: &Credential, operation: &str, mut params: Params) -> Result<Value> {
        if let Some(key) = credential.api_key() {
            params.insert("consumer_key".into(), key.to_string());
        }
        if let Some(token) = credential.user_token() {
            params.insert("access_token".into(), token.to_string());
        }

        let url = self.url_for(operation);
        let res = self.transport.post_form(&url, &params)?;
        debug!(status = res.status, "response received");

        if res.status != 200 || res.x_error.is_some() {
            return Err(Error::Status {
                url,
                status: res.status,
                x_error: res.x_error,
                x_error_code: res.x_error_code,
            });
        }

        serde_json::from_str(&res.body).map_err(|source| Error::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    fn call_typed<R: DeserializeOwned>(
        &self,
        credential: &Credential,
        operation: &str,
        params: Params,
    ) -> Result<R> {
        let body = self.call(credential, operation, params)?;
        serde_json::from_value(body).map_err(|e| Error::schema(operation, e))
    }

    /// Step two of the handshake: obtain a request code.
    pub fn request_code(&self, credential: &Credential, redirect_uri: &str) -> Result<RequestCode> {
        let params = Params::from([("redirect_uri".to_string(), redirect_uri.to_string())]);
        self.call_typed(credential, "oauth/request", params)
    }

    /// Step three: trade the (now authorized) code for an access token.
    pub fn authorize(&self, credential: &Credential, code: &str) -> Result<Authorization> {
        let params = Params::from([("code".to_string(), code.to_string())]);
        self.call_typed(credential, "oauth/authorize", params)
    }

    /// Fetch items matching `query`, in whatever order the service sends.
    pub fn list_items(&self, credential: &Credential, query: &ItemQuery) -> Result<Vec<Item>> {
        const OPERATION: &str = "get";

        let body = self.call(credential, OPERATION, query.to_params().into_iter().collect())?;
        let list = body
            .get("list")
            .ok_or_else(|| Error::schema(OPERATION, "missing field `list`"))?;

        let entries: Vec<&Value> = match list {
            Value::Object(map) => map.values().collect(),
            // An empty result comes back as `[]` rather than `{}`.
            Value::Array(values) => values.iter().collect(),
            other => {
                return Err(Error::schema(
                    OPERATION,
                    format!("`list` should be an object, found {other}"),
                ))
            }
        };

        entries
            .into_iter()
            .map(|entry| Item::deserialize(entry).map_err(|e| Error::schema(OPERATION, e)))
            .collect()
    }

    /// Apply `action` to one item.
    pub fn send_action(&self, credential: &Credential, action: ItemAction, item_id: &str) -> Result<()> {
        let actions = json!([{ "action": action.as_str(), "item_id": item_id }]);
        let params = Params::from([("actions".to_string(), actions.to_string())]);

        let res: SendResponse = self.call_typed(credential, "send", params)?;
        if res.status != 1 {
            return Err(Error::ActionRejected {
                action: action.as_str().to_string(),
                item_id: item_id.to_string(),
            });
        }
        Ok(())
    }

    /// Save a new URL.
    pub fn add_item(
        &self,
        credential: &Credential,
        url: &str,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<AddedItem> {
        let mut params = Params::from([("url".to_string(), url.to_string())]);
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            params.insert("title".into(), title.to_string());
        }
        if !tags.is_empty() {
            params.insert("tags".into(), tags.join(","));
        }

        let res: AddResponse = self.call_typed(credential, "add", params)?;
        Ok(res.item)
    }
}
