// Credential bootstrap: API key -> request code -> access token.
//
// Each step runs only when its field is still empty and is persisted as
// soon as it completes, so an interrupted run picks up where it stopped.

use tracing::info;
use url::Url;

use crate::api::{ApiClient, Transport};
use crate::config::Settings;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{Error, Result};
use crate::terminal::{Browser, Console};

/// Everything the handshake needs besides the store.
pub struct Handshake<'a, T, C, B> {
    pub api: &'a ApiClient<T>,
    pub settings: &'a Settings,
    pub console: &'a mut C,
    pub browser: &'a mut B,
}

/// Load the credential record and complete whatever part of the handshake
/// is missing. Returns the fully populated record.
pub fn ensure_authorized<T, S, C, B>(store: &mut S, handshake: Handshake<'_, T, C, B>) -> Result<Credential>
where
    T: Transport,
    S: CredentialStore,
    C: Console,
    B: Browser,
{
    let Handshake {
        api,
        settings,
        console,
        browser,
    } = handshake;

    let mut credential = store.load()?;

    if credential.api_key().is_none() {
        request_api_key(&mut credential, settings, console, browser)?;
        store.save(&credential)?;
    }

    if credential.user_code().is_none() {
        request_user_code(&mut credential, api, settings, console, browser)?;
        store.save(&credential)?;
    }

    if credential.user_token().is_none() {
        request_user_token(&mut credential, api, console)?;
        store.save(&credential)?;
    }

    Ok(credential)
}

fn request_api_key<C: Console, B: Browser>(
    credential: &mut Credential,
    settings: &Settings,
    console: &mut C,
    browser: &mut B,
) -> Result<()> {
    console.println(&format!(
        "No API key available. Get one on {}",
        settings.developer_page
    ))?;
    browser.open(&settings.developer_page);

    let key = console.read_line("Enter your API key")?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::MissingApiKey);
    }

    credential.api_key = Some(key.to_string());
    info!("API key stored");
    Ok(())
}

fn request_user_code<T: Transport, C: Console, B: Browser>(
    credential: &mut Credential,
    api: &ApiClient<T>,
    settings: &Settings,
    console: &mut C,
    browser: &mut B,
) -> Result<()> {
    let code = api.request_code(credential, &settings.redirect_uri)?.code;
    console.println(&format!("OAuth code: {code}"))?;

    let authorization_url = authorization_url(settings, &code)?;
    console.println(&format!("Please authorize this app on {authorization_url}"))?;
    browser.open(&authorization_url);

    console.read_line("Press Enter to continue")?;

    credential.user_code = Some(code);
    info!("request code stored");
    Ok(())
}

fn request_user_token<T: Transport, C: Console>(
    credential: &mut Credential,
    api: &ApiClient<T>,
    console: &mut C,
) -> Result<()> {
    let code = credential.user_code().unwrap_or_default().to_string();
    let authorization = api.authorize(credential, &code)?;
    console.println(&format!("Username: {}", authorization.username))?;

    credential.username = Some(authorization.username);
    credential.user_token = Some(authorization.access_token);
    info!("access token stored");
    Ok(())
}

/// Page where the operator approves the request code.
pub fn authorization_url(settings: &Settings, code: &str) -> Result<String> {
    let url = Url::parse_with_params(
        &settings.authorize_page,
        [("request_token", code), ("redirect_uri", settings.redirect_uri.as_str())],
    )
    .map_err(|e| Error::schema("oauth/request", format!("cannot build authorization URL: {e}")))?;
    Ok(url.into())
}
