use pocket_random::api::{ApiClient, RawResponse};
use pocket_random::config::Settings;
use pocket_random::credentials::{Credential, CredentialStore, FileCredentialStore};
use pocket_random::items::ItemQuery;
use pocket_random::testing::{console_output, scripted_console, RecordingBrowser, ScriptedTransport};
use pocket_random::ui::{Flow, Session, ACTION_PROMPT};
use pocket_random::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tempfile::tempdir;

const TWO_ITEMS: &str = r#"{
    "status": 1,
    "complete": 1,
    "list": {
        "101": {
            "item_id": "101",
            "resolved_url": "https://example.com/first",
            "resolved_title": "First article",
            "excerpt": "",
            "time_added": "1473020327",
            "word_count": "800",
            "favorite": "0"
        },
        "202": {
            "item_id": "202",
            "resolved_url": "https://example.com/second",
            "resolved_title": "Second article",
            "time_added": "1473020400",
            "word_count": "120",
            "favorite": "1"
        }
    }
}"#;

fn settings_in(dir: &std::path::Path) -> Settings {
    Settings::from_lookup(|_| None, Some(dir.to_path_buf())).unwrap()
}

fn handshake(transport: ScriptedTransport) -> ScriptedTransport {
    transport
        .ok("oauth/request", r#"{"code":"abc123","state":null}"#)
        .ok("oauth/authorize", r#"{"access_token":"tok-1","username":"ada"}"#)
}

#[test]
fn first_run_authorizes_lists_and_quits_on_last_item() {
    let home = tempdir().unwrap();
    let settings = settings_in(home.path());
    let api = ApiClient::with_transport(
        handshake(ScriptedTransport::new()).ok("get", TWO_ITEMS),
        &settings.api_base,
    );
    let mut store = FileCredentialStore::new(&settings.credential_path);
    // API key, Enter after authorizing, then one command per item.
    let mut console = scripted_console("my-key\n\nn\nq\n");
    let mut browser = RecordingBrowser::default();

    let flow = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 100,
        color: false,
    }
    .random(&ItemQuery::default(), &mut StdRng::seed_from_u64(3))
    .unwrap();

    assert_eq!(flow, Flow::Quit);

    let output = console_output(&console);
    assert!(output.contains("Hello ada!"));
    assert!(!output.contains('\x1b'));
    assert!(output.contains("2 items retrieved!"));
    assert!(output.contains("First article"));
    assert!(output.contains("Second article"));
    assert_eq!(output.matches(ACTION_PROMPT).count(), 2);

    let saved = FileCredentialStore::new(&settings.credential_path).load().unwrap();
    assert!(saved.is_complete());
    assert_eq!(saved.username(), Some("ada"));

    let transport = api.transport();
    assert_eq!(transport.calls_to("oauth/request").len(), 1);
    assert_eq!(transport.calls_to("oauth/authorize").len(), 1);
    let get = &transport.calls_to("get")[0];
    assert_eq!(get.params["access_token"], "tok-1");
    assert!(transport.calls_to("send").is_empty());
}

#[test]
fn returning_user_archives_both_items() {
    let home = tempdir().unwrap();
    let settings = settings_in(home.path());
    let mut store = FileCredentialStore::new(&settings.credential_path);
    store
        .save(&Credential {
            api_key: Some("key".into()),
            username: Some("ada".into()),
            user_code: Some("code".into()),
            user_token: Some("token".into()),
        })
        .unwrap();
    let sent = r#"{"status":1,"action_results":[true]}"#;
    let api = ApiClient::with_transport(
        ScriptedTransport::new().ok("get", TWO_ITEMS).ok("send", sent).ok("send", sent),
        &settings.api_base,
    );
    let mut console = scripted_console("a\narchive\n");
    let mut browser = RecordingBrowser::default();

    let flow = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 100,
        color: false,
    }
    .random(&ItemQuery::default(), &mut StdRng::seed_from_u64(11))
    .unwrap();

    assert_eq!(flow, Flow::NextItem);
    let transport = api.transport();
    assert!(transport.calls_to("oauth/request").is_empty());

    let mut archived: Vec<String> = transport
        .calls_to("send")
        .iter()
        .filter_map(|call| call.actions())
        .map(|actions| {
            assert_eq!(actions[0]["action"], json!("archive"));
            actions[0]["item_id"].as_str().unwrap().to_string()
        })
        .collect();
    archived.sort();
    assert_eq!(archived, vec!["101".to_string(), "202".to_string()]);
}

#[test]
fn empty_list_finishes_without_prompting() {
    let home = tempdir().unwrap();
    let settings = settings_in(home.path());
    let api = ApiClient::with_transport(
        handshake(ScriptedTransport::new()).ok("get", r#"{"status":2,"complete":1,"list":[]}"#),
        &settings.api_base,
    );
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = scripted_console("my-key\n\n");
    let mut browser = RecordingBrowser::default();

    let flow = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 100,
        color: false,
    }
    .random(&ItemQuery::default(), &mut StdRng::seed_from_u64(1))
    .unwrap();

    assert_eq!(flow, Flow::NextItem);
    let output = console_output(&console);
    assert!(output.contains("0 items retrieved!"));
    assert!(!output.contains(ACTION_PROMPT));
}

#[test]
fn add_saves_url_and_prints_fields() {
    let home = tempdir().unwrap();
    let settings = settings_in(home.path());
    let api = ApiClient::with_transport(
        handshake(ScriptedTransport::new()).ok(
            "add",
            r#"{"status":1,"item":{
                "item_id":"555",
                "normal_url":"http://example.com",
                "resolved_normal_url":"https://example.com/",
                "title":"Example Domain",
                "excerpt":"This domain is for use in examples."
            }}"#,
        ),
        &settings.api_base,
    );
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = scripted_console("my-key\n\n");
    let mut browser = RecordingBrowser::default();

    let item = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 80,
        color: false,
    }
    .add("http://example.com", None, &[])
    .unwrap();

    assert_eq!(item.id, "555");
    let output = console_output(&console);
    assert!(output.contains("Hello ada!"));
    assert!(output.contains("Item ID: 555"));
    assert!(output.contains("Item URL: https://example.com/"));
    assert!(output.contains("Item Title: Example Domain"));

    let add = &api.transport().calls_to("add")[0];
    assert_eq!(add.params["url"], "http://example.com");
    assert_eq!(add.params["consumer_key"], "my-key");
    assert!(!add.params.contains_key("title"));
}

#[test]
fn rejected_token_exchange_resumes_on_next_run() {
    let home = tempdir().unwrap();
    let settings = settings_in(home.path());

    // First run: the code is granted but the token exchange is refused.
    let api = ApiClient::with_transport(
        ScriptedTransport::new()
            .ok("oauth/request", r#"{"code":"abc123"}"#)
            .respond(
                "oauth/authorize",
                RawResponse {
                    status: 403,
                    x_error: Some("User rejected code.".into()),
                    x_error_code: Some("158".into()),
                    body: String::new(),
                },
            ),
        &settings.api_base,
    );
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = scripted_console("my-key\n\n");
    let mut browser = RecordingBrowser::default();

    let err = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 80,
        color: false,
    }
    .authorize()
    .unwrap_err();

    assert!(matches!(err, Error::Status { status: 403, .. }));
    assert!(err.to_string().contains("X-Error-Code=[158]"));

    // Second run: only the token step is left.
    let api = ApiClient::with_transport(
        ScriptedTransport::new().ok("oauth/authorize", r#"{"access_token":"tok-2","username":"ada"}"#),
        &settings.api_base,
    );
    let mut store = FileCredentialStore::new(&settings.credential_path);
    let mut console = scripted_console("");

    let credential = Session {
        api: &api,
        settings: &settings,
        store: &mut store,
        console: &mut console,
        browser: &mut browser,
        width: 80,
        color: false,
    }
    .authorize()
    .unwrap();

    assert_eq!(credential.user_code(), Some("abc123"));
    assert_eq!(credential.user_token(), Some("tok-2"));
    assert_eq!(api.transport().calls().len(), 1);
}
