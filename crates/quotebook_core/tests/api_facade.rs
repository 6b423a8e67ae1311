mod common;

use common::{remote_quote, FlakyStore, ScriptedRemote};
use quotebook_core::{
    ErrorKind, QuoteFilter, QuotebookApi, QuotebookConfig, RemoteError, SessionStore,
    SyncOutcome,
};
use std::sync::Arc;

fn api_with(remote: ScriptedRemote) -> (QuotebookApi, Arc<ScriptedRemote>) {
    let remote = Arc::new(remote);
    let (api, _) = QuotebookApi::with_parts(Arc::new(SessionStore::new()), remote.clone());
    (api, remote)
}

#[test]
fn add_quote_reports_success_and_validation() {
    let (api, _) = api_with(ScriptedRemote::returning(Vec::new()));

    let added = api.add_quote("Stay hungry", "Motivation");
    assert!(added.ok);
    assert_eq!(added.kind, None);
    assert_eq!(added.count, 1);
    assert_eq!(added.quote.map(|q| q.text), Some("Stay hungry".to_string()));

    let rejected = api.add_quote("", "Motivation");
    assert!(!rejected.ok);
    assert_eq!(rejected.kind, Some(ErrorKind::Validation));
}

#[test]
fn add_quote_flags_unsaved_change() {
    let store = Arc::new(FlakyStore::new());
    let (api, _) = QuotebookApi::with_parts(
        store.clone(),
        Arc::new(ScriptedRemote::returning(Vec::new())),
    );
    store.set_fail_writes(true);

    let response = api.add_quote("Unsaved", "Life");

    assert!(response.ok);
    assert_eq!(response.kind, Some(ErrorKind::Write));
    assert_eq!(response.count, 1);
    let quote = response.quote.unwrap();
    assert_eq!(quote.text, "Unsaved");
    assert!(api.visible_quotes(&QuoteFilter::All).contains(&quote));
}

#[test]
fn import_json_counts_unsaved_quotes() {
    let store = Arc::new(FlakyStore::new());
    let (api, _) = QuotebookApi::with_parts(
        store.clone(),
        Arc::new(ScriptedRemote::returning(Vec::new())),
    );
    let before = api.visible_quotes(&QuoteFilter::All).len();
    store.set_fail_writes(true);

    let response = api.import_json(
        r#"[{"text":"a","category":"b"},{"text":"c","category":"d"},{"text":""}]"#,
    );

    assert!(response.ok);
    assert_eq!(response.kind, Some(ErrorKind::Write));
    assert_eq!(response.count, 2);
    assert_eq!(api.visible_quotes(&QuoteFilter::All).len(), before + 2);
}

#[test]
fn select_filter_drives_visible_quotes_and_random() {
    let (api, _) = api_with(ScriptedRemote::returning(Vec::new()));
    api.add_quote("one", "Work");
    api.add_quote("two", "Work");

    let response = api.select_filter("Work");
    assert!(response.ok);
    assert_eq!(response.count, 2);
    assert_eq!(api.selected_filter(), QuoteFilter::Category("Work".to_string()));
    assert!(api
        .visible_quotes_for_selection()
        .iter()
        .all(|q| q.category == "Work"));

    for _ in 0..10 {
        let shown = api.show_random();
        assert!(shown.ok);
        assert_eq!(shown.quote.map(|q| q.category), Some("Work".to_string()));
    }

    api.select_filter("all");
    assert_eq!(api.visible_quotes_for_selection().len(), 5);
}

#[test]
fn show_random_on_empty_selection_reports_empty_collection() {
    let (api, _) = api_with(ScriptedRemote::returning(Vec::new()));
    api.select_filter("Nobody");

    let response = api.show_random();

    assert!(!response.ok);
    assert_eq!(response.kind, Some(ErrorKind::EmptyCollection));
    assert!(api.last_displayed().is_none());
}

#[test]
fn last_displayed_tracks_the_session() {
    let (api, _) = api_with(ScriptedRemote::returning(Vec::new()));
    assert!(api.last_displayed().is_none());

    let shown = api.show_random().quote.unwrap();
    assert_eq!(api.last_displayed(), Some(shown));

    api.collection().replace_all(Vec::new()).unwrap();
    assert!(api.last_displayed().is_none());
}

#[test]
fn import_and_export_go_through_envelopes() {
    let (api, _) = api_with(ScriptedRemote::returning(Vec::new()));

    let response = api.import_json(r#"[{"text":"a","category":"b"},{"nope":1}]"#);
    assert!(response.ok);
    assert_eq!(response.count, 1);

    let response = api.import_json("not json");
    assert!(!response.ok);
    assert_eq!(response.kind, Some(ErrorKind::Format));

    let exported = api.export_json().unwrap();
    assert!(exported.contains("\"category\": \"b\""));
}

#[tokio::test]
async fn request_sync_updates_categories_and_status() {
    let (api, remote) = api_with(ScriptedRemote::returning(vec![
        remote_quote(1, "p", "Server"),
        remote_quote(2, "q", "Server"),
    ]));
    let mut changes = api.subscribe();
    changes.borrow_and_update();
    assert_eq!(api.sync_state().status_text(), "Not synced yet");

    assert_eq!(api.request_sync().await, SyncOutcome::ConflictResolved);
    assert_eq!(api.categories(), vec!["Server".to_string()]);
    assert!(changes.has_changed().unwrap());
    assert!(api.sync_state().last_conflict);

    remote.set_result(Err(RemoteError::Transport("offline".to_string())));
    assert!(matches!(api.request_sync().await, SyncOutcome::Failed(_)));
    assert_eq!(api.visible_quotes(&QuoteFilter::All).len(), 2);
    assert_eq!(api.sync_state().status_text(), "Sync failed");
}

#[test]
fn open_wires_sqlite_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = QuotebookConfig {
        db_path: dir.path().join("quotes.sqlite3"),
        ..QuotebookConfig::default()
    };

    let (api, report) = QuotebookApi::open(&config).unwrap();
    assert!(report.persist_error.is_none());
    api.add_quote("durable", "Disk");
    drop(api);

    let (reopened, _) = QuotebookApi::open(&config).unwrap();
    assert!(reopened
        .visible_quotes(&QuoteFilter::Category("Disk".to_string()))
        .iter()
        .any(|q| q.text == "durable"));
}
