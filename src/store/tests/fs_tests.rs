//! Tests for the JSON file snapshot store.

#![expect(
    clippy::expect_used,
    reason = "Test fixtures use expect for setup failures"
)]

use super::Ledger;
use crate::store::{SnapshotStore, StoreError, adapters::StateDir};
use camino::Utf8PathBuf;
use eyre::eyre;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;
use tempfile::TempDir;

struct Workspace {
    _temp: TempDir,
    state: StateDir,
}

#[fixture]
fn workspace() -> Workspace {
    let temp = TempDir::new().expect("temporary directory");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp path");
    let state = StateDir::open(&root, ".agent_coordination").expect("state directory");
    Workspace { _temp: temp, state }
}

#[rstest]
fn missing_document_reads_as_default(workspace: Workspace) -> eyre::Result<()> {
    let store = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));
    eyre::ensure!(store.read()? == Ledger::default());
    Ok(())
}

#[rstest]
fn update_persists_document_with_timestamp(workspace: Workspace) -> eyre::Result<()> {
    let store = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));

    store.update(|ledger| {
        ledger.entries.insert("alpha".to_owned(), 7);
    })?;

    let raw = workspace.state.dir().read_to_string("ledger.json")?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    eyre::ensure!(value.get("updated_at").is_some(), "updated_at missing");
    eyre::ensure!(value["entries"]["alpha"] == 7);

    let reopened = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));
    eyre::ensure!(reopened.read()?.entries.get("alpha") == Some(&7));
    Ok(())
}

#[rstest]
fn unchanged_snapshot_is_not_rewritten(workspace: Workspace) -> eyre::Result<()> {
    let store = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));

    store.update(|ledger| ledger.entries.len())?;

    eyre::ensure!(
        workspace.state.dir().read_to_string("ledger.json").is_err(),
        "read-only update should not create the document"
    );
    Ok(())
}

#[rstest]
fn temp_file_does_not_survive_write(workspace: Workspace) -> eyre::Result<()> {
    let store = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));
    store.update(|ledger| {
        ledger.entries.insert("beta".to_owned(), 1);
    })?;

    let names = workspace
        .state
        .dir()
        .entries()?
        .map(|entry| entry.and_then(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()?;
    eyre::ensure!(!names.iter().any(|name| name.ends_with(".tmp")));
    Ok(())
}

#[rstest]
fn unparsable_document_fails_loudly(workspace: Workspace) -> eyre::Result<()> {
    workspace.state.dir().write("ledger.json", "{not json")?;
    let store = workspace
        .state
        .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock));

    match store.read() {
        Err(StoreError::Corrupt { document, .. }) => {
            eyre::ensure!(document == "ledger.json");
            Ok(())
        }
        other => Err(eyre!("expected corrupt document error, got {other:?}")),
    }
}

#[rstest]
fn concurrent_updates_are_not_lost(workspace: Workspace) -> eyre::Result<()> {
    let store = Arc::new(
        workspace
            .state
            .document::<Ledger, _>("ledger.json", Arc::new(DefaultClock)),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..10 {
                    shared
                        .update(|ledger| {
                            *ledger.entries.entry("counter".to_owned()).or_insert(0) += 1;
                        })
                        .expect("update should succeed");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| eyre!("worker thread panicked"))?;
    }

    eyre::ensure!(store.read()?.entries.get("counter") == Some(&80));
    Ok(())
}
