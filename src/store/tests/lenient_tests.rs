//! Tests for record-level lenient decoding.

use super::Ledger;
use rstest::rstest;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Numbers {
    #[serde(default, deserialize_with = "crate::store::lenient::vec")]
    values: Vec<u32>,
}

#[rstest]
fn malformed_map_entries_are_skipped() -> eyre::Result<()> {
    let ledger: Ledger =
        serde_json::from_str(r#"{"entries": {"good": 3, "bad": "three", "also_good": 4}}"#)?;

    eyre::ensure!(ledger.entries.len() == 2);
    eyre::ensure!(ledger.entries.get("good") == Some(&3));
    eyre::ensure!(!ledger.entries.contains_key("bad"));
    Ok(())
}

#[rstest]
fn malformed_vec_elements_are_skipped() -> eyre::Result<()> {
    let numbers: Numbers = serde_json::from_str(r#"{"values": [1, "x", 3, null]}"#)?;
    eyre::ensure!(numbers.values == vec![1, 3]);
    Ok(())
}

#[rstest]
fn wrong_container_shape_is_an_error() {
    let result = serde_json::from_str::<Ledger>(r#"{"entries": [1, 2]}"#);
    assert!(result.is_err());
}
