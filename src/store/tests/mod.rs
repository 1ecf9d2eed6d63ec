//! Unit tests for snapshot stores.

mod fs_tests;
mod lenient_tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimal snapshot used to exercise store adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Ledger {
    #[serde(default, deserialize_with = "crate::store::lenient::map")]
    entries: BTreeMap<String, u32>,
}
