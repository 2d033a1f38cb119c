use crate::client::ProviderResult;
use crate::types::{CheckResult, FileEntry};

/// Turns one provider answer into the public result shape.
///
/// A successful answer with an empty list is reported as a listing with
/// `exists: false`, not as an error.
pub fn map_result(result: ProviderResult) -> CheckResult {
    match result {
        Ok(payload) => CheckResult::listing(
            payload
                .into_entries()
                .into_iter()
                .map(FileEntry::from)
                .collect(),
        ),
        Err(e) => CheckResult::failed(e.to_string()),
    }
}
