//! Shared fixtures for this crate's unit tests

use std::ops::Range;
use std::sync::Arc;

use gallery_auth::testing::{RecordingPersistence, ScriptedTransport};
use gallery_auth::{AccessGuard, CredentialState, IdentityRecord, OAuthMaterial, PLACEBO_PATH};
use serde_json::{Value, json};

pub(crate) const REDIRECT_URI: &str = "http://localhost/callback";

/// Guard holding a valid token pair whose probe always succeeds.
pub(crate) fn authorized_guard(transport: Arc<ScriptedTransport>) -> AccessGuard {
    transport.repeat(PLACEBO_PATH, 200, json!({"status": "success"}));
    guard_with(transport, None, Some("at_1"), Some("rt_1"))
}

pub(crate) fn guard_with(
    transport: Arc<ScriptedTransport>,
    code: Option<&str>,
    access: Option<&str>,
    refresh: Option<&str>,
) -> AccessGuard {
    let state = CredentialState::new(
        "deviantart",
        IdentityRecord {
            client_id: "1234".into(),
            client_secret: "s3cret".into(),
            oauth: OAuthMaterial {
                code: code.map(String::from),
                access_token: access.map(String::from),
                refresh_token: refresh.map(String::from),
            },
        },
        Arc::new(RecordingPersistence::default()),
    );
    AccessGuard::new(state, transport, REDIRECT_URI)
}

/// A listing page whose records are `{"deviationid": "d<i>"}` for `ids`.
pub(crate) fn page(ids: Range<usize>, has_more: bool, next_offset: Option<u64>) -> Value {
    let results: Vec<Value> = ids.map(|i| json!({"deviationid": format!("d{i}")})).collect();
    json!({
        "results": results,
        "has_more": has_more,
        "next_offset": next_offset,
    })
}
