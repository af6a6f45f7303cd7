use std::sync::{Arc, Mutex};

use rstest::*;

use crate::core::client::lifecycle::CommitHooks;

#[rstest]
#[tokio::test]
async fn hooks_run_once_in_registration_order() {
    let hooks = CommitHooks::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    for name in ["release lease", "notify"] {
        let calls = calls.clone();
        hooks.register(move || async move { calls.lock().unwrap().push(name) });
    }
    assert_eq!(hooks.len(), 2);

    hooks.run().await;
    hooks.run().await;

    assert!(hooks.is_empty());
    assert_eq!(*calls.lock().unwrap(), vec!["release lease", "notify"]);
}

#[rstest]
#[tokio::test]
async fn empty_hooks_run_is_a_no_op() {
    let hooks = CommitHooks::default();
    hooks.run().await;
    assert_eq!(format!("{hooks:?}"), "CommitHooks { pending: 0 }");
}
