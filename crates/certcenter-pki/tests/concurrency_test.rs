//! Mutations against one CA never overlap, whether they share a manager or
//! only the lock file path.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, TestCa, creator, subjects};

const SLOW: Duration = Duration::from_millis(150);

fn assert_serialized(mut calls: Vec<Call>) {
    calls.sort_by_key(|c| c.started);
    for pair in calls.windows(2) {
        assert!(
            pair[1].started >= pair[0].finished,
            "{:?} started before {:?} finished",
            pair[1].args,
            pair[0].args
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_on_one_manager_run_one_at_a_time() {
    let ca = TestCa::new();
    let fake = ca.toolchain().with_delay(SLOW);
    let manager = Arc::new(ca.manager(fake.clone()));

    let tasks: Vec<_> = ["a.example.org", "b.example.org", "c.example.org"]
        .into_iter()
        .map(|cn| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager
                    .create_server_certificate(&creator(), 30, &subjects(&[cn]))
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.sort();
    assert_eq!(ids, ["01", "02", "03"]);

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    assert_serialized(calls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn managers_sharing_a_lock_path_exclude_each_other() {
    let ca = TestCa::new();
    let fake = ca.toolchain().with_delay(SLOW);
    let first = Arc::new(ca.manager(fake.clone()));
    let second = Arc::new(ca.manager(fake.clone()));

    let ctx = creator();
    let seed = first
        .create_server_certificate(&ctx, 30, &subjects(&["web.example.org"]))
        .await
        .unwrap();

    let revoke = {
        let first = Arc::clone(&first);
        let id = seed.id.clone();
        tokio::spawn(async move { first.revoke(&creator(), &id).await })
    };
    let create = {
        let second = Arc::clone(&second);
        tokio::spawn(async move {
            second
                .create_server_certificate(&creator(), 30, &subjects(&["api.example.org"]))
                .await
        })
    };

    revoke.await.unwrap().unwrap();
    create.await.unwrap().unwrap();

    let calls = fake.calls();
    assert_eq!(calls.len(), 3);
    assert_serialized(calls);
}
