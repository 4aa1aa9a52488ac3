#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, clippy::items_after_statements, unreachable_pub, clippy::similar_names)]
use common::{TestApp, thread_with};
use std::collections::HashSet;
mod common;

#[tokio::test]
async fn test_strangers_have_no_thread() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    assert!(thread_with(&app.threads(&alice).await, &bob).is_none());
    assert!(app.between(&alice, &bob).await.is_empty());
}

#[tokio::test]
async fn test_first_message_opens_thread_for_both() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user_with_role("bob", "company").await;

    app.send_message(&alice, &bob, "hi").await;

    let bob_threads = app.threads(&bob).await;
    assert_eq!(bob_threads.len(), 1);
    let thread = &bob_threads[0];
    assert_eq!(thread["counterpartId"], alice.user_id.to_string());
    assert_eq!(thread["threadId"], thread["counterpartId"]);
    assert_eq!(thread["name"], "alice");
    assert_eq!(thread["email"], alice.email);
    assert_eq!(thread["role"], "applicant");
    assert_eq!(thread["lastMessage"], "hi");
    assert_eq!(thread["unreadCount"], 1);

    let alice_threads = app.threads(&alice).await;
    assert_eq!(alice_threads.len(), 1);
    assert_eq!(alice_threads[0]["counterpartId"], bob.user_id.to_string());
    assert_eq!(alice_threads[0]["role"], "company");
    assert_eq!(alice_threads[0]["unreadCount"], 0);
}

#[tokio::test]
async fn test_mark_read_clears_unread_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.send_message(&alice, &bob, "hi").await;
    app.send_message(&alice, &bob, "are you there?").await;

    app.mark_read(&bob, &alice).await;
    assert_eq!(thread_with(&app.threads(&bob).await, &alice).unwrap()["unreadCount"], 0);

    app.mark_read(&bob, &alice).await;
    assert_eq!(thread_with(&app.threads(&bob).await, &alice).unwrap()["unreadCount"], 0);

    let history = app.between(&bob, &alice).await;
    assert!(history.iter().all(|m| m["read"] == true));
}

#[tokio::test]
async fn test_mark_read_without_thread_is_noop() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    app.mark_read(&alice, &bob).await;
    assert!(app.threads(&alice).await.is_empty());
}

#[tokio::test]
async fn test_threads_ordered_by_latest_activity() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;
    let carol = app.register_user("carol").await;

    app.send_message(&alice, &bob, "to bob").await;
    app.send_message(&carol, &alice, "from carol").await;
    app.send_message(&bob, &alice, "from bob").await;

    let threads = app.threads(&alice).await;
    assert_eq!(threads.len(), 2);

    assert_eq!(threads[0]["counterpartId"], bob.user_id.to_string());
    assert_eq!(threads[0]["lastMessage"], "from bob");
    assert_eq!(threads[0]["unreadCount"], 1);

    assert_eq!(threads[1]["counterpartId"], carol.user_id.to_string());
    assert_eq!(threads[1]["lastMessage"], "from carol");
    assert_eq!(threads[1]["unreadCount"], 1);
}

#[tokio::test]
async fn test_one_thread_per_counterpart() {
    let app = TestApp::spawn().await;
    let company = app.register_user_with_role("acme", "company").await;

    let mut applicants = Vec::new();
    for i in 0..5 {
        let applicant = app.register_user(&format!("applicant{i}")).await;
        app.send_message(&applicant, &company, "I'd like to apply").await;
        app.send_message(&company, &applicant, "Thanks, we'll be in touch").await;
        applicants.push(applicant);
    }

    let threads = app.threads(&company).await;
    assert_eq!(threads.len(), applicants.len());

    let ids: HashSet<_> = threads.iter().map(|t| t["counterpartId"].as_str().unwrap().to_string()).collect();
    assert_eq!(ids.len(), applicants.len());

    // Each thread's latest message is the company's reply, so nothing is unread for the company.
    assert!(threads.iter().all(|t| t["unreadCount"] == 0));
    assert!(threads.iter().all(|t| t["lastMessage"] == "Thanks, we'll be in touch"));
}

#[tokio::test]
async fn test_concurrent_send_and_mark_read() {
    let app = TestApp::spawn().await;
    let alice = app.register_user("alice").await;
    let bob = app.register_user("bob").await;

    let (sent, marked) =
        tokio::join!(app.send_message_raw(&alice.token, bob.user_id, "x"), app.mark_read_raw(&bob.token, alice.user_id));
    assert_eq!(sent.status(), reqwest::StatusCode::CREATED);
    assert_eq!(marked.status(), reqwest::StatusCode::OK);
    let sent: serde_json::Value = sent.json().await.unwrap();

    let unread = thread_with(&app.threads(&bob).await, &alice).unwrap()["unreadCount"].as_i64().unwrap();
    assert!(unread == 0 || unread == 1);

    let history = app.between(&bob, &alice).await;
    assert!(history.iter().any(|m| m["id"] == sent["id"]));
}

#[tokio::test]
async fn test_many_concurrent_senders() {
    let app = TestApp::spawn().await;
    let company = app.register_user_with_role("acme", "company").await;
    let applicant = app.register_user("applicant").await;

    let contents: Vec<String> = (0..20).map(|i| format!("msg {i}")).collect();
    let sends = contents.iter().map(|content| app.send_message_raw(&applicant.token, company.user_id, content));
    let responses = futures::future::join_all(sends).await;
    assert!(responses.iter().all(|r| r.status() == reqwest::StatusCode::CREATED));

    let threads = app.threads(&company).await;
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0]["unreadCount"], 20);
}
