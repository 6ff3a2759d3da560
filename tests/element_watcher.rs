// tests/element_watcher.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;

use tokio::time::{timeout, Duration};

use domwatch::{
    wait_for_element, Document, DomWatchError, ElementWatcher, WatchRequest, WatchState,
};
use domwatch_test_utils::{with_timeout, ElementBuilder};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn resolves_immediately_when_element_exists() -> TestResult {
    init_tracing();

    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;
    let card = ElementBuilder::new("div").id("card").attach(&doc, body)?;

    let watcher = ElementWatcher::start(&doc, WatchRequest::new("#card"))?;
    assert_eq!(watcher.state(), WatchState::Resolved(card));
    assert_eq!(doc.observer_count(), 0, "fast path must not subscribe");

    assert_eq!(watcher.wait().await?, card);
    assert_eq!(wait_for_element(&doc, "#card", None).await?, card);
    assert_eq!(doc.observer_count(), 0);
    Ok(())
}

#[tokio::test]
async fn resolves_when_element_is_inserted_later() -> TestResult {
    init_tracing();

    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;

    let watcher = ElementWatcher::start(&doc, WatchRequest::new(".panel .title"))?;
    assert_eq!(watcher.state(), WatchState::Observing);
    assert_eq!(doc.observer_count(), 1);

    let waiter = tokio::spawn(watcher.wait());

    // Unrelated mutations must not resolve the watcher.
    ElementBuilder::new("p").attach(&doc, body)?;
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    // Deep insertion: the title arrives inside a subtree added in one step.
    let panel = ElementBuilder::new("section")
        .class("panel")
        .child(
            ElementBuilder::new("div")
                .child(ElementBuilder::new("h2").class("title").text("Forecast")),
        )
        .attach(&doc, body)?;
    let title = doc
        .query_selector(panel, "h2")?
        .ok_or("title missing")?;

    let found = with_timeout(waiter).await??;
    assert_eq!(found, title);
    let label = doc.children(found).first().and_then(|&node| doc.text(node));
    assert_eq!(label.as_deref(), Some("Forecast"));
    assert_eq!(doc.observer_count(), 0, "subscription released on resolve");
    Ok(())
}

#[tokio::test]
async fn picks_first_match_in_document_order_within_a_batch() -> TestResult {
    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;

    let watcher = ElementWatcher::start(&doc, WatchRequest::new("li.item"))?;

    // Both insertions land in the same batch; the second one comes first in
    // document order.
    let later = ElementBuilder::new("li").class("item").attach(&doc, body)?;
    let earlier = ElementBuilder::new("li").class("item").build(&doc)?;
    doc.insert_before(body, earlier, Some(later))?;

    assert_eq!(with_timeout(watcher.wait()).await?, earlier);
    Ok(())
}

#[tokio::test]
async fn container_scopes_query_and_observation() -> TestResult {
    init_tracing();

    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;
    let container = ElementBuilder::new("div").id("widget").attach(&doc, body)?;
    let elsewhere = ElementBuilder::new("div").id("other").attach(&doc, body)?;

    let waiter = tokio::spawn(wait_for_element(&doc, "button", Some(container)));
    tokio::task::yield_now().await;

    // A match outside the container is ignored.
    ElementBuilder::new("button").attach(&doc, elsewhere)?;
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    let inside = ElementBuilder::new("button").attach(&doc, container)?;
    assert_eq!(with_timeout(waiter).await??, inside);
    assert_eq!(doc.observer_count(), 0);
    Ok(())
}

#[tokio::test]
async fn removals_do_not_resolve_and_later_mutations_are_not_observed() -> TestResult {
    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;
    let filler = ElementBuilder::new("span").attach(&doc, body)?;

    let watcher = ElementWatcher::start(&doc, WatchRequest::new("#late"))?;
    let waiter = tokio::spawn(watcher.wait());

    doc.remove(filler)?;
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    let late = ElementBuilder::new("div").id("late").attach(&doc, body)?;
    assert_eq!(with_timeout(waiter).await??, late);

    // Exactly once: nothing is subscribed any more, so further churn has no
    // one to notify.
    doc.remove(late)?;
    ElementBuilder::new("div").id("late").attach(&doc, body)?;
    assert_eq!(doc.observer_count(), 0);
    Ok(())
}

#[tokio::test]
async fn never_appearing_element_stays_pending_and_releases_on_drop() -> TestResult {
    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;

    {
        let mut wait = Box::pin(wait_for_element(&doc, "#never", None));
        assert_eq!(doc.observer_count(), 1);

        assert!(
            timeout(Duration::from_millis(20), &mut wait).await.is_err(),
            "must not complete"
        );

        ElementBuilder::new("div").id("something-else").attach(&doc, body)?;
        assert!(timeout(Duration::from_millis(20), &mut wait).await.is_err());
        assert_eq!(doc.observer_count(), 1);
    }

    // Dropping the pending future is the only way out, and it unsubscribes.
    assert_eq!(doc.observer_count(), 0);
    Ok(())
}

#[tokio::test]
async fn invalid_selector_is_rejected() {
    let doc = Document::new();
    let err = wait_for_element(&doc, "div >", None).await.unwrap_err();
    match err {
        DomWatchError::SelectorSyntax {
            selector, offset, ..
        } => {
            assert_eq!(selector, "div >");
            assert_eq!(offset, 5);
        }
        other => panic!("expected SelectorSyntax, got {other:?}"),
    }
    assert_eq!(doc.observer_count(), 0);
}

#[tokio::test]
async fn unknown_container_is_rejected() -> TestResult {
    let doc = Document::new();
    let other = Document::new();
    let mut foreign = other.root();
    for _ in 0..10 {
        foreign = other.create_element("div")?;
    }

    let err = wait_for_element(&doc, "div", Some(foreign)).await.unwrap_err();
    assert!(matches!(err, DomWatchError::NodeNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn independent_watchers_resolve_independently() -> TestResult {
    let doc = Document::new();
    let body = doc.body().ok_or("no body")?;

    let a = tokio::spawn(wait_for_element(&doc, "#a", None));
    let b = tokio::spawn(wait_for_element(&doc, "#b", None));
    tokio::task::yield_now().await;
    assert_eq!(doc.observer_count(), 2);

    let el_a = ElementBuilder::new("i").id("a").attach(&doc, body)?;
    assert_eq!(with_timeout(a).await??, el_a);
    assert_eq!(doc.observer_count(), 1);

    let el_b = ElementBuilder::new("b").id("b").attach(&doc, body)?;
    assert_eq!(with_timeout(b).await??, el_b);
    assert_eq!(doc.observer_count(), 0);

    Ok(())
}
