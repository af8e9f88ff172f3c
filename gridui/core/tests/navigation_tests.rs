//! Navigation and Dispatch Integration Tests
//!
//! Drives a [`UiManager`] over a [`MemoryHost`] the way a game server would:
//! open pages, deliver clicks, close containers and disconnect sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use gridui_core::{
    BackOutcome, ButtonRef, ClickEvent, ClickOutcome, ClickType, CloseReason, DispatchConfig,
    GridButton, ItemDisplay, LinkButton, MemoryHost, OpenOutcome, Page, PageId, Paginator,
    PlaceholderButton, SessionId, Template, UiManager,
};

// =============================================================================
// Fixtures
// =============================================================================

type Manager = UiManager<MemoryHost<ItemDisplay>>;

/// Route manager logs through the test harness (`RUST_LOG=gridui_core=debug`)
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup() -> (Manager, Arc<MemoryHost<ItemDisplay>>) {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    (UiManager::new(Arc::clone(&host)), host)
}

fn counting_button(item: &str, counter: &Arc<AtomicUsize>) -> ButtonRef {
    let counter = Arc::clone(counter);
    Arc::new(
        GridButton::builder()
            .display(ItemDisplay::new(item))
            .on_click(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap(),
    )
}

fn single_button_page(title: &str, slot: usize, button: ButtonRef) -> Arc<Page> {
    let mut template = Template::builder(3).unwrap();
    template.set(slot, button).unwrap();
    Page::builder()
        .title(title)
        .template(template.build())
        .build()
        .unwrap()
}

fn plain_page(title: &str) -> Arc<Page> {
    single_button_page(
        title,
        0,
        Arc::new(GridButton::of(ItemDisplay::new("minecraft:stone"))),
    )
}

fn left(slot: usize) -> ClickEvent {
    ClickEvent::new(slot, ClickType::LeftClick)
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_open_open_back_shows_first_page() {
    let (manager, host) = setup();
    let session = SessionId::new();
    let a = plain_page("A");
    let b = plain_page("B");

    manager.open(session, Arc::clone(&a));
    manager.open(session, Arc::clone(&b));
    assert_eq!(manager.back(session), BackOutcome::Returned);

    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(a.id()));
    assert!(manager.is_open(session));
    assert_eq!(host.open_container(session).unwrap().title, "A");
}

#[test]
fn test_back_reinvokes_on_open() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let opens = Arc::new(AtomicUsize::new(0));
    let hook = Arc::clone(&opens);

    let a = Page::builder()
        .title("A")
        .template(Template::<ItemDisplay>::builder(1).unwrap().build())
        .on_open(move |_| {
            hook.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    manager.open(session, a);
    manager.open(session, plain_page("B"));
    manager.back(session);

    assert_eq!(opens.load(Ordering::SeqCst), 2);
}

#[test]
fn test_back_on_single_page_closes() {
    let (manager, host) = setup();
    let session = SessionId::new();

    assert_eq!(manager.back(session), BackOutcome::NotOpen);
    manager.open(session, plain_page("Only"));

    assert_eq!(manager.back(session), BackOutcome::Closed);
    assert!(!manager.is_open(session));
    assert!(host.open_container(session).is_none());
}

#[test]
fn test_close_callbacks_carry_reason() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let reasons = Arc::new(Mutex::new(Vec::new()));

    let tracked = |title: &str| {
        let reasons = Arc::clone(&reasons);
        Page::builder()
            .title(title)
            .template(Template::<ItemDisplay>::builder(1).unwrap().build())
            .on_close(move |event| reasons.lock().push(event.reason))
            .build()
            .unwrap()
    };

    manager.open(session, tracked("A"));
    manager.open(session, tracked("B"));
    manager.back(session);
    manager.close(session);

    assert_eq!(
        *reasons.lock(),
        vec![
            Some(CloseReason::Replaced),
            Some(CloseReason::Back),
            Some(CloseReason::Closed),
        ]
    );
}

#[test]
fn test_refresh_repaints_slots() {
    let (manager, host) = setup();
    let session = SessionId::new();

    assert!(!manager.refresh(session));
    manager.open(session, plain_page("Main"));
    assert!(manager.refresh(session));
    assert_eq!(
        host.slot(session, 0).map(|d| d.item),
        Some("minecraft:stone".to_string())
    );
}

// =============================================================================
// Click dispatch
// =============================================================================

#[test]
fn test_click_without_page_is_noop() {
    let (manager, _host) = setup();
    let session = SessionId::new();

    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::NoPage);
    assert_eq!(manager.session_count(), 0);
}

#[test]
fn test_click_dispatches_to_slot() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let clicks = Arc::new(AtomicUsize::new(0));

    manager.open(
        session,
        single_button_page("Main", 13, counting_button("minecraft:diamond", &clicks)),
    );

    assert_eq!(manager.handle_click(session, left(13)), ClickOutcome::Dispatched);
    assert_eq!(manager.handle_click(session, left(12)), ClickOutcome::Empty);
    assert_eq!(manager.handle_click(session, left(500)), ClickOutcome::Empty);
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stale_click_after_forceful_reopen_never_reaches_new_page() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let a_clicks = Arc::new(AtomicUsize::new(0));
    let b_clicks = Arc::new(AtomicUsize::new(0));

    let a = single_button_page("A", 4, counting_button("minecraft:apple", &a_clicks));
    let b = single_button_page("B", 4, counting_button("minecraft:bread", &b_clicks));

    manager.open_forcefully(session, a);
    let stale = manager.current_container(session).unwrap().container_id;
    manager.open_forcefully(session, b);

    let outcome = manager.handle_click(session, left(4).in_container(stale));

    assert_eq!(outcome, ClickOutcome::Stale);
    assert_eq!(a_clicks.load(Ordering::SeqCst), 0);
    assert_eq!(b_clicks.load(Ordering::SeqCst), 0);

    let current = manager.current_container(session).unwrap().container_id;
    assert_eq!(
        manager.handle_click(session, left(4).in_container(current)),
        ClickOutcome::Dispatched
    );
    assert_eq!(b_clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stale_click_after_soft_open_never_reaches_new_page() {
    let (manager, host) = setup();
    let session = SessionId::new();
    let a_clicks = Arc::new(AtomicUsize::new(0));
    let b_clicks = Arc::new(AtomicUsize::new(0));

    // same title and shape, so the second open is a soft one
    let a = single_button_page("Shop", 4, counting_button("minecraft:apple", &a_clicks));
    let b = single_button_page("Shop", 4, counting_button("minecraft:bread", &b_clicks));

    manager.open(session, a);
    let stale = manager.current_container(session).unwrap().container_id;
    manager.open(session, Arc::clone(&b));
    assert_eq!(host.close_count(session), 0);
    assert_eq!(manager.history_depth(session), 1);

    assert_eq!(
        manager.handle_click(session, left(4).in_container(stale)),
        ClickOutcome::Stale
    );
    assert_eq!(a_clicks.load(Ordering::SeqCst), 0);
    assert_eq!(b_clicks.load(Ordering::SeqCst), 0);

    let current = manager.current_container(session).unwrap().container_id;
    assert_eq!(
        manager.handle_click(session, left(4).in_container(current)),
        ClickOutcome::Dispatched
    );
    assert_eq!(b_clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_handler_does_not_block_later_clicks() {
    let (manager, host) = setup();
    let session = SessionId::new();
    let other = SessionId::new();
    let clicks = Arc::new(AtomicUsize::new(0));

    let mut template = Template::<ItemDisplay>::builder(1).unwrap();
    template
        .set(
            0,
            Arc::new(
                GridButton::builder()
                    .display(ItemDisplay::new("minecraft:tnt"))
                    .on_click(|_| anyhow::bail!("shop backend unavailable"))
                    .build()
                    .unwrap(),
            ),
        )
        .unwrap()
        .set(
            1,
            Arc::new(
                GridButton::builder()
                    .display(ItemDisplay::new("minecraft:barrier"))
                    .on_click(|_| panic!("handler bug"))
                    .build()
                    .unwrap(),
            ),
        )
        .unwrap()
        .set(2, counting_button("minecraft:emerald", &clicks))
        .unwrap();
    let page = Page::builder()
        .title("Shop")
        .template(template.build())
        .build()
        .unwrap();

    manager.open(session, Arc::clone(&page));
    manager.open(other, page);

    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Failed);
    assert_eq!(manager.handle_click(session, left(1)), ClickOutcome::Failed);
    assert_eq!(manager.handle_click(session, left(2)), ClickOutcome::Dispatched);
    assert_eq!(manager.handle_click(other, left(2)), ClickOutcome::Dispatched);
    assert_eq!(clicks.load(Ordering::SeqCst), 2);

    let failures = host.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].message, "shop backend unavailable");
    assert!(!failures[0].panicked);
    assert_eq!(failures[1].message, "handler bug");
    assert!(failures[1].panicked);
}

#[test]
fn test_handler_navigation_applied_after_return() {
    let (manager, _host) = setup();
    let session = SessionId::new();

    let back: ButtonRef = Arc::new(LinkButton::back(ItemDisplay::new("minecraft:arrow")));
    let target = single_button_page("Target", 8, back);
    let link: ButtonRef = Arc::new(LinkButton::to(
        ItemDisplay::new("minecraft:arrow"),
        Arc::clone(&target),
    ));
    let home = single_button_page("Home", 0, link);

    manager.open(session, Arc::clone(&home));
    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);
    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(target.id()));
    assert_eq!(manager.history_depth(session), 2);

    assert_eq!(manager.handle_click(session, left(8)), ClickOutcome::Dispatched);
    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(home.id()));
    assert_eq!(manager.history_depth(session), 1);
}

#[test]
fn test_handler_may_call_manager_directly() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let next = plain_page("Next");

    let reentrant = {
        let manager = manager.clone();
        let next = Arc::clone(&next);
        Arc::new(
            GridButton::builder()
                .display(ItemDisplay::new("minecraft:compass"))
                .on_click(move |action| {
                    manager.open(action.session(), Arc::clone(&next));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
    };

    manager.open(session, single_button_page("Start", 0, reentrant));
    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);
    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(next.id()));
}

#[test]
fn test_clicks_during_callbacks_are_swallowed() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let clicks = Arc::new(AtomicUsize::new(0));
    let observed = Arc::new(Mutex::new(None));

    let page = {
        let manager = manager.clone();
        let observed = Arc::clone(&observed);
        let mut template = Template::builder(1).unwrap();
        template
            .set(0, counting_button("minecraft:bell", &clicks))
            .unwrap();
        Page::builder()
            .title("Busy")
            .template(template.build())
            .on_open(move |event| {
                *observed.lock() = Some(manager.handle_click(event.session, left(0)));
            })
            .build()
            .unwrap()
    };

    manager.open(session, page);

    assert_eq!(*observed.lock(), Some(ClickOutcome::InTransition));
    assert_eq!(clicks.load(Ordering::SeqCst), 0);
    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);
}

#[test]
fn test_uncaught_on_open_panic_ends_transition() {
    init_tracing();
    let host = Arc::new(MemoryHost::new());
    let config = DispatchConfig {
        catch_panics: false,
        ..DispatchConfig::default()
    };
    let manager: Manager = UiManager::with_config(Arc::clone(&host), config);
    let session = SessionId::new();

    let mut template = Template::<ItemDisplay>::builder(1).unwrap();
    template
        .set(0, Arc::new(GridButton::of(ItemDisplay::new("minecraft:stone"))))
        .unwrap();
    let page = Page::builder()
        .title("Cursed")
        .template(template.build())
        .on_open(|_| panic!("on_open bug"))
        .build()
        .unwrap();

    let opened = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        manager.open(session, page)
    }));
    assert!(opened.is_err());

    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);
}

#[test]
fn test_on_close_navigation_supersedes_incoming_page() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let opened = Arc::new(Mutex::new(Vec::new()));

    let recording_page = |title: &'static str| {
        let opened = Arc::clone(&opened);
        let mut template = Template::<ItemDisplay>::builder(1).unwrap();
        template
            .set(0, Arc::new(GridButton::of(ItemDisplay::new("minecraft:stone"))))
            .unwrap();
        Page::builder()
            .title(title)
            .template(template.build())
            .on_open(move |_| opened.lock().push(title))
            .build()
            .unwrap()
    };

    let detour = recording_page("Detour");
    let skipped = recording_page("Skipped");
    let start = {
        let manager = manager.clone();
        let detour = Arc::clone(&detour);
        let mut template = Template::<ItemDisplay>::builder(3).unwrap();
        template
            .set(0, Arc::new(GridButton::of(ItemDisplay::new("minecraft:stone"))))
            .unwrap();
        Page::builder()
            .title("Start")
            .template(template.build())
            .on_close(move |event| {
                if event.reason == Some(CloseReason::Replaced) {
                    manager.open(event.session, Arc::clone(&detour));
                }
            })
            .build()
            .unwrap()
    };

    manager.open(session, start);
    manager.open(session, Arc::clone(&skipped));

    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(detour.id()));
    assert_eq!(*opened.lock(), vec!["Detour"]);
    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[test]
fn test_session_end_prevents_resurrection() {
    let (manager, host) = setup();
    let session = SessionId::new();
    let clicks = Arc::new(AtomicUsize::new(0));
    let reasons = Arc::new(Mutex::new(Vec::new()));
    let hook = Arc::clone(&reasons);

    let mut template = Template::builder(1).unwrap();
    template
        .set(0, counting_button("minecraft:clock", &clicks))
        .unwrap();
    let page = Page::builder()
        .title("Main")
        .template(template.build())
        .on_close(move |event| hook.lock().push(event.reason))
        .build()
        .unwrap();

    manager.open(session, page);
    manager.handle_session_end(session);
    host.disconnect(session);
    manager.handle_session_end(session);

    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::NoPage);
    assert_eq!(clicks.load(Ordering::SeqCst), 0);
    assert_eq!(manager.session_count(), 0);
    assert_eq!(*reasons.lock(), vec![Some(CloseReason::SessionEnded)]);
}

#[test]
fn test_navigation_after_session_end_is_dropped() {
    let (manager, _host) = setup();
    let session = SessionId::new();

    let ender = {
        let manager = manager.clone();
        let elsewhere = plain_page("Elsewhere");
        Arc::new(
            GridButton::builder()
                .display(ItemDisplay::new("minecraft:ender_pearl"))
                .on_click(move |action| {
                    manager.handle_session_end(action.session());
                    action.open(Arc::clone(&elsewhere));
                    Ok(())
                })
                .build()
                .unwrap(),
        )
    };

    manager.open(session, single_button_page("Portal", 0, ender));
    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::Dispatched);

    assert!(!manager.is_open(session));
    assert_eq!(manager.session_count(), 0);
}

#[test]
fn test_client_close_then_click_is_noop() {
    let (manager, _host) = setup();
    let session = SessionId::new();
    let clicks = Arc::new(AtomicUsize::new(0));

    manager.open(
        session,
        single_button_page("Main", 0, counting_button("minecraft:chest", &clicks)),
    );
    let container = manager.current_container(session).unwrap();
    assert!(manager.handle_container_closed(session, container.container_id));

    assert_eq!(manager.handle_click(session, left(0)), ClickOutcome::NoPage);
    assert_eq!(clicks.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Pagination through the manager
// =============================================================================

#[test]
fn test_paginated_pages_navigate_forward_and_back() {
    let (manager, host) = setup();
    let session = SessionId::new();

    let mut template = Template::<ItemDisplay>::builder(2).unwrap();
    template
        .fill(0, 0, 0, 8, Arc::new(PlaceholderButton::<ItemDisplay>::new()))
        .unwrap();
    let content: Vec<ButtonRef> = (0..20)
        .map(|_| -> ButtonRef { Arc::new(GridButton::of(ItemDisplay::new("minecraft:map"))) })
        .collect();
    let pages = Paginator::new("Atlas", template.build())
        .next_link(17, ItemDisplay::new("minecraft:arrow"))
        .previous_link(9, ItemDisplay::new("minecraft:arrow"))
        .paginate(&content)
        .unwrap();
    assert_eq!(pages.len(), 3);
    let ids: Vec<PageId> = pages.iter().map(|p| p.id()).collect();

    manager.open(session, Arc::clone(&pages[0]));
    manager.handle_click(session, left(17));
    manager.handle_click(session, left(17));
    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(ids[2]));
    assert_eq!(host.open_container(session).unwrap().title, "Atlas (3/3)");

    manager.handle_click(session, left(9));
    assert_eq!(manager.current_page(session).map(|p| p.id()), Some(ids[1]));
    assert_eq!(manager.open(session, Arc::clone(&pages[1])), OpenOutcome::AlreadyOpen);
}
