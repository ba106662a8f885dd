use super::*;

#[test]
fn first_replace_to_initial_route_is_suppressed() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/docs?id=7#:~:text=highlight")?;
    assert_eq!(
        location.navigation_state().text_fragment_hash(),
        Some("#:~:text=highlight")
    );
    assert!(location.navigation_state().skip_initial_replace());
    assert_eq!(location.navigation_state().initial_path_query(), "/docs?id=7");

    location.replace_state(HistoryState::Null, "", Some("/docs?id=7"));
    assert!(browser.native_calls().is_empty());
    assert_eq!(location.hash(), "#:~:text=highlight");
    assert!(!location.navigation_state().skip_initial_replace());

    location.replace_state(HistoryState::Null, "", Some("/new-route"));
    assert_eq!(browser.replace_state_calls(), 1);
    assert_eq!(
        browser.native_calls(),
        vec![NativeCall::ReplaceState {
            url: "https://app.test/new-route".into(),
            state: HistoryState::Null,
        }]
    );
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    Ok(())
}

#[test]
fn latch_is_consumed_by_a_replace_elsewhere() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/a#:~:text=x")?;
    location.replace_state(HistoryState::Null, "", Some("/b"));
    location.replace_state(HistoryState::Null, "", Some("/a"));
    assert_eq!(browser.replace_state_calls(), 2);
    assert!(!location.navigation_state().skip_initial_replace());
    Ok(())
}

#[test]
fn second_replace_to_the_same_route_keeps_the_fragment() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/docs#:~:text=keep%20me")?;
    location.replace_state(HistoryState::Null, "", Some("/docs"));
    location.replace_state(serde_json::json!({ "n": 2 }), "", Some("/docs"));
    assert_eq!(
        browser.native_calls(),
        vec![NativeCall::ReplaceState {
            url: "https://app.test/docs#:~:text=keep%20me".into(),
            state: serde_json::json!({ "n": 2 }),
        }]
    );
    assert_eq!(
        location.navigation_state().text_fragment_hash(),
        Some("#:~:text=keep%20me")
    );
    Ok(())
}

#[test]
fn push_to_another_path_clears_tracking_for_good() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/a#:~:text=x")?;
    location.push_state(HistoryState::Null, "", Some("/b"));
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    assert_eq!(location.href(), "https://app.test/b");

    location.push_state(HistoryState::Null, "", Some("/a"));
    assert_eq!(location.href(), "https://app.test/a");
    assert_eq!(browser.push_state_calls(), 2);
    Ok(())
}

#[test]
fn push_to_the_same_path_splices_the_fragment() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/a?q=1#:~:text=x")?;
    location.push_state(HistoryState::Null, "", Some("/a?q=1"));
    assert_eq!(
        browser.native_calls(),
        vec![NativeCall::PushState {
            url: "https://app.test/a?q=1#:~:text=x".into(),
            state: HistoryState::Null,
        }]
    );
    Ok(())
}

#[test]
fn fragment_is_appended_to_a_plain_anchor() -> Result<()> {
    let (_browser, mut location) = adapter_at("https://app.test/guide#:~:text=x")?;
    location.push_state(HistoryState::Null, "", Some("/guide#install"));
    assert_eq!(location.hash(), "#install:~:text=x");
    assert!(location.navigation_state().text_fragment_hash().is_some());
    Ok(())
}

#[test]
fn destination_with_its_own_directive_clears_tracking() -> Result<()> {
    let (_browser, mut location) = adapter_at("https://app.test/guide#:~:text=x")?;
    location.push_state(HistoryState::Null, "", Some("/guide#:~:text=y"));
    assert_eq!(location.hash(), "#:~:text=y");
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    Ok(())
}

#[test]
fn null_url_rebuilds_the_current_route_with_the_fragment() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/doc?x=1#:~:text=hi")?;
    browser.strip_fragment_directive();
    location.push_state(HistoryState::Null, "", None);
    assert_eq!(
        browser.native_calls(),
        vec![NativeCall::PushState {
            url: "https://app.test/doc?x=1#:~:text=hi".into(),
            state: HistoryState::Null,
        }]
    );
    assert!(location.navigation_state().text_fragment_hash().is_some());
    Ok(())
}

#[test]
fn null_url_with_directive_still_visible_clears_tracking() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/doc#:~:text=hi")?;
    location.push_state(HistoryState::Null, "", Some(""));
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    assert_eq!(
        browser.native_calls(),
        vec![NativeCall::PushState {
            url: "https://app.test/doc#:~:text=hi".into(),
            state: HistoryState::Null,
        }]
    );
    Ok(())
}

#[test]
fn null_url_replace_on_initial_route_is_suppressed() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/doc#:~:text=hi")?;
    location.replace_state(HistoryState::Null, "", None);
    assert!(browser.native_calls().is_empty());
    Ok(())
}

#[test]
fn malformed_destination_passes_through_unmodified() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/doc#:~:text=hi")?;
    location.push_state(HistoryState::Null, "", Some("bad url"));
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    // The mock rejects the URL the same way a browser would throw.
    assert!(browser.native_calls().is_empty());
    assert_eq!(location.href(), "https://app.test/doc#:~:text=hi");
    Ok(())
}

#[test]
fn urls_pass_through_when_nothing_is_tracked() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/doc#plain")?;
    assert_eq!(location.navigation_state().text_fragment_hash(), None);
    assert!(!location.navigation_state().skip_initial_replace());
    location.replace_state(HistoryState::Null, "", Some("/doc"));
    assert_eq!(browser.replace_state_calls(), 1);
    assert_eq!(location.href(), "https://app.test/doc");
    Ok(())
}

#[test]
fn fragment_is_detected_from_the_navigation_entry() -> Result<()> {
    let browser = Rc::new(
        MockBrowser::new("https://app.test/article")?
            .with_navigation_entry_url(Some("https://app.test/article#:~:text=quoted%20line")),
    );
    let mut location = BrowserPlatformLocation::new(Rc::clone(&browser));
    assert_eq!(
        location.navigation_state().text_fragment_hash(),
        Some("#:~:text=quoted%20line")
    );

    location.replace_state(HistoryState::Null, "", Some("/article"));
    assert!(browser.native_calls().is_empty());
    location.push_state(HistoryState::Null, "", Some("/article"));
    assert_eq!(location.hash(), "#:~:text=quoted%20line");
    Ok(())
}

#[test]
fn fragment_is_detected_from_the_platform_directive() -> Result<()> {
    let browser = Rc::new(
        MockBrowser::new("https://app.test/article")?
            .with_navigation_entry_url(None)
            .with_fragment_directive(FragmentDirective {
                text: vec![TextDirectiveRange::new("hello world").with_end("bye")],
            }),
    );
    let location = BrowserPlatformLocation::new(browser);
    assert_eq!(
        location.navigation_state().text_fragment_hash(),
        Some("#:~:text=hello%20world,bye")
    );
    assert!(location.navigation_state().skip_initial_replace());
    Ok(())
}

#[test]
fn live_hash_wins_over_other_sources() -> Result<()> {
    let browser = Rc::new(
        MockBrowser::new("https://app.test/p#top:~:text=live")?
            .with_navigation_entry_url(Some("https://app.test/p#:~:text=entry"))
            .with_fragment_directive(FragmentDirective {
                text: vec![TextDirectiveRange::new("object")],
            }),
    );
    let location = BrowserPlatformLocation::new(browser);
    assert_eq!(
        location.navigation_state().text_fragment_hash(),
        Some("#:~:text=live")
    );
    Ok(())
}

#[test]
fn traversal_is_passed_through() -> Result<()> {
    let (browser, mut location) = adapter_at("https://app.test/")?;
    location.push_state(HistoryState::Null, "", Some("/a"));
    location.back();
    assert_eq!(location.pathname(), "/");
    location.forward();
    assert_eq!(location.pathname(), "/a");
    location.history_go(-1)?;
    assert_eq!(location.pathname(), "/");
    location.reload_current_entry()?;
    assert_eq!(browser.reload_count(), 1);
    assert_eq!(
        browser.native_calls()[1..],
        [
            NativeCall::Back,
            NativeCall::Forward,
            NativeCall::Go(-1),
            NativeCall::Go(0),
        ]
    );
    Ok(())
}

struct StaticLocation;

impl PlatformLocation for StaticLocation {
    fn base_href_from_dom(&self) -> Option<String> {
        None
    }

    fn state(&self) -> HistoryState {
        HistoryState::Null
    }

    fn on_pop_state(&self, _listener: LocationListener) -> Unsubscribe {
        Unsubscribe::new(|| {})
    }

    fn on_hash_change(&self, _listener: LocationListener) -> Unsubscribe {
        Unsubscribe::new(|| {})
    }

    fn href(&self) -> String {
        "https://static.test/".into()
    }

    fn protocol(&self) -> String {
        "https:".into()
    }

    fn hostname(&self) -> String {
        "static.test".into()
    }

    fn port(&self) -> String {
        String::new()
    }

    fn pathname(&self) -> String {
        "/".into()
    }

    fn search(&self) -> String {
        String::new()
    }

    fn hash(&self) -> String {
        String::new()
    }

    fn push_state(&mut self, _state: HistoryState, _title: &str, _url: Option<&str>) {}

    fn replace_state(&mut self, _state: HistoryState, _title: &str, _url: Option<&str>) {}

    fn forward(&mut self) {}

    fn back(&mut self) {}
}

#[test]
fn history_go_without_platform_support_fails_loudly() {
    let mut location = StaticLocation;
    assert_eq!(
        location.history_go(1),
        Err(Error::NotImplemented("history_go"))
    );
    assert_eq!(
        location.reload_current_entry(),
        Err(Error::NotImplemented("history_go"))
    );
}

#[test]
fn listeners_receive_events_until_unsubscribed() -> Result<()> {
    let (browser, location) = adapter_at("https://app.test/")?;
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    let pop = location.on_pop_state(Rc::new(move |event: &LocationChangeEvent| {
        sink.borrow_mut().push(format!("pop {}", event.new_url));
    }));
    let sink = Rc::clone(&seen);
    let hash = location.on_hash_change(Rc::new(move |event: &LocationChangeEvent| {
        sink.borrow_mut().push(format!("hash {}", event.new_url));
    }));
    assert_eq!(browser.listener_count(), 2);

    browser.navigate_hash("#x");
    pop.unsubscribe();
    browser.navigate_hash("#y");
    hash.unsubscribe();
    browser.navigate_hash("#z");

    assert_eq!(
        seen.borrow().as_slice(),
        [
            "pop https://app.test/#x",
            "hash https://app.test/#x",
            "hash https://app.test/#y",
        ]
    );
    assert_eq!(browser.listener_count(), 0);
    Ok(())
}

#[test]
fn dropped_subscription_keeps_listening() -> Result<()> {
    let (browser, location) = adapter_at("https://app.test/")?;
    drop(location.on_hash_change(Rc::new(|_: &LocationChangeEvent| {})));
    assert_eq!(browser.listener_count(), 1);
    Ok(())
}

#[test]
fn getters_reflect_the_live_location() -> Result<()> {
    let (_browser, location) = adapter_at("http://localhost:4200/app/list?page=2#row-3")?;
    assert_eq!(location.href(), "http://localhost:4200/app/list?page=2#row-3");
    assert_eq!(location.protocol(), "http:");
    assert_eq!(location.hostname(), "localhost");
    assert_eq!(location.port(), "4200");
    assert_eq!(location.pathname(), "/app/list");
    assert_eq!(location.search(), "?page=2");
    assert_eq!(location.hash(), "#row-3");
    assert_eq!(location.state(), HistoryState::Null);
    Ok(())
}

#[test]
fn base_href_is_reduced_to_a_pathname() -> Result<()> {
    let browser = Rc::new(MockBrowser::new("https://app.test/shop/cart")?.with_base_href("/shop/"));
    let location = BrowserPlatformLocation::new(browser);
    assert_eq!(location.base_href_from_dom().as_deref(), Some("/shop/"));

    let browser = Rc::new(
        MockBrowser::new("https://app.test/shop/cart")?.with_base_href("https://cdn.test/base/x"),
    );
    let location = BrowserPlatformLocation::new(browser);
    assert_eq!(location.base_href_from_dom().as_deref(), Some("/base/x"));

    let (_browser, location) = adapter_at("https://app.test/")?;
    assert_eq!(location.base_href_from_dom(), None);
    Ok(())
}
