use crate::*;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::oneshot;
use viewwindow::{Rect, WindowOptions, Windower};

fn png() -> Result<Bytes, AssetError> {
    Ok(Bytes::from_static(b"\x89PNG"))
}

fn only(requests: Vec<FetchRequest>) -> FetchRequest {
    assert_eq!(requests.len(), 1, "{requests:?}");
    requests.into_iter().next().unwrap()
}

type Transitions = Arc<Mutex<Vec<(AssetId, AssetState)>>>;

fn recording(options: LoaderOptions) -> (LoaderOptions, Transitions) {
    let log = Transitions::default();
    let sink = Arc::clone(&log);
    let options = options.with_on_state_change(Some(move |id: &AssetId, state: AssetState| {
        sink.lock().unwrap().push((id.clone(), state));
    }));
    (options, log)
}

fn states_of(log: &Transitions, id: &str) -> Vec<AssetState> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(i, _)| i.as_str() == id)
        .map(|(_, s)| *s)
        .collect()
}

/// Registry shared with the test so it can be inspected after the coordinator is gone.
#[derive(Clone, Default)]
struct SharedUrls(Rc<RefCell<ObjectUrls>>);

impl SourceRegistry for SharedUrls {
    fn create(&mut self, id: &AssetId, bytes: Bytes) -> Result<String, AssetError> {
        self.0.borrow_mut().create(id, bytes)
    }

    fn revoke(&mut self, source: &str) {
        self.0.borrow_mut().revoke(source);
    }
}

#[test]
fn lazy_record_waits_for_proximity() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default());
    assert_eq!(c.request_lazy(1, "a.jpg"), AssetState::Idle);
    assert!(c.take_requests().is_empty());

    assert!(!c.on_proximity("a.jpg", false));
    assert!(c.on_proximity("a.jpg", true));
    assert_eq!(c.record("a.jpg").unwrap().state(), AssetState::Loading);
    assert!(c.record("a.jpg").unwrap().is_in_view());

    let req = only(c.take_requests());
    assert_eq!(req.id.as_str(), "a.jpg");
    assert_eq!(req.stage, Stage::Single);

    assert!(c.complete(req.token, png()));
    let record = c.record("a.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Loaded);
    assert!(record.is_loaded());
    let src = record.current_src().unwrap().to_string();
    assert!(c.registry().is_live(&src));

    // Terminal: another proximity edge does not refetch.
    assert!(!c.on_proximity("a.jpg", true));
    assert!(c.take_requests().is_empty());
}

#[test]
fn preload_and_placeholder() {
    let mut c: AssetCoordinator = AssetCoordinator::new(
        LoaderOptions::default()
            .with_preload(true)
            .with_placeholder(DEFAULT_PLACEHOLDER),
    );
    assert_eq!(c.request_lazy(1, "a.jpg"), AssetState::Loading);
    assert_eq!(c.slot(&1).unwrap().current_src(), Some(DEFAULT_PLACEHOLDER));
    assert_eq!(c.take_requests().len(), 1);

    // The placeholder itself and empty ids are never fetched.
    assert_eq!(c.request_lazy(2, DEFAULT_PLACEHOLDER), AssetState::Idle);
    assert_eq!(c.request_lazy(3, ""), AssetState::Idle);
    assert!(!c.on_proximity("", true));
    assert!(c.take_requests().is_empty());
}

#[test]
fn lazy_failure_shows_fallback_and_reports() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let mut c: AssetCoordinator = AssetCoordinator::new(
        LoaderOptions::default()
            .with_preload(true)
            .with_fallback("broken.svg")
            .with_on_error(Some(move |id: &AssetId, err: &AssetError| {
                sink.lock().unwrap().push((id.to_string(), err.clone()));
            })),
    );
    c.request_lazy(1, "a.jpg");
    let req = only(c.take_requests());
    assert!(c.complete(req.token, Err(AssetError::network("503"))));

    let record = c.record("a.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Error);
    assert_eq!(record.current_src(), Some("broken.svg"));
    assert_eq!(record.last_error(), Some(&AssetError::network("503")));
    assert_eq!(
        *errors.lock().unwrap(),
        vec![("a.jpg".to_string(), AssetError::network("503"))]
    );

    assert!(!c.on_proximity("a.jpg", true));
    assert!(c.take_requests().is_empty());
    assert_eq!(c.registry().live_count(), 0);
}

#[test]
fn lazy_failure_without_fallback_leaves_source_unset() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "a.jpg");
    let req = only(c.take_requests());
    // Empty payloads cannot be displayed.
    assert!(c.complete(req.token, Ok(Bytes::new())));

    let record = c.record("a.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Error);
    assert_eq!(record.current_src(), None);
    assert!(matches!(record.last_error(), Some(AssetError::Decode(_))));
}

#[test]
fn progressive_upgrades_and_releases_low_res() {
    let loads = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&loads);
    let (options, log) = recording(LoaderOptions::default().with_on_load(Some(
        move |id: &AssetId, src: &str| sink.lock().unwrap().push((id.to_string(), src.to_string())),
    )));
    let mut c: AssetCoordinator = AssetCoordinator::new(options);

    assert_eq!(
        c.request_progressive(1, "thumb.jpg", "full.jpg"),
        AssetState::LoadingLow
    );
    let low = only(c.take_requests());
    assert_eq!((low.id.as_str(), low.stage), ("thumb.jpg", Stage::Low));

    assert!(c.complete(low.token, png()));
    let record = c.record("full.jpg").unwrap();
    assert_eq!(record.state(), AssetState::LoadingHigh);
    assert!(record.is_low_res_loaded());
    let low_src = record.current_src().unwrap().to_string();

    let high = only(c.take_requests());
    assert_eq!((high.id.as_str(), high.stage), ("full.jpg", Stage::High));
    assert!(c.complete(high.token, png()));

    let record = c.record("full.jpg").unwrap();
    assert_eq!(record.state(), AssetState::LoadedHigh);
    assert!(record.is_high_res_loaded());
    let high_src = record.current_src().unwrap().to_string();
    assert_ne!(low_src, high_src);
    assert!(!c.registry().is_live(&low_src));
    assert!(c.registry().is_live(&high_src));
    assert_eq!(c.registry().live_count(), 1);
    assert_eq!(*loads.lock().unwrap(), vec![("full.jpg".to_string(), high_src)]);

    assert_eq!(
        states_of(&log, "full.jpg"),
        vec![
            AssetState::LoadingLow,
            AssetState::LoadedLow,
            AssetState::LoadingHigh,
            AssetState::LoadedHigh,
        ]
    );
}

#[test]
fn progressive_high_failure_keeps_low_res() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_fallback("x"));
    c.request_progressive(1, "thumb.jpg", "full.jpg");
    let low = only(c.take_requests());
    c.complete(low.token, png());
    let low_src = c.record("full.jpg").unwrap().current_src().unwrap().to_string();

    let high = only(c.take_requests());
    assert!(c.complete(high.token, Err(AssetError::network("reset"))));

    let record = c.record("full.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Error);
    assert_eq!(record.current_src(), Some(low_src.as_str()));
    assert!(record.is_low_res_loaded());
    assert!(!record.is_high_res_loaded());
    assert!(c.registry().is_live(&low_src));
}

#[test]
fn progressive_low_failure_falls_back() {
    let mut c: AssetCoordinator =
        AssetCoordinator::new(LoaderOptions::default().with_placeholder("wait.svg"));
    c.request_progressive(1, "thumb.jpg", "full.jpg");
    let low = only(c.take_requests());
    c.complete(low.token, Err(AssetError::rejected("403")));
    let record = c.record("full.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Error);
    assert_eq!(record.current_src(), Some("wait.svg"));
    assert!(!record.is_low_res_loaded());
    assert!(c.take_requests().is_empty());

    let mut c: AssetCoordinator = AssetCoordinator::new(
        LoaderOptions::default()
            .with_placeholder("wait.svg")
            .with_fallback("broken.svg"),
    );
    c.request_progressive(1, "thumb.jpg", "full.jpg");
    let low = only(c.take_requests());
    c.complete(low.token, Err(AssetError::rejected("403")));
    assert_eq!(c.record("full.jpg").unwrap().current_src(), Some("broken.svg"));
}

#[test]
fn transitions_follow_legal_orders() {
    let (options, log) = recording(LoaderOptions::default());
    let mut c: AssetCoordinator = AssetCoordinator::new(options);

    c.request_lazy(1, "ok");
    c.request_lazy(2, "bad");
    c.request_progressive(3, "p-low", "p");
    c.request_progressive(4, "q-low", "q");
    c.on_proximity("ok", true);
    c.on_proximity("bad", true);

    // Resolve everything, failing "bad" and the high stage of "q".
    loop {
        let requests = c.take_requests();
        if requests.is_empty() {
            break;
        }
        for req in requests.into_iter().rev() {
            let result = match req.id.as_str() {
                "bad" | "q" => Err(AssetError::network("down")),
                _ => png(),
            };
            assert!(c.complete(req.token, result));
        }
    }

    use AssetState::*;
    assert_eq!(states_of(&log, "ok"), vec![Loading, Loaded]);
    assert_eq!(states_of(&log, "bad"), vec![Loading, Error]);
    assert_eq!(
        states_of(&log, "p"),
        vec![LoadingLow, LoadedLow, LoadingHigh, LoadedHigh]
    );
    assert_eq!(
        states_of(&log, "q"),
        vec![LoadingLow, LoadedLow, LoadingHigh, Error]
    );

    for record in c.records() {
        let mut from = Idle;
        for to in states_of(&log, record.id().as_str()) {
            assert!(record.policy().allows(from, to), "{from} -> {to}");
            from = to;
        }
        assert!(record.state().is_terminal());
    }
}

#[test]
fn unmount_ignores_late_completions() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "done.jpg");
    c.request_lazy(2, "late.jpg");
    let requests = c.take_requests();
    assert_eq!(requests.len(), 2);
    assert!(c.complete(requests[0].token, png()));
    assert_eq!(c.registry().live_count(), 1);

    c.unmount();
    assert!(!c.is_mounted());
    assert_eq!(c.registry().live_count(), 0);
    assert_eq!(c.registry().double_revokes(), 0);

    // A synthetic late resolution after unmount.
    assert!(!c.complete(requests[1].token, png()));
    assert!(c.is_empty());
    assert_eq!(c.registry().live_count(), 0);

    // Still stale after remounting.
    c.remount();
    assert!(!c.complete(requests[1].token, png()));
    assert_eq!(c.request_lazy(2, "late.jpg"), AssetState::Loading);
    let fresh = only(c.take_requests());
    assert_ne!(fresh.token, requests[1].token);
}

#[test]
fn drop_releases_every_source_once() {
    let shared = SharedUrls::default();
    {
        let mut c: AssetCoordinator<u64, SharedUrls> =
            AssetCoordinator::with_registry(LoaderOptions::default(), shared.clone());
        c.request_progressive(1, "a-low", "a");
        c.request_progressive(2, "b-low", "b");
        for req in c.take_requests() {
            c.complete(req.token, png());
        }
        // "a" finishes, "b" stays at loading-high.
        let high = c.take_requests();
        let a = high.iter().find(|r| r.id.as_str() == "a").unwrap();
        c.complete(a.token, png());
        assert_eq!(shared.0.borrow().live_count(), 2);
    }
    assert_eq!(shared.0.borrow().live_count(), 0);
    assert_eq!(shared.0.borrow().double_revokes(), 0);
}

#[test]
fn rebinding_a_slot_makes_the_old_fetch_stale() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(7, "old.jpg");
    let old = only(c.take_requests());

    c.request_lazy(7, "new.jpg");
    assert!(c.record("old.jpg").is_none());
    let new = only(c.take_requests());

    assert!(!c.complete(old.token, png()));
    assert_eq!(c.registry().live_count(), 0);
    assert_eq!(c.slot(&7).unwrap().state(), AssetState::Loading);

    assert!(c.complete(new.token, png()));
    assert_eq!(c.slot(&7).unwrap().state(), AssetState::Loaded);
    assert!(!c.complete(new.token, png()));
}

#[test]
fn rebinding_before_the_request_is_taken_drops_it() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "first.jpg");
    c.request_lazy(1, "second.jpg");
    let req = only(c.take_requests());
    assert_eq!(req.id.as_str(), "second.jpg");
}

#[test]
fn shared_identifier_is_fetched_once() {
    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "logo.png");
    assert_eq!(c.request_lazy(2, "logo.png"), AssetState::Loading);
    assert_eq!(c.request_lazy(2, "logo.png"), AssetState::Loading);
    let req = only(c.take_requests());
    c.complete(req.token, png());
    assert_eq!(c.slot(&1).unwrap().current_src(), c.slot(&2).unwrap().current_src());

    assert!(c.release_slot(&1));
    assert!(c.record("logo.png").is_some());
    assert_eq!(c.registry().live_count(), 1);
    assert!(c.release_slot(&2));
    assert!(c.record("logo.png").is_none());
    assert_eq!(c.registry().live_count(), 0);
    assert!(!c.release_slot(&2));
}

#[test]
fn built_in_observer_drives_lazy_records() {
    let mut c: AssetCoordinator = AssetCoordinator::new(
        LoaderOptions::default()
            .try_with_root_margin("100px 0px")
            .unwrap(),
    );
    let mut w = Windower::new(WindowOptions::new(100, 50));
    w.set_viewport_rect(Rect::new(200, 300));

    for row in 0..100u64 {
        let id = format!("img-{row}");
        c.request_lazy(row, id.as_str());
        c.observe(id, w.row_bounds(row as usize).unwrap());
    }

    // Rows 0 to 3 are visible; 4 and 5 sit inside the 100px margin.
    assert_eq!(c.set_viewport(w.viewport_bounds()), 6);
    let mut ids: Vec<_> = c.take_requests().into_iter().map(|r| r.id).collect();
    ids.sort();
    assert_eq!(ids, ["img-0", "img-1", "img-2", "img-3", "img-4", "img-5"].map(AssetId::from));

    // Rows already started are no longer observed.
    w.set_scroll_offset(300);
    assert_eq!(c.set_viewport(w.viewport_bounds()), 6);
    assert_eq!(c.record("img-11").unwrap().state(), AssetState::Loading);
    assert_eq!(c.record("img-12").unwrap().state(), AssetState::Idle);
}

#[test]
fn reload_restarts_a_failed_record() {
    let (options, log) = recording(LoaderOptions::default().with_preload(true));
    let mut c: AssetCoordinator = AssetCoordinator::new(options);
    c.request_lazy(1, "a.jpg");
    let req = only(c.take_requests());
    c.complete(req.token, Err(AssetError::network("offline")));

    assert!(c.reload("a.jpg"));
    let record = c.record("a.jpg").unwrap();
    assert_eq!(record.state(), AssetState::Loading);
    assert_eq!(record.last_error(), None);
    let retry = only(c.take_requests());
    assert!(!c.complete(req.token, png()));
    assert!(c.complete(retry.token, png()));

    use AssetState::*;
    assert_eq!(
        states_of(&log, "a.jpg"),
        vec![Loading, Error, Idle, Loading, Loaded]
    );
    assert!(!c.reload("missing"));
}

#[test]
fn batch_runs_fifo_within_the_limit() {
    let mut batch = BatchLoader::new(2);
    batch.load_batch(["a", "b", "c", "d", "e"]);
    assert!(batch.is_loading());

    let first = batch.take_requests();
    let ids: Vec<_> = first.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
    assert_eq!(batch.outstanding(), 2);
    assert_eq!(batch.queued(), 3);
    assert_eq!(batch.state("c"), Some(AssetState::Idle));

    assert!(batch.complete(first[1].token, Err(AssetError::network("x"))));
    let next = only(batch.take_requests());
    assert_eq!(next.id.as_str(), "c");
    assert_eq!(batch.outstanding(), 2);

    let mut in_flight = vec![first[0].clone(), next];
    while let Some(req) = in_flight.pop() {
        assert!(batch.outstanding() <= 2);
        assert!(batch.complete(req.token, png()));
        in_flight.extend(batch.take_requests());
    }

    assert!(!batch.is_loading());
    assert_eq!(batch.outstanding(), 0);
    assert_eq!(batch.loaded_images().len(), 4);
    assert!(batch.is_loaded("e"));
    assert!(!batch.is_loaded("b"));
    assert_eq!(batch.state("b"), Some(AssetState::Error));
    assert_eq!(batch.failed().get("b"), Some(&AssetError::network("x")));
}

#[test]
fn batch_dedups_and_replaces() {
    let mut batch = BatchLoader::new(0);
    assert_eq!(batch.concurrency_limit(), 1);

    batch.load_batch(vec!["a".to_string(), "b".to_string(), "a".to_string()]);
    assert_eq!(batch.len(), 2);
    let a = only(batch.take_requests());
    assert!(batch.complete(a.token, png()));
    let b = only(batch.take_requests());

    batch.load_batch(["c"]);
    assert!(!batch.complete(b.token, png()));
    assert!(batch.loaded_images().is_empty());
    assert_eq!(batch.state("a"), None);
    assert_eq!(only(batch.take_requests()).id.as_str(), "c");
}

#[test]
fn batch_prioritize_and_cancel() {
    let mut batch = BatchLoader::default();
    assert_eq!(batch.concurrency_limit(), DEFAULT_CONCURRENCY_LIMIT);
    batch.set_concurrency_limit(1);
    batch.load_batch(["a", "b", "c", "d"]);
    let a = only(batch.take_requests());

    assert!(batch.prioritize("d"));
    assert!(!batch.prioritize("a"));
    assert!(!batch.prioritize("zzz"));
    batch.complete(a.token, png());
    let d = only(batch.take_requests());
    assert_eq!(d.id.as_str(), "d");

    batch.cancel();
    assert!(!batch.is_loading());
    assert!(!batch.complete(d.token, png()));
    assert!(batch.is_loaded("a"));
    assert_eq!(batch.state("b"), None);

    batch.set_concurrency_limit(3);
    assert!(batch.take_requests().is_empty());
}

fn counting_resolver(
    active: Rc<Cell<usize>>,
    peak: Rc<Cell<usize>>,
) -> FnResolver<impl Fn(AssetId) -> futures::future::LocalBoxFuture<'static, Result<Bytes, AssetError>>>
{
    use futures::FutureExt;
    FnResolver::new(move |id: AssetId| {
        let active = Rc::clone(&active);
        let peak = Rc::clone(&peak);
        async move {
            active.set(active.get() + 1);
            peak.set(peak.get().max(active.get()));
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            active.set(active.get() - 1);
            if id.as_str().starts_with("bad") {
                Err(AssetError::network("unreachable"))
            } else {
                png()
            }
        }
        .boxed_local()
    })
}

#[tokio::test]
async fn driver_bounds_batch_concurrency() {
    let active = Rc::new(Cell::new(0));
    let peak = Rc::new(Cell::new(0));
    let mut driver = FetchDriver::new(counting_resolver(Rc::clone(&active), Rc::clone(&peak)));

    let ids: Vec<String> = (0..20)
        .map(|i| if i % 7 == 3 { format!("bad-{i}") } else { format!("img-{i}") })
        .collect();
    let mut batch = BatchLoader::new(3);
    batch.load_batch(ids.iter().map(String::as_str));

    let applied = driver.run_batch(&mut batch).await;
    assert_eq!(applied, 20);
    assert!(peak.get() <= 3);
    assert!(peak.get() >= 2);
    assert_eq!(active.get(), 0);
    assert!(driver.is_idle());
    assert!(!batch.is_loading());

    for id in &ids {
        assert_eq!(batch.is_loaded(id), !id.starts_with("bad"), "{id}");
    }
    assert_eq!(batch.failed().len(), 3);
}

#[tokio::test]
async fn driver_feeds_progressive_records() {
    let (options, log) = recording(LoaderOptions::default());
    let mut c: AssetCoordinator = AssetCoordinator::new(options);
    let mut driver = FetchDriver::new(FnResolver::new(|id: AssetId| async move {
        if id.as_str() == "broken-hd" {
            Err(AssetError::decode("truncated"))
        } else {
            png()
        }
    }));

    c.request_progressive(1, "sd", "hd");
    c.request_progressive(2, "broken-sd", "broken-hd");
    assert_eq!(driver.run_coordinator(&mut c).await, 4);

    assert_eq!(c.record("hd").unwrap().state(), AssetState::LoadedHigh);
    let broken = c.record("broken-hd").unwrap();
    assert_eq!(broken.state(), AssetState::Error);
    assert!(broken.is_low_res_loaded());
    assert_eq!(c.registry().live_count(), 2);
    assert_eq!(states_of(&log, "hd").len(), 4);
}

#[tokio::test]
async fn driver_yields_completions_as_they_finish() {
    let gates: Rc<RefCell<HashMap<String, oneshot::Receiver<Result<Bytes, AssetError>>>>> =
        Rc::default();
    let resolver_gates = Rc::clone(&gates);
    let mut driver = FetchDriver::new(FnResolver::new(move |id: AssetId| {
        let gate = resolver_gates.borrow_mut().remove(id.as_str());
        async move {
            match gate {
                Some(rx) => rx.await.unwrap_or(Err(AssetError::Cancelled)),
                None => Err(AssetError::rejected("no gate")),
            }
        }
    }));

    let (tx_a, rx_a) = oneshot::channel();
    let (tx_b, rx_b) = oneshot::channel();
    gates.borrow_mut().insert("a".into(), rx_a);
    gates.borrow_mut().insert("b".into(), rx_b);

    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "a");
    c.request_lazy(2, "b");
    driver.dispatch(c.take_requests());
    assert_eq!(driver.in_flight(), 2);

    tx_b.send(png()).unwrap();
    let first = driver.next_completion().await.unwrap();
    assert_eq!(first.id.as_str(), "b");
    assert!(c.complete(first.token, first.result));

    drop(tx_a);
    let second = driver.next_completion().await.unwrap();
    assert_eq!(second.result, Err(AssetError::Cancelled));
    assert!(c.complete(second.token, second.result));
    assert_eq!(c.record("a").unwrap().state(), AssetState::Error);
    assert!(driver.next_completion().await.is_none());
}

#[tokio::test]
async fn aborting_after_unmount_leaks_nothing() {
    let (tx, rx) = oneshot::channel::<()>();
    let rx = RefCell::new(Some(rx));
    let mut driver = FetchDriver::new(FnResolver::new(move |id: AssetId| {
        let gate = if id.as_str() == "slow" {
            rx.borrow_mut().take()
        } else {
            None
        };
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            png()
        }
    }));

    let mut c: AssetCoordinator = AssetCoordinator::new(LoaderOptions::default().with_preload(true));
    c.request_lazy(1, "slow");
    c.request_lazy(2, "fast");
    driver.dispatch(c.take_requests());

    let fast = driver.next_completion().await.unwrap();
    assert!(c.complete(fast.token, fast.result));
    assert_eq!(c.registry().live_count(), 1);

    c.unmount();
    assert_eq!(c.registry().live_count(), 0);

    // The late completion is delivered anyway and must be ignored.
    tx.send(()).unwrap();
    let late = driver.next_completion().await.unwrap();
    assert!(!c.complete(late.token, late.result));
    assert_eq!(c.registry().live_count(), 0);

    c.remount();
    c.request_lazy(3, "again");
    driver.dispatch(c.take_requests());
    assert_eq!(driver.abort_all(), 1);
    assert!(driver.is_idle());
}
