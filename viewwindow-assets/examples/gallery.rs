// Example: a scrolling photo gallery. Rows come from a `VirtualizedList`; each mounted row
// binds its thumbnail to the coordinator, and proximity decides what gets fetched.
use bytes::Bytes;
use futures::executor::block_on;
use viewwindow::{ListView, VirtualizedList};
use viewwindow_assets::{
    AssetCoordinator, AssetError, AssetId, DEFAULT_FALLBACK, FetchDriver, FnResolver,
    LoaderOptions,
};

fn main() {
    let photos: Vec<String> = (0..10_000).map(|i| format!("photo-{i}.jpg")).collect();
    let mut list = VirtualizedList::new(photos)
        .with_height(600)
        .with_item_height(120)
        .with_overscan(2);

    let options = LoaderOptions::default()
        .with_fallback(DEFAULT_FALLBACK)
        .with_on_error(Some(|id: &AssetId, err: &AssetError| {
            eprintln!("{id}: {err}");
        }));
    let mut assets: AssetCoordinator = AssetCoordinator::new(options);
    let mut driver = FetchDriver::new(FnResolver::new(|id: AssetId| async move {
        // Stand-in for an HTTP client.
        if id.as_str().ends_with("13.jpg") {
            Err(AssetError::network("404"))
        } else {
            Ok(Bytes::from(id.as_str().as_bytes().to_vec()))
        }
    }));

    for offset in [0u64, 1_200, 1_560] {
        list.on_scroll(offset, 0);
        let window = list.window().clone();

        if let ListView::Rows(rows) = list.render(|name, _| name.clone()) {
            for row in &rows.rows {
                assets.request_lazy(row.index as u64, row.view.as_str());
                if let Some(bounds) = window.row_bounds(row.index) {
                    assets.observe(row.view.as_str(), bounds);
                }
            }
        }
        let started = assets.set_viewport(window.viewport_bounds());
        let applied = block_on(driver.run_coordinator(&mut assets));
        println!("offset={offset} started={started} applied={applied}");
    }

    for row in 10..16u64 {
        if let Some(record) = assets.slot(&row) {
            println!("{} {} {:?}", record.id(), record.state(), record.current_src().map(str::len));
        }
    }
    println!("live sources={}", assets.registry().live_count());
}
