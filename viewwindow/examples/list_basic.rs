// Example: a 100k-row list, a scroll event and a scroll-to helper.
use viewwindow::{Align, ListView, VirtualizedList};

fn main() {
    let items: Vec<String> = (0..100_000).map(|i| format!("row #{i}")).collect();
    let mut list = VirtualizedList::new(items)
        .with_height(400)
        .with_item_height(50)
        .with_overscan(4);

    list.on_scroll(123_456, 0);
    match list.render(|label, _| label.len()) {
        ListView::Empty { message, .. } => println!("empty: {message}"),
        ListView::Rows(rows) => {
            println!("total_height={}", rows.total_height);
            println!("window={:?}", rows.window.indices());
            println!("first_row={:?}", rows.rows.first());
        }
    }

    let off = list.window_mut().scroll_to_index(99_999, Align::End);
    println!("after scroll_to_index: offset={off}");
    list.window_mut().update_scrolling(1_000);
    println!("is_scrolling={}", list.window().is_scrolling());
}
