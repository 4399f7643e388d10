// Example: a sortable table where the caller owns the sort state.
use std::sync::{Arc, Mutex};

use viewwindow::{Column, OptimizedTable, SortSpec, TableView};

#[derive(Debug)]
struct Employee {
    name: String,
    team: &'static str,
    salary: u32,
}

fn main() {
    let teams = ["infra", "ui", "data"];
    let data: Vec<Employee> = (0..5_000)
        .map(|i| Employee {
            name: format!("employee {i}"),
            team: teams[i % teams.len()],
            salary: 40_000 + (i as u32 * 7_919) % 60_000,
        })
        .collect();

    let columns = vec![
        Column::new("name", "Name", |e: &Employee| e.name.clone()),
        Column::new("team", "Team", |e: &Employee| e.team.to_string())
            .sortable_by_key(|e: &Employee| e.team)
            .with_width(80),
        Column::new("salary", "Salary", |e: &Employee| e.salary.to_string())
            .sortable_by_key(|e: &Employee| e.salary),
    ];

    let clicked = Arc::new(Mutex::new(None::<String>));
    let sink = Arc::clone(&clicked);
    let mut table = OptimizedTable::new(data, columns)
        .with_height(300)
        .with_on_sort(Some(move |key: &str| {
            if let Ok(mut slot) = sink.lock() {
                *slot = Some(key.to_string());
            }
        }));

    table.header_click("salary");
    let key = clicked.lock().ok().and_then(|mut k| k.take());
    if let Some(key) = key {
        let next = match table.sort() {
            Some(s) if s.key == key => SortSpec::new(key, s.direction.toggled()),
            _ => SortSpec::descending(key),
        };
        table.set_sort(Some(next));
    }

    if let TableView::Ready { header, body } = table.render() {
        let titles: Vec<_> = header.iter().map(|h| (h.header.as_str(), h.sorted)).collect();
        println!("header={titles:?}");
        for row in body.rows() {
            let cells: Vec<_> = row.view.cells.iter().map(|c| c.view.as_str()).collect();
            println!("{:>5} {cells:?}", row.index);
        }
    }
}
