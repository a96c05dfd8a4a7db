//! Redraw sessions driven end to end: notification values are decoded,
//! queued, applied to the screen model and rendered through the atlas.

use std::thread;
use std::time::{Duration, Instant};

use gridview::config::Config;
use gridview::font::{BoxRasterizer, CellSize, GlyphKey};
use gridview::protocol::{parse_replay, Value};
use gridview::ui::cursor::CursorAnimation;
use gridview::ui::grid::GridType;
use gridview::ui::{batch_queue, build_frame, UiState, WindowHandler};

/// Window collaborator that records every request
#[derive(Default)]
struct RecordingWindow {
    titles: Vec<String>,
    resizes: Vec<(u32, u32)>,
}

impl WindowHandler for RecordingWindow {
    fn set_title(&mut self, title: &str) {
        self.titles.push(title.to_string());
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }
}

fn cell() -> CellSize {
    CellSize {
        width: 8.0,
        height: 16.0,
    }
}

fn ui() -> UiState {
    UiState::new(&Config::default(), cell())
}

/// `[name, [args]...]` redraw group
fn group(name: &str, calls: Vec<Vec<Value>>) -> Value {
    let mut items = vec![Value::from(name)];
    items.extend(calls.into_iter().map(Value::Array));
    Value::Array(items)
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::Integer(v)).collect()
}

/// One `grid_line` call writing `text` one character per cell
fn line_call(grid: i64, row: i64, text: &str) -> Vec<Value> {
    let cells = text
        .chars()
        .map(|c| Value::Array(vec![Value::from(c.to_string())]))
        .collect();
    let mut args = ints(&[grid, row, 0]);
    args.push(Value::Array(cells));
    args
}

/// Decode, queue and apply notifications as separate batches
fn run(ui: &mut UiState, window: &mut RecordingWindow, notifications: Vec<Vec<Value>>, now: Instant) {
    let (sender, receiver) = batch_queue(64);
    for params in &notifications {
        sender.send_notification(params);
    }
    ui.process_queue(&receiver, window, now);
}

#[test]
fn test_resize_line_flush_render() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group("grid_resize", vec![ints(&[1, 10, 5])]),
            group(
                "grid_line",
                vec![vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    Value::Array(vec![Value::Array(vec!["A".into(), 1.into(), 1.into()])]),
                ]],
            ),
            group("flush", vec![vec![]]),
        ]],
        now,
    );

    assert!(ui.frame_ready());
    assert_eq!(window.resizes, vec![(80, 80)]);
    let grid = ui.grids().grid(1).unwrap();
    assert_eq!((grid.cols(), grid.rows()), (10, 5));
    let a = grid.cell(0, 0).unwrap();
    assert_eq!((a.text.as_str(), a.attr_id, a.dirty), ("A", 1, true));

    let mut rasterizer = BoxRasterizer::new(cell());
    let frame = build_frame(&mut ui, &mut rasterizer, now);
    assert_eq!(frame.cells.len(), 50);
    assert!(!ui.grids().grid(1).unwrap().cell(0, 0).unwrap().dirty);
    assert!(ui.atlas().get(&GlyphKey::plain("A")).is_some());
}

#[test]
fn test_oversized_grid_resize_is_ignored() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    let huge = 1i64 << 33;
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group("grid_resize", vec![ints(&[2, huge, huge]), ints(&[1, huge, 3])]),
            group("grid_line", vec![line_call(2, 0, "x")]),
            group("grid_resize", vec![ints(&[1, 4, 2])]),
            group("flush", vec![vec![]]),
        ]],
        now,
    );

    assert!(ui.grids().grid(2).is_none());
    assert_eq!(window.resizes, vec![(32, 32)]);
    let frame = build_frame(&mut ui, &mut BoxRasterizer::new(cell()), now);
    assert_eq!(frame.cells.len(), 8);
}

#[test]
fn test_cursor_goto_coalescing() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    run(
        &mut ui,
        &mut window,
        vec![
            vec![group("grid_resize", vec![ints(&[1, 10, 10])])],
            vec![
                group("grid_cursor_goto", vec![ints(&[1, 2, 3]), ints(&[1, 5, 5])]),
                group("flush", vec![vec![]]),
            ],
        ],
        now,
    );

    assert_eq!(ui.cursor().logical(), (1, 5, 5));
    // Straight from the origin to the final cell; (2, 3) is never a target
    match ui.cursor().animation() {
        CursorAnimation::Animating { from, to, .. } => {
            assert_eq!(from, (0.0, 0.0));
            assert_eq!(to, (5.0, 5.0));
        }
        other => panic!("expected animation, got {:?}", other),
    }

    let later = now + Duration::from_secs(1);
    let frame = build_frame(&mut ui, &mut BoxRasterizer::new(cell()), later);
    let cursor = frame.cursor.unwrap();
    assert_eq!((cursor.x, cursor.y), (40.0, 80.0));
    assert!(ui.cursor().is_settled());
}

#[test]
fn test_highlight_then_default_colors() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    let rgb = Value::Map(vec![
        ("foreground".into(), 0x00FF00.into()),
        ("reverse".into(), true.into()),
    ]);
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group("grid_resize", vec![ints(&[1, 3, 1])]),
            group(
                "grid_line",
                vec![vec![
                    1.into(),
                    0.into(),
                    0.into(),
                    Value::Array(vec![Value::Array(vec!["x".into(), 4.into(), 3.into()])]),
                ]],
            ),
            group("flush", vec![vec![]]),
        ]],
        now,
    );
    build_frame(&mut ui, &mut BoxRasterizer::new(cell()), now);

    run(
        &mut ui,
        &mut window,
        vec![vec![
            group(
                "hl_attr_define",
                vec![vec![4.into(), rgb, Value::Map(vec![]), Value::Array(vec![])]],
            ),
            group(
                "default_colors_set",
                vec![ints(&[0xEEEEEE, 0x202020, -1, 0, 0])],
            ),
            group("flush", vec![vec![]]),
        ]],
        now,
    );

    let frame = build_frame(&mut ui, &mut BoxRasterizer::new(cell()), now);
    assert_eq!(frame.cells.len(), 3);
    // Explicit foreground and substituted background, then swapped
    let attr = frame.cells[0].attr;
    assert_eq!(attr.foreground, 0x202020);
    assert_eq!(attr.background, 0x00FF00);
    // Unset special falls back to the configured color
    assert_eq!(ui.grids().default_colors().special, 0xFF0000);
}

#[test]
fn test_multigrid_draw_order() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    let win = |id: i64| Value::Ext(1, vec![id as u8]);
    let mut float_args = vec![3.into(), win(3), "SE".into(), 2.into(), 4.0.into(), 6.0.into()];
    float_args.push(Value::Bool(true));
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group(
                "grid_resize",
                vec![ints(&[1, 20, 10]), ints(&[4, 20, 1]), ints(&[3, 2, 2]), ints(&[2, 10, 5])],
            ),
            group("win_pos", vec![vec![2.into(), win(2), 1.into(), 5.into(), 10.into(), 5.into()]]),
            group("win_float_pos", vec![float_args]),
            group("msg_set_pos", vec![vec![4.into(), 8.into(), false.into(), "".into()]]),
            group("flush", vec![vec![]]),
        ]],
        now,
    );

    let grids = ui.grids();
    assert_eq!(grids.grid(2).unwrap().origin(), (1, 5));
    // South-east corner sits at grid 2 origin + (4, 6)
    assert_eq!(grids.grid(3).unwrap().origin(), (3, 9));
    assert_eq!(grids.grid(4).unwrap().origin(), (8, 0));
    assert_eq!(grids.grid(4).unwrap().grid_type(), GridType::Message);

    let order: Vec<u64> = grids.sorted_grids().iter().map(|g| g.id()).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);

    let frame = build_frame(&mut ui, &mut BoxRasterizer::new(cell()), now);
    let mut drawn: Vec<u64> = frame.cells.iter().map(|c| c.grid).collect();
    drawn.dedup();
    assert_eq!(drawn, vec![1, 2, 3, 4]);

    run(
        &mut ui,
        &mut window,
        vec![vec![group("win_hide", vec![ints(&[3])]), group("win_close", vec![ints(&[2])])]],
        now,
    );
    let order: Vec<u64> = ui.grids().sorted_grids().iter().map(|g| g.id()).collect();
    assert_eq!(order, vec![1, 4]);
}

#[test]
fn test_scroll_there_and_back() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let now = Instant::now();
    let rows = ["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff"];
    let lines = rows
        .iter()
        .enumerate()
        .map(|(row, text)| line_call(1, row as i64, text))
        .collect();
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group("grid_resize", vec![ints(&[1, 4, 6])]),
            group("grid_line", lines),
            group("grid_scroll", vec![ints(&[1, 0, 6, 0, 4, 2])]),
            group("grid_scroll", vec![ints(&[1, 0, 6, 0, 4, -2])]),
        ]],
        now,
    );

    let grid = ui.grids().grid(1).unwrap();
    for row in 2..6 {
        assert_eq!(grid.row_text(row), rows[row]);
    }
    // Exposed rows keep whatever was copied last
    assert_eq!(grid.row_text(0), "cccc");
}

#[test]
fn test_producer_thread_keeps_batch_order() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let (sender, receiver) = batch_queue(4);

    let producer = thread::spawn(move || {
        sender.send_notification(&[group("grid_resize", vec![ints(&[1, 3, 1])])]);
        for text in ["abc", "def", "ghi"] {
            sender.send_notification(&[
                group("set_title", vec![vec![text.into()]]),
                group("grid_line", vec![line_call(1, 0, text)]),
                group("flush", vec![vec![]]),
            ]);
        }
    });
    producer.join().unwrap();

    // One frame per flush, each showing only its own batch
    let mut rasterizer = BoxRasterizer::new(cell());
    let mut frames = Vec::new();
    loop {
        ui.process_queue(&receiver, &mut window, Instant::now());
        if !ui.frame_ready() {
            break;
        }
        build_frame(&mut ui, &mut rasterizer, Instant::now());
        frames.push(ui.grids().grid(1).unwrap().row_text(0));
    }
    assert_eq!(frames, vec!["abc", "def", "ghi"]);
    assert_eq!(window.titles, vec!["abc", "def", "ghi"]);
    assert_eq!(ui.deferred_len(), 0);
}

#[test]
fn test_post_flush_events_wait_for_next_frame() {
    let mut ui = ui();
    let mut window = RecordingWindow::default();
    let mut rasterizer = BoxRasterizer::new(cell());
    let now = Instant::now();
    run(
        &mut ui,
        &mut window,
        vec![vec![
            group("grid_resize", vec![ints(&[1, 2, 1])]),
            group("grid_line", vec![line_call(1, 0, "A")]),
            group("flush", vec![vec![]]),
            group("grid_line", vec![line_call(1, 0, "B")]),
        ]],
        now,
    );

    let frame = build_frame(&mut ui, &mut rasterizer, now);
    assert_eq!(frame.cells[0].text, "A");
    assert_eq!(ui.atlas().get(&GlyphKey::plain("B")), None);

    // The held-back line is applied and stays dirty for the next frame
    run(&mut ui, &mut window, vec![vec![group("flush", vec![vec![]])]], now);
    assert_eq!(ui.grids().grid(1).unwrap().row_text(0), "B");
    let frame = build_frame(&mut ui, &mut rasterizer, now);
    assert_eq!(frame.cells.len(), 1);
    assert_eq!(frame.cells[0].text, "B");
}

#[test]
fn test_atlas_overflow_repaints_from_replay() {
    let mut config = Config::default();
    // Four narrow glyphs per atlas
    config.atlas.width = 16;
    config.atlas.height = 32;
    let mut ui = UiState::new(&config, cell());
    let mut window = RecordingWindow::default();
    let mut rasterizer = BoxRasterizer::new(cell());
    let now = Instant::now();

    let batches = parse_replay(
        r#"
        batches = [
            [["grid_resize", [1, 4, 1]], ["grid_line", [1, 0, 0, [["a"], ["b"], ["c"], ["d"]]]], ["flush", []]],
            [["grid_line", [1, 0, 0, [["e"]]]], ["flush", []]],
        ]
        "#,
    )
    .unwrap();

    run(&mut ui, &mut window, vec![batches[0].clone()], now);
    let first = build_frame(&mut ui, &mut rasterizer, now);
    assert!(!first.atlas_reset);
    assert_eq!(ui.atlas().len(), 4);

    run(&mut ui, &mut window, vec![batches[1].clone()], now);
    let second = build_frame(&mut ui, &mut rasterizer, now);
    assert!(second.atlas_reset);
    assert_eq!(ui.atlas().generation(), 1);
    assert_eq!(second.cells.len(), 4);
    assert!(second.cells.iter().all(|c| c.glyph.is_some()));
    assert_eq!(ui.grids().grid(1).unwrap().row_text(0), "ebcd");
}
