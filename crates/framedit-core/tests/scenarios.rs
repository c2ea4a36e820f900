use framedit_config::EditorConfig;
use framedit_core::{EditorError, EditorId, FrameEditor, LineHandle, Runtime};
use framedit_dom::{Document, NodeId};
use framedit_host::{GutterPhase, Placement, cells_for};
use framedit_text::LineError;

fn config(content: &str, line_numbers: bool) -> EditorConfig {
    EditorConfig {
        content: Some(content.to_string()),
        line_numbers,
        height: "100px".into(),
        ..EditorConfig::default()
    }
}

fn started(runtime: &mut Runtime, config: EditorConfig) -> EditorId {
    let body = runtime.page().body();
    let id = runtime.create(Placement::Append(body), config).unwrap();
    runtime.mark_loaded(id).unwrap();
    runtime.init(id, None).unwrap();
    id
}

fn numbered_lines(count: usize) -> String {
    (1..=count)
        .map(|n| format!("line {n}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn labels(page: &Document, cells: &[NodeId]) -> Vec<String> {
    cells.iter().map(|&cell| page.text_content(cell)).collect()
}

fn frame_body_height(runtime: &mut Runtime, id: EditorId) -> f32 {
    runtime.reflow();
    let doc = runtime.editor(id).unwrap().host().document();
    doc.offset_height(doc.body())
}

#[tokio::test(start_paused = true)]
async fn walks_lines_in_both_directions() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("a\nb\nc", false));
    let editor = runtime.editor(id).unwrap();

    let first = editor.first_line();
    let second = editor.next_line(first);
    let third = editor.next_line(second);
    assert_eq!(editor.line_content(first).unwrap(), "a");
    assert_eq!(editor.line_content(second).unwrap(), "b");
    assert_eq!(editor.line_content(third).unwrap(), "c");
    assert_eq!(editor.last_line(), third);
    assert_eq!(editor.next_line(third), LineHandle::INVALID);
    assert_eq!(editor.prev_line(first), LineHandle::INVALID);
    assert_eq!(editor.prev_line(third), second);

    for handle in [first, second, third] {
        assert_ne!(handle, LineHandle::INVALID);
        assert_eq!(editor.nth_line(editor.line_number(handle)), handle);
    }
    assert_eq!(editor.line_number(LineHandle::INVALID), 0);
    assert_eq!(editor.nth_line(4), LineHandle::INVALID);
}

#[tokio::test(start_paused = true)]
async fn empty_document_has_no_lines() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("", false));
    let editor = runtime.editor(id).unwrap();

    assert_eq!(editor.first_line(), LineHandle::INVALID);
    assert_eq!(editor.last_line(), LineHandle::INVALID);
    assert_eq!(editor.current_line(), 0);
    assert!(matches!(
        editor.line_content(LineHandle::INVALID),
        Err(EditorError::Line(LineError::InvalidHandle))
    ));
}

#[tokio::test(start_paused = true)]
async fn replacing_the_document_invalidates_handles() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("a\nb", false));
    let editor = runtime.editor_mut(id).unwrap();
    let old = editor.first_line();

    editor.set_code("x\ny").unwrap();
    assert!(matches!(
        editor.line_content(old),
        Err(EditorError::Line(LineError::StaleHandle(handle))) if handle == old
    ));
    assert_eq!(editor.line_content(editor.first_line()).unwrap(), "x");
}

#[tokio::test(start_paused = true)]
async fn jump_and_edit_by_line() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("one\ntwo\nthree", false));
    let editor = runtime.editor_mut(id).unwrap();

    editor.jump_to_line(2).unwrap();
    assert_eq!(editor.current_line(), 2);
    assert!(editor.host().document().has_focus());

    editor.replace_selection("2: ").unwrap();
    assert_eq!(editor.get_code(), "one\n2: two\nthree");

    let third = editor.nth_line(3);
    editor.set_line_content(third, "3").unwrap();
    editor.insert_into_line(third, 0, "#").unwrap();
    assert_eq!(editor.get_code(), "one\n2: two\n#3");
}

#[tokio::test(start_paused = true)]
async fn jumping_past_the_end_keeps_the_selection() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("one\ntwo", false));
    let editor = runtime.editor_mut(id).unwrap();
    editor.jump_to_line(2).unwrap();

    editor.jump_to_line(5).unwrap();
    assert_eq!(editor.current_line(), 2);
    editor.jump_to_line(0).unwrap();
    assert_eq!(editor.current_line(), 2);
}

#[tokio::test(start_paused = true)]
async fn search_and_replace_through_the_editor() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("foo bar\nbar foo", false));
    let editor = runtime.editor_mut(id).unwrap();

    let mut cursor = editor.get_search_cursor("foo", false);
    let mut replaced = 0;
    while editor.find_next(&mut cursor) {
        assert!(editor.replace_match(&mut cursor, "baz").unwrap());
        replaced += 1;
    }
    assert_eq!(replaced, 2);
    assert_eq!(editor.get_code(), "baz bar\nbar baz");

    let mut cursor = editor.get_search_cursor("bar", false);
    assert!(editor.find_next(&mut cursor));
    assert!(editor.select_match(&cursor).unwrap());
    assert_eq!(editor.selection(), "bar");
}

#[tokio::test(start_paused = true)]
async fn edits_far_apart_undo_separately() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config("start", false));

    let line = runtime.editor(id).unwrap().first_line();
    runtime
        .editor_mut(id)
        .unwrap()
        .insert_into_line(line, 5, " one")
        .unwrap();
    runtime.advance(1_000).await.unwrap();
    runtime
        .editor_mut(id)
        .unwrap()
        .insert_into_line(line, 9, " two")
        .unwrap();

    let editor = runtime.editor_mut(id).unwrap();
    assert_eq!(editor.history_size().undo, 2);
    assert!(editor.undo().unwrap());
    assert_eq!(editor.get_code(), "start one");
    assert!(editor.redo().unwrap());
    assert_eq!(editor.get_code(), "start one two");
}

#[tokio::test(start_paused = true)]
async fn gutter_covers_the_content_and_grows_with_it() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config(&numbered_lines(10), true));
    runtime.advance(0).await.unwrap();

    let body_height = frame_body_height(&mut runtime, id);
    let gutter = runtime.editor(id).unwrap().host().gutter().unwrap();
    let metrics = gutter.metrics().unwrap();
    assert_eq!(metrics.line_height, 16.0);
    let before = gutter.cell_count();
    assert_eq!(
        before,
        cells_for(20.0 + body_height.max(100.0) - metrics.top_offset, 10.0)
    );
    let scroller = gutter.scroller().unwrap();

    let more = format!("{}\n{}", numbered_lines(10), numbered_lines(15));
    runtime.editor_mut(id).unwrap().set_code(&more).unwrap();
    let grown = frame_body_height(&mut runtime, id);
    assert!(grown > body_height);
    let prior = runtime.page().offset_height(scroller);

    runtime.advance(500).await.unwrap();
    let gutter = runtime.editor(id).unwrap().host().gutter().unwrap();
    let added = cells_for(20.0 + grown.max(100.0) - prior, 10.0);
    assert!(added > 0);
    assert_eq!(gutter.cell_count(), before + added);
    assert_eq!(gutter.next_number(), (before + added) as u64 + 1);

    let labels = labels(runtime.page(), gutter.cells());
    assert!(labels
        .iter()
        .zip(1u64..)
        .all(|(label, number)| *label == number.to_string()));
}

#[tokio::test(start_paused = true)]
async fn gutter_never_shrinks() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config(&numbered_lines(30), true));
    runtime.advance(0).await.unwrap();
    let before = runtime
        .editor(id)
        .unwrap()
        .host()
        .gutter()
        .unwrap()
        .cell_count();

    runtime.editor_mut(id).unwrap().set_code("short").unwrap();
    runtime.advance(2_000).await.unwrap();
    let gutter = runtime.editor(id).unwrap().host().gutter().unwrap();
    assert_eq!(gutter.cell_count(), before);
    assert_eq!(gutter.next_number(), before as u64 + 1);
}

#[tokio::test(start_paused = true)]
async fn gutter_follows_frame_scrolling() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config(&numbered_lines(40), true));
    runtime.advance(0).await.unwrap();

    runtime.scroll_frame(id, 64.0).unwrap();
    let numbers = runtime
        .editor(id)
        .unwrap()
        .host()
        .gutter()
        .unwrap()
        .nodes()
        .numbers;
    assert_eq!(runtime.page().scroll_top(numbers), 64.0);
}

#[tokio::test(start_paused = true)]
async fn gutter_waits_for_lazy_style_sheets() {
    let mut page = Document::new();
    page.set_style_sheets_live(false);
    let mut runtime = Runtime::with_page(page).unwrap();
    let id = started(&mut runtime, config(&numbered_lines(5), true));

    runtime.advance(120).await.unwrap();
    let gutter = runtime.editor(id).unwrap().host().gutter().unwrap();
    assert_eq!(gutter.phase(), GutterPhase::Uninitialized);
    assert_eq!(gutter.style_retries(), 3);
    assert_eq!(gutter.cell_count(), 0);

    runtime.page_mut().set_style_sheets_live(true);
    runtime.advance(150).await.unwrap();
    let gutter = runtime.editor(id).unwrap().host().gutter().unwrap();
    assert!(gutter.is_active());
    assert!(gutter.cell_count() > 0);
    assert_eq!(runtime.page().style_sheet_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn text_field_round_trip() {
    let mut runtime = Runtime::new().unwrap();
    let page = runtime.page_mut();
    let form = page.create_element("form");
    let area = page.create_element("textarea");
    let value = page.create_text("hello");
    page.append_child(area, value).unwrap();
    page.append_child(form, area).unwrap();
    let body = page.body();
    page.append_child(body, form).unwrap();

    let config = EditorConfig {
        line_numbers: true,
        ..EditorConfig::default()
    };
    let id = runtime.from_text_field(area, config).unwrap();
    runtime.mark_loaded(id).unwrap();
    runtime
        .init(
            id,
            Some(Box::new(|editor: &mut FrameEditor| {
                let line = editor.first_line();
                editor.select_lines(line, 5, None).unwrap();
            })),
        )
        .unwrap();
    assert_eq!(runtime.editor(id).unwrap().get_code(), "hello");

    runtime
        .editor_mut(id)
        .unwrap()
        .replace_selection(", world")
        .unwrap();
    assert_eq!(runtime.submit_form(form).unwrap(), 1);
    assert_eq!(runtime.page().text_content(area), "hello, world");
}

#[tokio::test(start_paused = true)]
async fn disposed_editor_stops_and_leaves_the_page() {
    let mut runtime = Runtime::new().unwrap();
    let id = started(&mut runtime, config(&numbered_lines(5), true));
    assert!(runtime.pending_timers() > 0);
    let outer = runtime.editor(id).unwrap().host().outer();

    runtime.dispose(id).unwrap();
    assert_eq!(runtime.pending_timers(), 0);
    assert!(!runtime.page().is_connected(outer));
    assert_eq!(runtime.advance(10_000).await.unwrap(), 0);
    assert!(runtime.editor(id).is_err());
}
