// File: tests/extract_behavior.rs
use chrono::NaiveDate;
use kancal::model::{TaskRecord, extract};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn find<'a>(tasks: &'a [TaskRecord], description: &str) -> &'a TaskRecord {
    tasks
        .iter()
        .find(|t| t.description == description)
        .unwrap_or_else(|| panic!("no task '{}' in {:#?}", description, tasks))
}

#[test]
fn test_inline_metadata() {
    let text = "- [ ] Call the bank #finance @{2024-03-04} @@10:15\n";
    let tasks = extract(text, "Board.md");

    assert_eq!(tasks.len(), 1);
    let t = &tasks[0];
    assert_eq!(t.description, "Call the bank");
    assert_eq!(t.date, d(2024, 3, 4));
    assert_eq!(t.tags, vec!["#finance"]);
    assert_eq!(t.time.as_ref().unwrap().display, "10:15");
    assert!(!t.completed);
    assert_eq!(t.source, "Board.md");
}

#[test]
fn test_undated_items_are_dropped() {
    let text = "## Todo\n- [ ] Someday\n- [ ] Dated @{2024-01-10}\n- [x] Also undated\n";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "Dated");
}

#[test]
fn test_completed_marker() {
    let tasks = extract("- [x] Done thing @{2024-01-01}", "b.md");
    assert!(tasks[0].completed);
    assert_eq!(tasks[0].description, "Done thing");

    let upper = extract("- [X] Shouted @{2024-01-01}", "b.md");
    assert!(upper[0].completed);
    assert_eq!(upper[0].description, "Shouted");
}

#[test]
fn test_subtask_inherits_parent_date_and_tags() {
    let text = "\
- [ ] Quarterly review #work @{2024-03-01}
    - [ ] Collect numbers
\t- [ ] Draft slides #slides
";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 3);

    let numbers = find(&tasks, "Collect numbers");
    assert_eq!(numbers.date, d(2024, 3, 1));
    assert!(numbers.tags.contains(&"#work".to_string()));

    let slides = find(&tasks, "Draft slides");
    assert_eq!(slides.date, d(2024, 3, 1));
    assert_eq!(slides.tags, vec!["#slides", "#work"]);
}

#[test]
fn test_subtask_own_date_wins_but_tags_accumulate() {
    let text = "- [ ] Trip #travel @{2024-07-01}\n    - [ ] Book hotel #admin @{2024-06-01}\n";
    let tasks = extract(text, "b.md");
    let hotel = find(&tasks, "Book hotel");
    assert_eq!(hotel.date, d(2024, 6, 1));
    assert_eq!(hotel.tags, vec!["#admin", "#travel"]);
}

#[test]
fn test_inherited_tags_are_not_duplicated() {
    let text = "- [ ] Parent #work @{2024-03-01}\n    - [ ] Child #work\n";
    let tasks = extract(text, "b.md");
    assert_eq!(find(&tasks, "Child").tags, vec!["#work"]);
}

#[test]
fn test_new_top_level_task_resets_parent_context() {
    let text = "\
- [ ] First #a @{2024-01-01}
- [ ] Second
    - [ ] Orphan child
";
    let tasks = extract(text, "b.md");
    // "Second" has no date, so its child has nothing to inherit
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "First");
}

#[test]
fn test_metadata_on_following_line() {
    let text = "\
- [ ] **Water plants**
    #home @{2024-05-20} @@{08:00-08:30}
";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 1);
    let t = &tasks[0];
    assert_eq!(t.description, "Water plants");
    assert_eq!(t.date, d(2024, 5, 20));
    assert_eq!(t.tags, vec!["#home"]);
    let time = t.time.as_ref().unwrap();
    assert_eq!(time.start, "08:00");
    assert_eq!(time.end.as_deref(), Some("08:30"));
}

#[test]
fn test_lookahead_boundary() {
    // Date three lines below: still attached
    let within = "- [ ] Near\nnote\nnote\n@{2024-02-02}\n";
    let tasks = extract(within, "b.md");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].date, d(2024, 2, 2));

    // Date four lines below: out of reach
    let beyond = "- [ ] Far\nnote\nnote\nnote\n@{2024-02-02}\n";
    assert!(extract(beyond, "b.md").is_empty());
}

#[test]
fn test_lookahead_skips_unrelated_line() {
    let text = "- [ ] Pay rent\nsee the lease for details\n  @{2024-04-01} #bills\n";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].date, d(2024, 4, 1));
    assert_eq!(tasks[0].tags, vec!["#bills"]);
}

#[test]
fn test_metadata_never_jumps_over_next_task() {
    let text = "- [ ] Undated\n- [ ] Dated\n  @{2024-04-01}\n";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "Dated");
}

#[test]
fn test_time_range_and_single_time() {
    let tasks = extract(
        "- [ ] Workshop @{2024-01-05} @@09:00-11:30\n- [ ] Standup @{2024-01-05} @@09:30\n",
        "b.md",
    );
    let workshop = find(&tasks, "Workshop").time.clone().unwrap();
    assert_eq!(workshop.display, "09:00-11:30");
    assert_eq!(workshop.start, "09:00");
    assert_eq!(workshop.end.as_deref(), Some("11:30"));

    let standup = find(&tasks, "Standup");
    assert_eq!(standup.start_time(), Some("09:30"));
    assert_eq!(standup.end_time(), None);
}

#[test]
fn test_braced_time_is_read_too() {
    let tasks = extract("- [ ] Dentist @{2024-01-05} @@{16:00}", "b.md");
    assert_eq!(tasks[0].time.as_ref().unwrap().display, "16:00");
    assert_eq!(tasks[0].description, "Dentist");
}

#[test]
fn test_emphasis_is_stripped() {
    let tasks = extract("- [ ] **Bold** *it* __under__ @{2024-01-05}", "b.md");
    assert_eq!(tasks[0].description, "Bold it under");
}

#[test]
fn test_tag_prefix_is_cut_from_longer_words() {
    // Known limitation of text-based tag removal
    let tasks = extract("- [ ] Prep #work workshop #workshop @{2024-01-05}", "b.md");
    let t = &tasks[0];
    assert_eq!(t.tags, vec!["#work", "#workshop"]);
    assert!(!t.description.contains('#'));
}

#[test]
fn test_linked_note_and_list_name() {
    let text = "\
## Backlog
- [ ] Read [[Design Doc|doc]] @{2024-02-01}

## Doing
- [ ] Write code @{2024-02-02}
";
    let tasks = extract(text, "b.md");
    let read = find(&tasks, "Read [[Design Doc|doc]]");
    assert_eq!(read.linked_note.as_deref(), Some("Design Doc"));
    assert_eq!(read.list_name.as_deref(), Some("Backlog"));
    assert_eq!(find(&tasks, "Write code").list_name.as_deref(), Some("Doing"));
}

#[test]
fn test_invalid_calendar_date_is_not_a_date() {
    assert!(extract("- [ ] Nope @{2024-02-30}", "b.md").is_empty());
}

#[test]
fn test_ids_are_deterministic_across_parses() {
    let text = "## Todo\n- [ ] One @{2024-01-01}\n- [ ] Two @{2024-01-02}\n";
    let first = extract(text, "b.md");
    let second = extract(text, "b.md");
    assert_eq!(first, second);

    // Unrelated text before the tasks does not change their ids
    let shifted = format!("# Title\n\nSome intro.\n{}", text);
    let third = extract(&shifted, "b.md");
    let ids = |v: &[TaskRecord]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&third));
    assert_ne!(first[0].id, first[1].id);
}

#[test]
fn test_crlf_documents() {
    let text = "## Todo\r\n- [ ] Windows task @{2024-01-01} @@10:00\r\n";
    let tasks = extract(text, "b.md");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].description, "Windows task");
    assert_eq!(tasks[0].list_name.as_deref(), Some("Todo"));
}
