//! Integration tests for the global history list.

mod common;

use std::rc::Rc;

use navquill::host::Subscription;
use navquill::matcher::IdentityMatcher;
use navquill::model::{EditorHandle, EditorKind, EditorRef, ResourceDescriptor};
use navquill::service::{ExclusionFilter, GlobalHistory, HydrationState};
use navquill::store::{encode_entries, PersistedEntry};

use common::{res, MockWorkspace, TestEditor};

fn descriptor(resource: &str) -> EditorRef {
    EditorRef::Descriptor(ResourceDescriptor::with_kind(
        res(resource),
        EditorKind::new("text"),
    ))
}

fn filter(patterns: &[&str]) -> ExclusionFilter {
    let workspace = MockWorkspace::with_fallback_excludes(patterns);
    let filter = ExclusionFilter::build(&*workspace.borrow());
    filter
}

fn history(patterns: &[&str]) -> GlobalHistory {
    GlobalHistory::new(200, filter(patterns))
}

fn add(history: &mut GlobalHistory, matcher: &IdentityMatcher, editor: EditorRef) {
    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();
    history.add(editor, matcher, &mut watch);
}

fn paths(history: &GlobalHistory) -> Vec<String> {
    history
        .entries()
        .iter()
        .map(|e| e.resource().unwrap().path().to_string())
        .collect()
}

#[test]
fn test_add_promotes_and_dedups() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&[]);

    add(&mut history, &matcher, descriptor("file:///a.rs"));
    add(&mut history, &matcher, descriptor("file:///b.rs"));
    add(&mut history, &matcher, descriptor("file:///a.rs"));

    assert_eq!(paths(&history), vec!["/a.rs", "/b.rs"]);
}

#[test]
fn test_overflow_drops_tail() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&[]);

    for i in 0..201u64 {
        add(&mut history, &matcher, descriptor(&format!("file:///f{i}.rs")));
    }

    assert_eq!(history.len(), 200);
    // The oldest entry (f0) fell off the tail.
    assert_eq!(history.entries()[0].resource().unwrap().path(), "/f200.rs");
    assert_eq!(history.entries()[199].resource().unwrap().path(), "/f1.rs");
}

#[test]
fn test_hydration_prefers_live_editors() {
    let mut history = history(&[]);
    let payload = encode_entries(&[
        PersistedEntry {
            editor: ResourceDescriptor::with_kind(res("file:///b.rs"), EditorKind::new("text")),
        },
        PersistedEntry {
            editor: ResourceDescriptor::with_kind(res("file:///c.rs"), EditorKind::new("text")),
        },
    ])
    .unwrap();

    let live = vec![descriptor("file:///a.rs"), descriptor("file:///b.rs")];
    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();
    history.ensure_loaded(live, Some(payload), &mut watch);

    // Live editors lead; persisted entries fill gaps at the tail and
    // are not promoted above them.
    assert_eq!(history.state(), HydrationState::Ready);
    assert_eq!(paths(&history), vec!["/a.rs", "/b.rs", "/c.rs"]);
}

#[test]
fn test_hydration_runs_once() {
    let mut history = history(&[]);
    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();

    history.ensure_loaded(vec![descriptor("file:///a.rs")], None, &mut watch);
    history.ensure_loaded(vec![descriptor("file:///z.rs")], None, &mut watch);

    assert_eq!(paths(&history), vec!["/a.rs"]);
}

#[test]
fn test_duplicated_payload_record_hydrates_once() {
    let mut history = history(&[]);
    let record = PersistedEntry {
        editor: ResourceDescriptor::with_kind(res("file:///a.rs"), EditorKind::new("text")),
    };
    let payload = encode_entries(&[record.clone(), record]).unwrap();

    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();
    history.ensure_loaded(Vec::new(), Some(payload), &mut watch);

    assert_eq!(history.len(), 1);
}

#[test]
fn test_unparseable_payload_treated_as_empty() {
    let mut history = history(&[]);
    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();

    history.ensure_loaded(
        vec![descriptor("file:///a.rs")],
        Some("{definitely not a history payload".to_string()),
        &mut watch,
    );

    assert_eq!(paths(&history), vec!["/a.rs"]);
}

#[test]
fn test_excluded_resources_never_added() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&["/tmp/*"]);

    add(&mut history, &matcher, descriptor("file:///tmp/scratch.txt"));
    add(&mut history, &matcher, descriptor("file:///home/x.rs"));

    assert_eq!(paths(&history), vec!["/home/x.rs"]);
}

#[test]
fn test_refilter_prunes_newly_excluded() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&[]);

    add(&mut history, &matcher, descriptor("file:///tmp/scratch.txt"));
    add(&mut history, &matcher, descriptor("file:///home/x.rs"));
    assert_eq!(history.len(), 2);

    history.refilter(filter(&["/tmp/*"]));

    assert_eq!(paths(&history), vec!["/home/x.rs"]);
}

#[test]
fn test_serialize_skips_live_only_entries() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&[]);
    let live = TestEditor::text(1, "preview:///scratch");

    add(&mut history, &matcher, descriptor("file:///a.rs"));
    add(
        &mut history,
        &matcher,
        EditorRef::Handle(live as Rc<dyn EditorHandle>),
    );

    let persisted = history.serialize_entries();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].editor.resource.path(), "/a.rs");
}

#[test]
fn test_remove_handle_releases_subscription() {
    let matcher = IdentityMatcher::new();
    let mut history = history(&[]);
    let live = TestEditor::text(7, "preview:///scratch");

    let mut watch = |_: &Rc<dyn EditorHandle>| Subscription::noop();
    history.add(
        EditorRef::Handle(Rc::clone(&live) as Rc<dyn EditorHandle>),
        &matcher,
        &mut watch,
    );
    assert_eq!(history.watched_handles(), 1);

    history.remove_handle(live.id);
    assert!(history.is_empty());
    assert_eq!(history.watched_handles(), 0);
}
