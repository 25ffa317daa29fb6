use reply_helper::store::DEFAULT_CONTACT;
use reply_helper::{HistoryPolicy, Role, SessionStore, Turn};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let mut store = SessionStore::new(&path, HistoryPolicy::default());
    store.push("alice", Role::User, "hi alice");
    store.push("alice", Role::Assistant, "hello!");
    store.push("王芳", Role::User, "在吗");
    store.set_active("alice").unwrap();

    let loaded = SessionStore::load(&path, HistoryPolicy::default());
    assert_eq!(loaded.active(), "alice");
    assert_eq!(
        loaded.history("alice"),
        &[Turn::user("hi alice"), Turn::assistant("hello!")]
    );
    assert_eq!(loaded.history("王芳"), &[Turn::user("在吗")]);
    assert_eq!(loaded.list_contacts(), store.list_contacts());
}

#[test]
fn missing_file_gives_empty_store() {
    let dir = tempdir().unwrap();
    let store = SessionStore::load(dir.path().join("nope.json"), HistoryPolicy::default());
    assert_eq!(store.active(), DEFAULT_CONTACT);
    assert_eq!(store.contacts().collect::<Vec<_>>(), vec![DEFAULT_CONTACT]);
}

#[test]
fn corrupt_file_gives_empty_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(&path, "{ this is not json").unwrap();
    let store = SessionStore::load(&path, HistoryPolicy::default());
    assert_eq!(store.active(), DEFAULT_CONTACT);
    assert!(store.history(DEFAULT_CONTACT).is_empty());
}

#[test]
fn malformed_entries_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let doc = json!({
        "_meta": {"active_person": "bob"},
        "sessions": {
            "bob": [
                ["user", "one"],
                ["system", "you are a bot"],
                ["assistant", {"text": "nested"}],
                ["assistant", "two"]
            ],
            "carol": 17
        }
    });
    std::fs::write(&path, doc.to_string()).unwrap();

    let store = SessionStore::load(&path, HistoryPolicy::default());
    assert_eq!(store.active(), "bob");
    assert_eq!(store.history("bob"), &[Turn::user("one"), Turn::assistant("two")]);
    assert!(!store.contains("carol"));
}

#[test]
fn active_contact_always_has_a_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(
        &path,
        json!({"_meta": {"active_person": "ghost"}, "sessions": {}}).to_string(),
    )
    .unwrap();
    let store = SessionStore::load(&path, HistoryPolicy::default());
    assert_eq!(store.active(), "ghost");
    assert!(store.contains("ghost"));
}

#[test]
fn history_is_bounded_after_every_push() {
    let dir = tempdir().unwrap();
    for max_turns in [0usize, 1, 3, 6] {
        let policy = HistoryPolicy::new(max_turns);
        let mut store = SessionStore::new(dir.path().join("s.json"), policy);
        for i in 0..40 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.push("amy", role, format!("m{i}"));
            assert!(store.history("amy").len() <= (2 * max_turns).max(2));
        }
        let last = store.history("amy").last().unwrap();
        assert_eq!(last.text(), "m39");
    }
}

#[test]
fn load_trims_to_current_policy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    let mut store = SessionStore::new(&path, HistoryPolicy::new(6));
    for i in 0..10 {
        store.push("amy", Role::User, format!("m{i}"));
    }
    store.save().unwrap();

    let smaller = SessionStore::load(&path, HistoryPolicy::new(1));
    let texts: Vec<_> = smaller.history("amy").iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["m8", "m9"]);
}

#[test]
fn save_replaces_file_without_leftovers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("sessions.json");
    let mut store = SessionStore::new(&path, HistoryPolicy::default());
    store.save().unwrap();
    store.set_active("bob").unwrap();

    let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["sessions.json"]);

    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["_meta"]["active_person"], json!("bob"));
    assert_eq!(value["sessions"]["bob"], json!([]));
}
