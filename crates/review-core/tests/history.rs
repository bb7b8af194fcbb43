use review_core::EditHistory;

#[test]
fn test_undo_redo_round_trip() {
    let mut history = EditHistory::new(50);
    history.save_state("A");
    history.save_state("AB");
    history.save_state("ABC");

    assert_eq!(history.undo(), Some("AB"));
    assert_eq!(history.undo(), Some("A"));
    assert_eq!(history.undo(), None);
    assert_eq!(history.current(), Some("A"));

    assert_eq!(history.redo(), Some("AB"));
    history.save_state("ABX");
    assert_eq!(history.redo(), None);
    assert_eq!(history.current(), Some("ABX"));

    assert_eq!(history.undo(), Some("AB"));
    assert_eq!(history.undo(), Some("A"));
}

#[test]
fn test_cap_drops_oldest_snapshot() {
    let mut history = EditHistory::new(50);
    for i in 0..=50 {
        history.save_state(&format!("state {i}"));
    }
    assert_eq!(history.len(), 50);
    assert_eq!(history.current(), Some("state 50"));

    let mut last = None;
    for _ in 0..49 {
        let content = history.undo().map(str::to_string);
        assert!(content.is_some());
        assert_ne!(content.as_deref(), Some("state 0"));
        last = content;
    }
    assert_eq!(last.as_deref(), Some("state 1"));
    assert!(!history.can_undo());
    assert_eq!(history.undo(), None);
}

#[test]
fn test_state_reports_position() {
    let mut history = EditHistory::new(3);
    history.save_state("one");
    history.save_state("two");

    let state = history.state();
    assert!(state.can_undo);
    assert!(!state.can_redo);
    assert_eq!(state.depth, 2);
    assert_eq!(state.position, Some(1));

    history.undo();
    let state = history.state();
    assert!(!state.can_undo);
    assert!(state.can_redo);
    assert_eq!(state.position, Some(0));
}

#[test]
fn test_redo_branch_discarded_even_when_full() {
    let mut history = EditHistory::new(2);
    history.save_state("a");
    history.save_state("b");
    history.undo();
    history.save_state("c");

    assert_eq!(history.len(), 2);
    assert_eq!(history.undo(), Some("a"));
    assert_eq!(history.redo(), Some("c"));
    assert_eq!(history.redo(), None);
}
