use super::*;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn default_is_empty() {
    assert!(Presence::default().members().is_empty());
}

#[test]
fn membership_event_replaces_snapshot() {
    let mut presence = Presence::default();
    presence.on_membership_event(names(&["ada", "grace"]));
    presence.on_membership_event(names(&["linus"]));
    assert_eq!(presence.members(), names(&["linus"]).as_slice());
    assert!(!presence.contains("ada"));
}

#[test]
fn order_and_duplicates_are_kept() {
    let mut presence = Presence::default();
    presence.on_membership_event(names(&["grace", "ada", "grace"]));
    assert_eq!(presence.members(), names(&["grace", "ada", "grace"]).as_slice());
}

#[test]
fn empty_event_clears_everyone() {
    let mut presence = Presence::default();
    presence.on_membership_event(names(&["ada"]));
    presence.on_membership_event(Vec::new());
    assert!(presence.members().is_empty());
}

#[test]
fn clear_resets_snapshot() {
    let mut presence = Presence::default();
    presence.on_membership_event(names(&["ada"]));
    presence.clear();
    assert_eq!(presence, Presence::default());
}
