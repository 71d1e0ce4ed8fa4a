use std::path::PathBuf;

use super::*;
use crate::config::SessionConfig;
use crate::events::OutboundEvent;
use crate::outbox;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("coderoom-{name}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn import_reads_file_and_infers_language() {
    let dir = scratch_dir("import");
    let path = dir.join("prog.py");
    std::fs::write(&path, "print(1)\n").unwrap();

    let (outbox, mut rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    session.join("r1", "ada").unwrap();

    assert_eq!(import_path(&mut session, &path).unwrap(), Language::Python);
    assert_eq!(session.content(), "print(1)\n");

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    assert_eq!(names, vec!["join", "codeChange", "languageChange"]);
    drop(session);
    assert_eq!(rx.try_recv().ok(), Some(OutboundEvent::LeaveRoom));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn import_missing_file_is_an_io_error() {
    let dir = scratch_dir("missing");
    let (outbox, _rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    session.join("r1", "ada").unwrap();

    let err = import_path(&mut session, dir.join("nope.js")).unwrap_err();
    assert!(matches!(err, FileError::Io(_)));
    assert_eq!(session.content(), "// start code here");

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn import_requires_joined_session() {
    let dir = scratch_dir("notjoined");
    let path = dir.join("Main.java");
    std::fs::write(&path, "class Main {}").unwrap();
    let (outbox, _rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);

    let err = import_path(&mut session, &path).unwrap_err();
    assert!(matches!(err, FileError::Session(SessionError::NotJoined)));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn export_writes_content() {
    let dir = scratch_dir("export");
    let path = dir.join("main.cpp");

    export_path(&path, "int main() {}").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "int main() {}");

    export_path(&path, "").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn export_into_missing_directory_fails() {
    let dir = scratch_dir("export-missing");
    let err = export_path(dir.join("absent").join("code.txt"), "x").unwrap_err();
    assert!(matches!(err, FileError::Io(_)));
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn export_default_uses_default_name() {
    let dir = scratch_dir("export-default");
    let (outbox, _rx) = outbox::channel();
    let mut session = Session::new(SessionConfig::default(), outbox);
    session.join("r1", "ada").unwrap();
    session.edit("let x = 1;").unwrap();

    let path = export_default(&dir, session.export()).unwrap();
    assert_eq!(path, dir.join("code.txt"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "let x = 1;");

    std::fs::remove_dir_all(dir).unwrap();
}
