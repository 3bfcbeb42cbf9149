//! End-to-end flow: edit a game through a session, save it as PGN and
//! reopen it, checking that variations, comments and arrows survive.

use chess_core::arrows::{Arrow, Color, ARROW_MARKER};
use chess_core::database::Database;
use chess_core::movetree::MoveTree;
use chess_core::session::Session;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn temp_pgn(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("session-flow-{}-{name}.pgn", std::process::id()))
}

#[test]
fn annotated_game_survives_save_and_reopen() {
    init_tracing();
    let path = temp_pgn("roundtrip");
    let _ = std::fs::remove_file(&path);

    let mut session = Session::open(&path).unwrap();
    for m in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        session.play_uci(m, false).unwrap();
    }
    // Side line after 2. Nf3: 2... d6 instead of 2... Nc6.
    session.move_back();
    session.play_uci("d7d6", false).unwrap();

    session.set_comment("Philidor setup");
    let arrow = Arrow::new((3, 2), (3, 4), Color::rgba(255, 143, 0, 150));
    assert!(session.draw_arrow(arrow));
    session.save().unwrap();

    let mut reopened = Session::open(&path).unwrap();
    assert_eq!(reopened.database().len(), 1);

    // Main line is intact.
    let end = reopened.tree().mainline_end(MoveTree::ROOT);
    assert_eq!(reopened.tree().ply(end), 4);
    reopened.jump_to(end);
    assert!(reopened.current_fen().contains("2n5"), "Nc6 knight on the board");

    // The side line kept its comment and its arrow.
    let after_nf3 = reopened.tree().path_from_root(end)[3];
    let side = reopened.tree().variations(after_nf3)[1];
    reopened.jump_to(side);
    assert_eq!(reopened.tree().san(side).as_deref(), Some("d6"));
    assert!(reopened.comment().starts_with("Philidor setup"));
    assert!(reopened.comment().contains(ARROW_MARKER));
    assert_eq!(reopened.arrows().into_iter().next(), Some(arrow));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn opening_a_missing_file_starts_a_fresh_game() {
    init_tracing();
    let path = temp_pgn("missing");
    let _ = std::fs::remove_file(&path);

    let session = Session::open(&path).unwrap();
    assert_eq!(session.database().len(), 1);
    assert!(session.tree().is_end(MoveTree::ROOT));
}

#[test]
fn multi_game_database_keeps_games_independent() {
    init_tracing();
    let pgn = "\
[Event \"A\"]
[Result \"*\"]

1. e4 e5 *

[Event \"B\"]
[Result \"*\"]

1. d4 d5 *
";
    let mut session = Session::with_database(Database::from_pgn("multi.pgn", pgn));
    assert_eq!(session.database().len(), 2);

    session.move_forward();
    assert_eq!(session.tree().san(session.current_node()).as_deref(), Some("e4"));

    session.select_game(1).unwrap();
    session.move_forward();
    assert_eq!(session.tree().san(session.current_node()).as_deref(), Some("d4"));

    // Edits in game 1 never leak into game 0.
    session.play_uci("g8f6", false).unwrap();
    session.select_game(0).unwrap();
    let end = session.tree().mainline_end(MoveTree::ROOT);
    assert_eq!(session.tree().ply(end), 2);
}
