//! Game container and PGN text round-trip.
//!
//! A `Database` is an ordered sequence of independent games backed by a
//! PGN file. Movetext is parsed with a small hand tokenizer (headers by
//! regex) that understands braces comments and nested variation
//! parentheses, so variation structure and comment text — including the
//! arrow marker region — survive a save/reload cycle unchanged.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::Position as _;

use crate::error::CoreError;
use crate::movetree::{MoveTree, NodeId};
use crate::oracle;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\[(\w+)\s+"([^"]*)"\]"#).expect("tag regex"));

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// One game: a move-variation tree plus its ordered PGN tag pairs.
#[derive(Debug, Clone)]
pub struct Game {
    pub tags: Vec<(String, String)>,
    pub tree: MoveTree,
}

impl Game {
    /// A fresh game with the standard seven tag roster.
    pub fn new() -> Self {
        let tags = [
            ("Event", "?"),
            ("Site", "?"),
            ("Date", "????.??.??"),
            ("Round", "?"),
            ("White", "?"),
            ("Black", "?"),
            ("Result", "*"),
        ];
        Self {
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            tree: MoveTree::new(),
        }
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_tag(&mut self, name: &str, value: &str) {
        match self.tags.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.tags.push((name.to_string(), value.to_string())),
        }
    }

    /// Serialize to PGN: tag section, blank line, movetext with
    /// comments and recursive variations, terminated by the result.
    pub fn to_pgn(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.tags {
            out.push_str(&format!("[{k} \"{v}\"]\n"));
        }
        out.push('\n');

        let mut movetext = String::new();
        let root = self.tree.root();
        let root_comment = self.tree.comment(root);
        if !root_comment.is_empty() {
            movetext.push('{');
            movetext.push_str(root_comment);
            movetext.push_str("} ");
        }
        if let Some(&first) = self.tree.variations(root).first() {
            write_line(&self.tree, first, &mut movetext);
        }
        movetext.push_str(self.tag("Result").unwrap_or("*"));

        out.push_str(&movetext);
        out.push('\n');
        out
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered collection of games backed by a PGN file.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    games: Vec<Game>,
}

impl Database {
    /// Load a database from a PGN file. A missing file starts the
    /// database with exactly one fresh game; any other I/O failure is
    /// surfaced.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        match fs::read_to_string(&path) {
            Ok(text) => {
                let mut games = parse_games(&text);
                if games.is_empty() {
                    games.push(Game::new());
                }
                Ok(Self { path, games })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self {
                path,
                games: vec![Game::new()],
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// An in-memory database parsed from PGN text.
    pub fn from_pgn<P: AsRef<Path>>(path: P, text: &str) -> Self {
        let mut games = parse_games(text);
        if games.is_empty() {
            games.push(Game::new());
        }
        Self {
            path: path.as_ref().to_path_buf(),
            games,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn add(&mut self, game: Game) {
        self.games.push(game);
    }

    pub fn add_default(&mut self) {
        self.games.push(Game::new());
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Bounds-checked access; out of range is a hard error, never a
    /// clamp, so navigation callers can keep their previous selection.
    pub fn get(&self, index: usize) -> Result<&Game, CoreError> {
        self.games.get(index).ok_or(CoreError::GameIndexOutOfRange {
            index,
            len: self.games.len(),
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Game, CoreError> {
        let len = self.games.len();
        self.games
            .get_mut(index)
            .ok_or(CoreError::GameIndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.iter()
    }

    pub fn to_pgn(&self) -> String {
        let mut out = String::new();
        for game in &self.games {
            out.push_str(&game.to_pgn());
            out.push('\n');
        }
        out
    }

    /// Write the database back; `path` overrides the backing file.
    pub fn save(&self, path: Option<&Path>) -> Result<(), CoreError> {
        let target = path.unwrap_or(&self.path);
        fs::write(target, self.to_pgn())?;
        Ok(())
    }
}

/// Parse every game in a PGN stream. Malformed games degrade to
/// whatever prefix parsed cleanly; they never abort the whole load.
pub fn parse_games(text: &str) -> Vec<Game> {
    let mut games = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        let (game, remaining) = parse_game(rest);
        if let Some(game) = game {
            games.push(game);
        }
        if remaining.len() >= rest.len() {
            break;
        }
        rest = remaining.trim_start();
    }
    games
}

fn parse_game(input: &str) -> (Option<Game>, &str) {
    let mut tags: Vec<(String, String)> = Vec::new();
    let mut rest = input;

    // Tag section
    loop {
        rest = rest.trim_start();
        match TAG_RE.captures(rest) {
            Some(caps) => {
                tags.push((caps[1].to_string(), caps[2].to_string()));
                rest = &rest[caps[0].len()..];
            }
            None => break,
        }
    }

    let start = match starting_position(&tags) {
        Ok(pos) => pos,
        Err(e) => {
            tracing::warn!("skipping game with bad FEN tag: {e}");
            return (None, skip_to_next_game(rest));
        }
    };
    let mut tree = MoveTree::with_position(start);
    let (result, remaining) = parse_movetext(&mut tree, rest);

    let mut game = Game { tags, tree };
    if game.tags.is_empty() && game.tree.is_end(game.tree.root()) {
        // Pure noise between games
        return (None, remaining);
    }
    if game.tag("Result").is_none() {
        game.set_tag("Result", result.unwrap_or("*"));
    }
    (Some(game), remaining)
}

fn starting_position(tags: &[(String, String)]) -> Result<shakmaty::Chess, CoreError> {
    let setup = tags.iter().any(|(k, v)| k == "SetUp" && v == "1");
    let fen = tags.iter().find(|(k, _)| k == "FEN").map(|(_, v)| v);
    match fen {
        Some(fen) if setup => oracle::position_from_fen(fen),
        _ => Ok(oracle::start_position()),
    }
}

/// Parse movetext into `tree`, returning the result token (if any) and
/// the unconsumed remainder of the input.
fn parse_movetext<'a>(tree: &mut MoveTree, s: &'a str) -> (Option<&'a str>, &'a str) {
    let mut cur = tree.root();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut result = None;
    let mut i = 0;

    while i < s.len() {
        let c = match s[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }
        match c {
            // A tag line at top level starts the next game.
            '[' if stack.is_empty() => break,
            '(' => {
                // A variation is an alternative to the move just played.
                stack.push(cur);
                if let Some(parent) = tree.parent(cur) {
                    cur = parent;
                }
                i += 1;
            }
            ')' => {
                if let Some(prev) = stack.pop() {
                    cur = prev;
                }
                i += 1;
            }
            '{' => match s[i + 1..].find('}') {
                Some(off) => {
                    append_comment(tree, cur, &s[i + 1..i + 1 + off]);
                    i += off + 2;
                }
                None => {
                    append_comment(tree, cur, &s[i + 1..]);
                    i = s.len();
                }
            },
            ';' => {
                i += s[i..].find('\n').map(|o| o + 1).unwrap_or(s.len() - i);
            }
            '$' => {
                i += 1;
                i += s[i..]
                    .find(|ch: char| !ch.is_ascii_digit())
                    .unwrap_or(s.len() - i);
            }
            _ => {
                let end = i + s[i..]
                    .find(|ch: char| ch.is_whitespace() || "(){};".contains(ch))
                    .unwrap_or(s.len() - i);
                let token = &s[i..end];
                i = end;

                if RESULT_TOKENS.contains(&token) {
                    if stack.is_empty() {
                        result = Some(token);
                        break;
                    }
                    continue;
                }
                if is_move_number(token) {
                    continue;
                }
                let clean = token.trim_end_matches(['!', '?']);
                if clean.is_empty() {
                    continue;
                }
                match oracle::move_from_san(tree.board(cur), clean) {
                    Ok(mv) => {
                        cur = if tree.has_variation(cur, &mv) {
                            match tree.variation(cur, &mv) {
                                Ok(child) => child,
                                Err(_) => break,
                            }
                        } else {
                            match tree.add_variation(cur, mv) {
                                Ok(child) => child,
                                Err(e) => {
                                    tracing::warn!("dropping rest of game: {e}");
                                    return (None, skip_to_next_game(&s[i..]));
                                }
                            }
                        };
                    }
                    Err(e) => {
                        tracing::warn!("unreadable movetext token '{token}': {e}");
                        return (None, skip_to_next_game(&s[i..]));
                    }
                }
            }
        }
    }

    (result, &s[i.min(s.len())..])
}

/// After a malformed token, resync at the next tag section.
fn skip_to_next_game(s: &str) -> &str {
    match s.find("\n[") {
        Some(idx) => &s[idx + 1..],
        None => "",
    }
}

fn append_comment(tree: &mut MoveTree, id: NodeId, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let existing = tree.comment(id);
    if existing.is_empty() {
        tree.set_comment(id, text.to_string());
    } else {
        tree.set_comment(id, format!("{existing} {text}"));
    }
}

fn is_move_number(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Emit the line starting at `first`: each main move, then its sibling
/// variations in parentheses, then the continuation.
fn write_line(tree: &MoveTree, first: NodeId, out: &mut String) {
    let mut cur = first;
    let mut force_number = true;
    loop {
        emit_move(tree, cur, out, force_number);
        force_number = !tree.comment(cur).is_empty();

        if let Some(parent) = tree.parent(cur) {
            let siblings = tree.variations(parent);
            if siblings.first() == Some(&cur) && siblings.len() > 1 {
                for &alt in &siblings[1..] {
                    out.push('(');
                    write_line(tree, alt, out);
                    if out.ends_with(' ') {
                        out.pop();
                    }
                    out.push_str(") ");
                }
                force_number = true;
            }
        }

        match tree.variations(cur).first() {
            Some(&next) => cur = next,
            None => break,
        }
    }
}

fn emit_move(tree: &MoveTree, id: NodeId, out: &mut String, force_number: bool) {
    let Some(parent) = tree.parent(id) else {
        return;
    };
    let pos = tree.board(parent);
    if oracle::white_to_move(pos) {
        out.push_str(&format!("{}. ", pos.fullmoves()));
    } else if force_number {
        out.push_str(&format!("{}... ", pos.fullmoves()));
    }
    if let Some(san) = tree.san(id) {
        out.push_str(&san);
        out.push(' ');
    }
    let comment = tree.comment(id);
    if !comment.is_empty() {
        out.push('{');
        out.push_str(comment);
        out.push_str("} ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Position;

    const RUY: &str = r#"[Event "Test"]
[White "A"]
[Black "B"]
[Result "*"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 (4. Bxc6 {the exchange} dxc6 5. d4 exd4)
4... Nf6 5. d3 b5 6. Bb3 *
"#;

    #[test]
    fn test_parse_tags_and_moves() {
        let games = parse_games(RUY);
        assert_eq!(games.len(), 1);
        let game = &games[0];
        assert_eq!(game.tag("White"), Some("A"));

        let tree = &game.tree;
        let mut cur = tree.root();
        for _ in 0..6 {
            cur = tree.variations(cur)[0];
        }
        // After 3... a6 both bishop retreats exist; Ba4 is main.
        assert_eq!(tree.variations(cur).len(), 2);
        assert_eq!(tree.san(tree.variations(cur)[0]).as_deref(), Some("Ba4"));
        assert_eq!(tree.san(tree.variations(cur)[1]).as_deref(), Some("Bxc6"));
        assert_eq!(
            tree.comment(tree.variations(cur)[1]),
            "the exchange"
        );

        // The main line runs to 6. Bb3.
        let end = tree.mainline_end(tree.root());
        assert_eq!(tree.san(end).as_deref(), Some("Bb3"));
        assert_eq!(tree.ply(end), 11);
    }

    #[test]
    fn test_round_trip_structure_and_comments() {
        let games = parse_games(RUY);
        let pgn = games[0].to_pgn();
        let reparsed = parse_games(&pgn);
        assert_eq!(reparsed.len(), 1);

        let a = &games[0].tree;
        let b = &reparsed[0].tree;
        assert_eq!(a.ply(a.mainline_end(a.root())), b.ply(b.mainline_end(b.root())));

        // The variation and its comment survive verbatim.
        let mut cur = b.root();
        for _ in 0..6 {
            cur = b.variations(cur)[0];
        }
        assert_eq!(b.comment(b.variations(cur)[1]), "the exchange");
    }

    #[test]
    fn test_arrow_comment_region_round_trips() {
        let mut game = Game::new();
        let root = game.tree.root();
        let mv = oracle::move_from_san(game.tree.board(root), "e4").unwrap();
        let node = game.tree.add_variation(root, mv).unwrap();
        let comment = "plan Arrows: Arrow((4, 6), (4, 4), (255, 143, 0, 150))";
        game.tree.set_comment(node, comment.to_string());

        let reparsed = parse_games(&game.to_pgn());
        let tree = &reparsed[0].tree;
        let first = tree.variations(tree.root())[0];
        assert_eq!(tree.comment(first), comment);
    }

    #[test]
    fn test_multi_game_stream() {
        let text = format!("{RUY}\n[Event \"Second\"]\n\n1. d4 d5 1/2-1/2\n");
        let games = parse_games(&text);
        assert_eq!(games.len(), 2);
        assert_eq!(games[1].tag("Event"), Some("Second"));
        assert_eq!(games[1].tag("Result"), Some("1/2-1/2"));
    }

    #[test]
    fn test_malformed_game_degrades_not_aborts() {
        let text = format!("[Event \"Bad\"]\n\n1. e4 Zz9 e5\n{RUY}");
        let games = parse_games(&text);
        // The bad game keeps its clean prefix; the next one still loads.
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].tag("Event"), Some("Bad"));
        assert_eq!(games[0].tree.ply(games[0].tree.mainline_end(games[0].tree.root())), 1);
        assert_eq!(games[1].tag("Event"), Some("Test"));
    }

    #[test]
    fn test_fen_tag_start_position() {
        let text = r#"[Event "Endgame"]
[SetUp "1"]
[FEN "8/8/8/8/8/4k3/4p3/4K3 b - - 0 1"]

1... Kd3 2. Kf2 *
"#;
        let games = parse_games(text);
        assert_eq!(games.len(), 1);
        let tree = &games[0].tree;
        assert!(!oracle::white_to_move(tree.board(tree.root())));
        assert_eq!(tree.ply(tree.mainline_end(tree.root())), 2);
    }

    #[test]
    fn test_empty_game_round_trip() {
        let game = Game::new();
        let pgn = game.to_pgn();
        assert!(pgn.contains("[Event \"?\"]"));
        assert!(pgn.trim_end().ends_with('*'));
        let reparsed = parse_games(&pgn);
        assert_eq!(reparsed.len(), 1);
        assert!(reparsed[0].tree.is_end(reparsed[0].tree.root()));
    }

    #[test]
    fn test_black_to_move_numbering() {
        let games = parse_games(RUY);
        let pgn = games[0].to_pgn();
        // The move after the variation closes repeats the number.
        assert!(pgn.contains("4... Nf6"), "got: {pgn}");
        // A comment interrupts the pair, so the black move repeats the
        // number inside the variation.
        assert!(pgn.contains("(4. Bxc6 {the exchange} 4... dxc6 5. d4 exd4)"), "got: {pgn}");
    }

    #[test]
    fn test_fullmove_counter_in_output() {
        let games = parse_games(RUY);
        let tree = &games[0].tree;
        let first = tree.variations(tree.root())[0];
        assert_eq!(tree.board(first).fullmoves().get(), 1);
    }
}
