//! Catalog discovery, loading and validation.
//!
//! Packs are `packs/*.toml`, games are `packs/games/*.toml`. Everything
//! is validated up front so the session never has to re-check content
//! invariants at play time.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::types::{
    EscapeDef, GameContent, GameDef, GameFile, GameKind, GamePack, PackFile, SimpleDef, WheelDef,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("bad glob pattern for {0}")]
    Pattern(String),

    #[error("duplicate game id '{0}'")]
    DuplicateGame(String),

    #[error("duplicate pack id '{0}'")]
    DuplicatePack(String),

    #[error("pack '{0}' lists no games")]
    EmptyPack(String),

    #[error("pack '{pack}' references unknown game '{game}'")]
    UnknownGameRef { pack: String, game: String },

    #[error("game '{0}' has kind '{1}' but no matching content section")]
    MissingContent(String, &'static str),

    #[error("escape room '{game}': room '{room}' answer index {index} out of range (has {options} options)")]
    BadAnswerIndex {
        game: String,
        room: String,
        index: usize,
        options: usize,
    },

    #[error("escape room '{game}' defines duplicate room id '{room}'")]
    DuplicateRoom { game: String, room: String },

    #[error("escape room '{0}' has no rooms")]
    NoRooms(String),

    #[error("wheel '{0}' has no prizes")]
    NoPrizes(String),

    #[error("wheel '{game}': prize ordinals must be 1..=n in order, found {found} at position {position}")]
    BadOrdinal {
        game: String,
        found: u32,
        position: usize,
    },
}

/// Names substituted into pack text.
#[derive(Debug, Clone)]
pub struct Personalization {
    pub to: String,
    pub from: String,
}

impl Personalization {
    fn apply(&self, text: &str) -> String {
        text.replace("{to}", &self.to).replace("{from}", &self.from)
    }
}

/// All known packs and games, validated.
#[derive(Debug)]
pub struct Catalog {
    packs: Vec<GamePack>,
}

impl Catalog {
    /// Load every game and pack under `dir`.
    pub fn load(dir: &Path, names: &Personalization) -> Result<Self, CatalogError> {
        let games = load_games(&dir.join("games"), names)?;

        let mut packs: Vec<GamePack> = Vec::new();
        for path in toml_files(dir)? {
            let file: PackFile = read_toml(&path)?;
            let meta = file.pack;
            if packs.iter().any(|p| p.id == meta.id) {
                return Err(CatalogError::DuplicatePack(meta.id));
            }
            if meta.games.is_empty() {
                return Err(CatalogError::EmptyPack(meta.id));
            }

            let mut resolved = Vec::new();
            for game_id in &meta.games {
                let def = games.get(game_id).ok_or_else(|| CatalogError::UnknownGameRef {
                    pack: meta.id.clone(),
                    game: game_id.clone(),
                })?;
                resolved.push(def.clone());
            }
            packs.push(GamePack {
                id: meta.id,
                title: names.apply(&meta.title),
                games: resolved,
            });
        }

        tracing::info!(packs = packs.len(), "catalog loaded");
        Ok(Self { packs })
    }

    pub fn pack(&self, id: &str) -> Option<&GamePack> {
        self.packs.iter().find(|p| p.id == id)
    }

    /// Resolve a pack id, falling back to `default_id` when unknown.
    pub fn pack_or_default<'a>(&'a self, id: &str, default_id: &str) -> Option<&'a GamePack> {
        if let Some(pack) = self.pack(id) {
            return Some(pack);
        }
        tracing::warn!(requested = id, fallback = default_id, "unknown pack, using default");
        self.pack(default_id)
    }
}

fn load_games(dir: &Path, names: &Personalization) -> Result<HashMap<String, GameDef>, CatalogError> {
    let mut games = HashMap::new();
    for path in toml_files(dir)? {
        let file: GameFile = read_toml(&path)?;
        let def = resolve_game(file, names)?;
        let id = def.meta.id.clone();
        if games.insert(id.clone(), def).is_some() {
            return Err(CatalogError::DuplicateGame(id));
        }
    }
    Ok(games)
}

fn resolve_game(file: GameFile, names: &Personalization) -> Result<GameDef, CatalogError> {
    let mut meta = file.game;
    meta.title = names.apply(&meta.title);
    meta.tagline = names.apply(&meta.tagline);
    let id = meta.id.clone();

    let content = match meta.kind {
        GameKind::EscapeRoom => {
            let escape = file
                .escape
                .ok_or(CatalogError::MissingContent(id.clone(), "[escape]"))?;
            GameContent::Escape(validate_escape(&id, personalize_escape(escape, names))?)
        }
        GameKind::SpinWheel => {
            let wheel = file
                .wheel
                .ok_or(CatalogError::MissingContent(id.clone(), "[wheel]"))?;
            GameContent::Wheel(validate_wheel(&id, personalize_wheel(wheel, names))?)
        }
        GameKind::Simple => {
            let simple = file
                .simple
                .ok_or(CatalogError::MissingContent(id.clone(), "[simple]"))?;
            GameContent::Simple(SimpleDef {
                prompt: names.apply(&simple.prompt),
                message: names.apply(&simple.message),
            })
        }
    };

    Ok(GameDef { meta, content })
}

fn personalize_escape(mut escape: EscapeDef, names: &Personalization) -> EscapeDef {
    escape.code_hint = names.apply(&escape.code_hint);
    for room in &mut escape.rooms {
        room.name = names.apply(&room.name);
        room.description = names.apply(&room.description);
        room.clue = names.apply(&room.clue);
        room.puzzle.question = names.apply(&room.puzzle.question);
        room.puzzle.hint = names.apply(&room.puzzle.hint);
        for option in &mut room.puzzle.options {
            *option = names.apply(option);
        }
    }
    escape
}

fn personalize_wheel(mut wheel: WheelDef, names: &Personalization) -> WheelDef {
    for prize in &mut wheel.prizes {
        prize.title = names.apply(&prize.title);
        prize.button = names.apply(&prize.button);
        if let Some(message) = &prize.message {
            prize.message = Some(names.apply(message));
        }
    }
    wheel
}

fn validate_escape(game: &str, escape: EscapeDef) -> Result<EscapeDef, CatalogError> {
    if escape.rooms.is_empty() {
        return Err(CatalogError::NoRooms(game.to_string()));
    }
    for (i, room) in escape.rooms.iter().enumerate() {
        if escape.rooms[..i].iter().any(|r| r.id == room.id) {
            return Err(CatalogError::DuplicateRoom {
                game: game.to_string(),
                room: room.id.clone(),
            });
        }
        if room.puzzle.correct >= room.puzzle.options.len() {
            return Err(CatalogError::BadAnswerIndex {
                game: game.to_string(),
                room: room.id.clone(),
                index: room.puzzle.correct,
                options: room.puzzle.options.len(),
            });
        }
    }
    Ok(escape)
}

fn validate_wheel(game: &str, wheel: WheelDef) -> Result<WheelDef, CatalogError> {
    if wheel.prizes.is_empty() {
        return Err(CatalogError::NoPrizes(game.to_string()));
    }
    for (i, prize) in wheel.prizes.iter().enumerate() {
        if prize.ordinal as usize != i + 1 {
            return Err(CatalogError::BadOrdinal {
                game: game.to_string(),
                found: prize.ordinal,
                position: i,
            });
        }
    }
    Ok(wheel)
}

fn toml_files(dir: &Path) -> Result<Vec<std::path::PathBuf>, CatalogError> {
    let pattern = dir.join("*.toml");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| CatalogError::Pattern(dir.display().to_string()))?;
    let mut paths: Vec<_> = glob::glob(pattern)
        .map_err(|_| CatalogError::Pattern(pattern.to_string()))?
        .filter_map(|entry| entry.ok())
        .collect();
    // Filename order keeps pack listings deterministic.
    paths.sort();
    Ok(paths)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ESCAPE_GAME: &str = r#"
[game]
id = "escape-room"
title = "Escape Room"
tagline = "Solve the puzzles, {to}"
kind = "escape-room"
terminal = true

[escape]
secret_code = "LOVE"
code_hint = "Four letters."

[[escape.room]]
id = "first"
name = "First Room"
emoji = "K"
description = "A door."
clue = "From {from} with love"

[escape.room.puzzle]
question = "Pick one"
options = ["a", "b"]
correct = 1
hint = "the second"
"#;

    const SIMPLE_GAME: &str = r#"
[game]
id = "tap-heart"
title = "Tap Heart"
tagline = "Just tap"
kind = "simple"

[simple]
prompt = "Tap, {to}!"
message = "Done."
"#;

    fn names() -> Personalization {
        Personalization {
            to: "Sam".into(),
            from: "Alex".into(),
        }
    }

    fn write_catalog(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("games")).unwrap();
        for (rel, content) in files {
            fs::write(dir.path().join(rel), content).unwrap();
        }
        dir
    }

    #[test]
    fn loads_and_personalizes() {
        let dir = write_catalog(&[
            ("games/escape-room.toml", ESCAPE_GAME),
            ("games/tap-heart.toml", SIMPLE_GAME),
            (
                "cute.toml",
                "[pack]\nid = \"cute\"\ntitle = \"Cute\"\ngames = [\"escape-room\", \"tap-heart\"]\n",
            ),
        ]);

        let catalog = Catalog::load(dir.path(), &names()).unwrap();
        let pack = catalog.pack("cute").unwrap();
        assert_eq!(pack.len(), 2);

        let escape = pack.game("escape-room").unwrap();
        assert_eq!(escape.meta.tagline, "Solve the puzzles, Sam");
        assert!(escape.meta.terminal);
        match &escape.content {
            GameContent::Escape(def) => {
                assert_eq!(def.rooms[0].clue, "From Alex with love");
            }
            other => panic!("wrong content: {other:?}"),
        }

        let simple = pack.game("tap-heart").unwrap();
        assert!(!simple.meta.terminal);
    }

    #[test]
    fn rejects_unknown_game_reference() {
        let dir = write_catalog(&[(
            "cute.toml",
            "[pack]\nid = \"cute\"\ntitle = \"Cute\"\ngames = [\"nope\"]\n",
        )]);
        let err = Catalog::load(dir.path(), &names()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownGameRef { .. }));
    }

    #[test]
    fn rejects_empty_pack() {
        let dir = write_catalog(&[(
            "cute.toml",
            "[pack]\nid = \"cute\"\ntitle = \"Cute\"\ngames = []\n",
        )]);
        let err = Catalog::load(dir.path(), &names()).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyPack(_)));
    }

    #[test]
    fn rejects_out_of_range_answer() {
        let bad = ESCAPE_GAME.replace("correct = 1", "correct = 5");
        let dir = write_catalog(&[("games/escape-room.toml", &bad)]);
        let err = Catalog::load(dir.path(), &names()).unwrap_err();
        assert!(matches!(err, CatalogError::BadAnswerIndex { index: 5, .. }));
    }

    #[test]
    fn rejects_non_contiguous_ordinals() {
        let wheel = r#"
[game]
id = "spin-wheel"
title = "Wheel"
tagline = "Spin"
kind = "spin-wheel"
terminal = true

[[wheel.prize]]
ordinal = 1
title = "First"
emoji = "P"
button = "Next"

[[wheel.prize]]
ordinal = 3
title = "Third"
emoji = "P"
button = "Next"
"#;
        let dir = write_catalog(&[("games/spin-wheel.toml", wheel)]);
        let err = Catalog::load(dir.path(), &names()).unwrap_err();
        assert!(matches!(err, CatalogError::BadOrdinal { found: 3, position: 1, .. }));
    }

    #[test]
    fn kind_requires_matching_section() {
        let bad = SIMPLE_GAME.replace("[simple]", "[wheel]");
        let dir = write_catalog(&[("games/tap-heart.toml", &bad)]);
        let err = Catalog::load(dir.path(), &names()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingContent(_, _) | CatalogError::Parse { .. }));
    }

    #[test]
    fn unknown_pack_falls_back() {
        let dir = write_catalog(&[
            ("games/tap-heart.toml", SIMPLE_GAME),
            (
                "cute.toml",
                "[pack]\nid = \"cute\"\ntitle = \"Cute\"\ngames = [\"tap-heart\"]\n",
            ),
        ]);
        let catalog = Catalog::load(dir.path(), &names()).unwrap();
        let pack = catalog.pack_or_default("spicy", "cute").unwrap();
        assert_eq!(pack.id, "cute");
    }
}
