//! Pack and game definition schema.
//!
//! Content lives in TOML: one manifest per pack under `packs/`, one file
//! per game under `packs/games/`. Text fields may carry `{to}` / `{from}`
//! placeholders that the loader substitutes from the startup config.

use serde::Deserialize;

/// A pack manifest (`packs/<id>.toml`).
#[derive(Debug, Deserialize)]
pub struct PackFile {
    pub pack: PackMeta,
}

#[derive(Debug, Deserialize)]
pub struct PackMeta {
    pub id: String,
    pub title: String,
    /// Ordered game ids; each must resolve to a game definition.
    pub games: Vec<String>,
}

/// A game definition (`packs/games/<id>.toml`).
#[derive(Debug, Deserialize)]
pub struct GameFile {
    pub game: GameMeta,
    pub escape: Option<EscapeDef>,
    pub wheel: Option<WheelDef>,
    pub simple: Option<SimpleDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameMeta {
    pub id: String,
    pub title: String,
    pub tagline: String,
    pub kind: GameKind,
    /// Completing a terminal game ends the session and goes straight to
    /// the final reveal.
    #[serde(default)]
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    EscapeRoom,
    SpinWheel,
    Simple,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EscapeDef {
    pub secret_code: String,
    pub code_hint: String,
    #[serde(rename = "room")]
    pub rooms: Vec<RoomDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomDef {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
    pub clue: String,
    pub puzzle: PuzzleDef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleDef {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct: usize,
    pub hint: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WheelDef {
    #[serde(rename = "prize")]
    pub prizes: Vec<PrizeDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrizeDef {
    /// 1-based, contiguous; spin k always reveals ordinal k.
    pub ordinal: u32,
    pub title: String,
    pub message: Option<String>,
    pub emoji: String,
    pub button: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleDef {
    pub prompt: String,
    pub message: String,
}

/// The playable content of a game, resolved and personalized.
#[derive(Debug, Clone)]
pub enum GameContent {
    Escape(EscapeDef),
    Wheel(WheelDef),
    Simple(SimpleDef),
}

/// A fully resolved game entry.
#[derive(Debug, Clone)]
pub struct GameDef {
    pub meta: GameMeta,
    pub content: GameContent,
}

/// A pack resolved against the game catalog: ordered, non-empty.
#[derive(Debug, Clone)]
pub struct GamePack {
    pub id: String,
    pub title: String,
    pub games: Vec<GameDef>,
}

impl GamePack {
    pub fn game(&self, id: &str) -> Option<&GameDef> {
        self.games.iter().find(|g| g.meta.id == id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }
}
