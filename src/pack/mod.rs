pub mod loader;
pub mod types;

pub use loader::{Catalog, CatalogError, Personalization};
pub use types::{GameContent, GameDef, GameKind, GamePack};
