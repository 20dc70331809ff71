/// Asset bundle: every asset the game reads, resolved once at startup.
///
/// The embedded copies are compiled in. Level maps may be overridden by
/// files of the same name in the configured levels directory, which is
/// handy for editing a map without rebuilding.
///
/// Nothing else in the crate touches asset files directly; the level loader
/// and the sprite provider receive this bundle by reference.

use std::borrow::Cow;
use std::path::Path;

use crate::error::AssetError;

pub struct LevelSource {
    pub name: &'static str,
    pub file_name: &'static str,
    pub text: Cow<'static, str>,
}

pub struct AssetBundle {
    pub levels: Vec<LevelSource>,
    pub tileset: Cow<'static, str>,
    pub sprites: Cow<'static, str>,
}

impl AssetBundle {
    pub fn embedded() -> Self {
        AssetBundle {
            levels: vec![
                LevelSource {
                    name: "The Cellar",
                    file_name: "level1.tmx",
                    text: Cow::Borrowed(include_str!("../assets/levels/level1.tmx")),
                },
                LevelSource {
                    name: "The Crypt",
                    file_name: "level2.tmx",
                    text: Cow::Borrowed(include_str!("../assets/levels/level2.tmx")),
                },
            ],
            tileset: Cow::Borrowed(include_str!("../assets/tiles/dungeon.toml")),
            sprites: Cow::Borrowed(include_str!("../assets/sprites.toml")),
        }
    }

    /// Replace embedded level text with files found in `dir`.
    /// Unreadable files are skipped with a warning.
    pub fn with_level_overrides(mut self, dir: &Path) -> Self {
        if !dir.is_dir() {
            return self;
        }
        for level in &mut self.levels {
            let path = dir.join(level.file_name);
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    log::info!("level '{}' loaded from {}", level.name, path.display());
                    level.text = Cow::Owned(text);
                }
                Err(source) => {
                    let err = AssetError::Io { path, source };
                    log::warn!("{err}; using built-in map");
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_bundle_has_two_levels() {
        let b = AssetBundle::embedded();
        assert_eq!(b.levels.len(), 2);
        assert!(b.levels.iter().all(|l| l.text.contains("<data")));
        assert!(!b.tileset.is_empty());
        assert!(!b.sprites.is_empty());
    }

    #[test]
    fn missing_override_dir_keeps_embedded() {
        let b = AssetBundle::embedded()
            .with_level_overrides(Path::new("/definitely/not/a/dir"));
        assert!(matches!(b.levels[0].text, Cow::Borrowed(_)));
    }

    #[test]
    fn override_file_replaces_only_its_level() {
        let dir = std::env::temp_dir().join(format!("dungeon-escape-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("level2.tmx"), "width=\"3\" height=\"1\"<data>\n1,2,3\n</data>").unwrap();

        let b = AssetBundle::embedded().with_level_overrides(&dir);
        std::fs::remove_dir_all(&dir).unwrap();

        assert!(matches!(b.levels[0].text, Cow::Borrowed(_)));
        assert!(b.levels[1].text.starts_with("width=\"3\""));
    }
}
