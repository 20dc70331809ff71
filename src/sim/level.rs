/// Level loader.
///
/// ## Map format
///
/// A Tiled-style TMX text file, read without an XML parser:
///   - `width="N"` and `height="N"` are taken from the first occurrence of
///     each key anywhere in the text (the `<map>` element comes first).
///   - The tile grid lives between `<data ...>` and `</data>`, one row per
///     line, comma-separated gids.
///
/// ```text
/// <map ... width="20" height="20" tilewidth="16" tileheight="16">
///  <layer id="1" name="floor" width="20" height="20">
///   <data encoding="csv">
/// 5,1,1,1,...,6,
/// ...
/// </data>
/// ```
///
/// Lenient on purpose in the grid: blank tokens are skipped, junk tokens
/// read as 0, blank lines are dropped, rows are not checked against width.
/// Strict only about the data block itself: a map without one is a broken
/// asset and fails the load.

use crate::assets::AssetBundle;
use crate::domain::ai::{PatrolRoute, CRYPT_PATROLS};
use crate::domain::tile::TileMap;
use crate::error::AssetError;

const DATA_OPEN: &str = "<data";
const DATA_CLOSE: &str = "</data>";

/// A playable level: its map plus the patrols that walk it.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub map: TileMap,
    pub patrols: Vec<PatrolRoute>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse every level in the bundle. Level 2 gets the crypt patrol.
pub fn load_levels(bundle: &AssetBundle) -> Result<Vec<LevelDef>, AssetError> {
    let mut levels = Vec::with_capacity(bundle.levels.len());
    for (idx, src) in bundle.levels.iter().enumerate() {
        let map = parse_map(&src.text, src.name)?;
        let (pw, ph) = map.pixel_size();
        log::info!(
            "level {} '{}': {} x {} tiles ({} x {} px), {} rows",
            idx + 1, src.name, map.width, map.height, pw, ph, map.row_count(),
        );
        if map.is_empty() {
            log::warn!("level '{}' has an empty map; it will have no items", src.name);
        }
        let patrols = if idx == 1 { CRYPT_PATROLS.to_vec() } else { vec![] };
        levels.push(LevelDef { name: src.name.to_string(), map, patrols });
    }
    Ok(levels)
}

/// Parse one map. `level` only labels errors.
pub fn parse_map(text: &str, level: &str) -> Result<TileMap, AssetError> {
    let width = extract_int_attr(text, "width=\"");
    let height = extract_int_attr(text, "height=\"");

    let csv = data_block(text, level)?;

    let tiles = csv
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_row)
        .filter(|row| !row.is_empty())
        .collect();

    Ok(TileMap {
        width,
        height,
        tiles,
        wall_ids: Default::default(),
    })
}

// ══════════════════════════════════════════════════════════════
// Internal
// ══════════════════════════════════════════════════════════════

/// Integer between `key` (which ends with the opening quote) and the next
/// quote. Missing key, missing closing quote or junk all read as 0.
fn extract_int_attr(text: &str, key: &str) -> i32 {
    let start = match text.find(key) {
        Some(i) => i + key.len(),
        None => return 0,
    };
    let rest = &text[start..];
    match rest.find('"') {
        Some(end) => rest[..end].trim().parse().unwrap_or(0),
        None => 0,
    }
}

/// Text strictly between the end of the `<data ...>` tag and `</data>`.
fn data_block<'a>(text: &'a str, level: &str) -> Result<&'a str, AssetError> {
    let open = text
        .find(DATA_OPEN)
        .ok_or_else(|| AssetError::MissingDataStart { level: level.to_string() })?;
    let tag_end = text[open..]
        .find('>')
        .ok_or_else(|| AssetError::MissingDataStart { level: level.to_string() })?;
    let body_start = open + tag_end + 1;
    let body_len = text[body_start..]
        .find(DATA_CLOSE)
        .ok_or_else(|| AssetError::MissingDataEnd { level: level.to_string() })?;
    Ok(text[body_start..body_start + body_len].trim())
}

fn parse_row(line: &str) -> Vec<i32> {
    line.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.parse().unwrap_or(0))
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="5" height="3" tilewidth="16" tileheight="16">
 <layer id="1" name="floor" width="5" height="3">
  <data encoding="csv">
1,2,3,4,5,
6,7,8,9,10,
11,12,13,14,15
</data>
 </layer>
</map>
"#;

    #[test]
    fn parses_dimensions_and_grid_in_order() {
        let m = parse_map(SMALL, "small").unwrap();
        assert_eq!((m.width, m.height), (5, 3));
        assert_eq!(m.tiles, vec![
            vec![1, 2, 3, 4, 5],
            vec![6, 7, 8, 9, 10],
            vec![11, 12, 13, 14, 15],
        ]);
        assert!(m.wall_ids.is_empty());
    }

    #[test]
    fn first_width_wins_over_tilewidth() {
        let m = parse_map(SMALL, "small").unwrap();
        assert_eq!(m.width, 5);
    }

    #[test]
    fn missing_attributes_read_as_zero() {
        let text = "<map><data>\n1,2\n</data></map>";
        let m = parse_map(text, "bare").unwrap();
        assert_eq!((m.width, m.height), (0, 0));
        assert_eq!(m.tiles, vec![vec![1, 2]]);
        assert!(m.is_empty());
    }

    #[test]
    fn junk_tokens_become_zero_and_blanks_are_skipped() {
        let text = "width=\"3\" height=\"2\"<data>\n 4, x ,,7 \n\n  \n9,,\n</data>";
        let m = parse_map(text, "junk").unwrap();
        assert_eq!(m.tiles, vec![vec![4, 0, 7], vec![9]]);
    }

    #[test]
    fn non_numeric_attribute_reads_as_zero() {
        let text = "width=\"wide\" height=\"7\"<data>1</data>";
        let m = parse_map(text, "attr").unwrap();
        assert_eq!((m.width, m.height), (0, 7));
    }

    #[test]
    fn ragged_rows_are_kept_as_is() {
        let text = "width=\"4\" height=\"3\"<data>\n1,2,3,4\n5,6\n7,8,9,10,11\n</data>";
        let m = parse_map(text, "ragged").unwrap();
        assert_eq!(m.tiles.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 2, 5]);
    }

    #[test]
    fn missing_data_open_is_an_error() {
        let err = parse_map("width=\"2\" height=\"2\"", "nodata").unwrap_err();
        assert!(matches!(err, AssetError::MissingDataStart { .. }));
    }

    #[test]
    fn missing_data_close_is_an_error() {
        let err = parse_map("<data encoding=\"csv\">\n1,2\n", "open").unwrap_err();
        assert!(matches!(err, AssetError::MissingDataEnd { .. }));
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn empty_data_block_yields_no_rows() {
        let m = parse_map("width=\"2\" height=\"2\"<data>\n\n</data>", "blank").unwrap();
        assert!(m.tiles.is_empty());
        assert!(m.is_empty());
    }

    #[test]
    fn embedded_levels_are_twenty_by_twenty() {
        let levels = load_levels(&AssetBundle::embedded()).unwrap();
        assert_eq!(levels.len(), 2);
        for l in &levels {
            assert_eq!((l.map.width, l.map.height), (20, 20), "{}", l.name);
            assert_eq!(l.map.row_count(), 20, "{}", l.name);
            assert!(l.map.tiles.iter().all(|r| r.len() == 20), "{}", l.name);
        }
        assert!(levels[0].patrols.is_empty());
        assert_eq!(levels[1].patrols.len(), 7);
    }

    #[test]
    fn oversized_override_loads_and_plays() {
        use crate::config::GameConfig;
        use crate::domain::entity::FrameInput;
        use crate::sim::step::{setup_level, step};
        use crate::sim::world::{Phase, WorldState};
        use crate::ui::art::Art;

        let dir = std::env::temp_dir().join(format!("dungeon-escape-huge-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("level1.tmx"),
            "width=\"200000000\" height=\"20\"<data>\n1,1,1\n</data>",
        ).unwrap();
        let bundle = AssetBundle::embedded().with_level_overrides(&dir);
        std::fs::remove_dir_all(&dir).unwrap();

        let levels = load_levels(&bundle).unwrap();
        let (_, pools) = Art::load(&bundle).unwrap();
        assert_eq!(levels[0].map.width, 200_000_000);
        assert_eq!(levels[0].map.pixel_size(), (3_200_000_000, 320));

        let mut cfg = GameConfig::default();
        cfg.seed = 11;
        let mut w = WorldState::new(levels, pools, &cfg);
        setup_level(&mut w, 1);
        step(&mut w, FrameInput { right: true, ..FrameInput::default() });
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.level, 1);
    }
}
