/// Sprite provider: turns asset text into drawable glyphs.
///
/// Two sources:
///   - The tileset sheet: a grid of characters with a parallel grid of
///     palette keys. Decoding validates the whole sheet; slicing crops
///     `tile_width`-character tiles row-major, so gid `g` is tile `g-1`.
///   - The sprite book: named sprites plus the groups the simulation needs
///     (player frames, door, item pools, NPC pool).
///
/// The simulation never sees a glyph. It gets `SpriteId` handles, and the
/// scene composer resolves them back here.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::assets::AssetBundle;
use crate::domain::entity::{PlayerFrames, SpriteId, SpritePools};
use crate::error::AssetError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}

/// One drawable tile-sized image.
///
/// `wide` glyphs are a single character that fills both terminal columns
/// of a tile (emoji). Narrow glyphs carry exactly one character per column.
#[derive(Clone, Debug, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub wide: bool,
}

// ══════════════════════════════════════════════════════════════
// Tileset sheet
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct SheetFile {
    tile_width: usize,
    rows: Vec<String>,
    colors: Vec<String>,
    palette: HashMap<String, PaletteEntry>,
}

#[derive(Deserialize, Clone, Copy)]
struct PaletteEntry {
    fg: [u8; 3],
    #[serde(default)]
    bg: Option<[u8; 3]>,
}

/// A decoded sheet: every cell carries its character and colors.
pub struct Sheet {
    tile_width: usize,
    cells: Vec<Vec<(char, PaletteEntry)>>,
}

impl Sheet {
    pub fn decode(text: &str) -> Result<Self, AssetError> {
        let file: SheetFile = toml::from_str(text)?;

        if file.tile_width == 0 {
            return Err(AssetError::Sheet("tile_width must be at least 1".into()));
        }
        if file.rows.is_empty() {
            return Err(AssetError::Sheet("sheet has no rows".into()));
        }
        if file.colors.len() != file.rows.len() {
            return Err(AssetError::Sheet(format!(
                "{} glyph rows but {} color rows", file.rows.len(), file.colors.len(),
            )));
        }

        let row_len = file.rows[0].chars().count();
        if row_len == 0 || row_len % file.tile_width != 0 {
            return Err(AssetError::Sheet(format!(
                "row width {} is not a multiple of tile_width {}", row_len, file.tile_width,
            )));
        }

        let mut cells = Vec::with_capacity(file.rows.len());
        for (y, (glyphs, keys)) in file.rows.iter().zip(&file.colors).enumerate() {
            let glyphs: Vec<char> = glyphs.chars().collect();
            let keys: Vec<char> = keys.chars().collect();
            if glyphs.len() != row_len {
                return Err(AssetError::Sheet(format!(
                    "row {} is {} wide, expected {}", y, glyphs.len(), row_len,
                )));
            }
            if keys.len() != row_len {
                return Err(AssetError::Sheet(format!(
                    "color row {} is {} wide, expected {}", y, keys.len(), row_len,
                )));
            }
            let mut row = Vec::with_capacity(row_len);
            for (ch, key) in glyphs.into_iter().zip(keys) {
                let entry = file.palette.get(&key.to_string())
                    .copied()
                    .ok_or_else(|| AssetError::Sheet(format!(
                        "row {}: palette has no key '{}'", y, key,
                    )))?;
                row.push((ch, entry));
            }
            cells.push(row);
        }

        Ok(Sheet { tile_width: file.tile_width, cells })
    }

    pub fn columns(&self) -> usize {
        self.cells.first().map_or(0, |r| r.len() / self.tile_width)
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Crop the tile at sheet position (col, row), no scaling.
    /// Colors come from the tile's first cell.
    pub fn crop(&self, col: usize, row: usize) -> Option<Glyph> {
        let cells = self.cells.get(row)?;
        let start = col * self.tile_width;
        let tile = cells.get(start..start + self.tile_width)?;
        let (_, colors) = tile[0];
        Some(Glyph {
            text: tile.iter().map(|(c, _)| *c).collect(),
            fg: Some(colors.fg.into()),
            bg: colors.bg.map(Rgb::from),
            wide: false,
        })
    }
}

/// Tiles cut from a sheet, indexed by gid.
pub struct Tileset {
    tiles: Vec<Glyph>,
}

impl Tileset {
    pub fn slice(sheet: &Sheet) -> Self {
        let mut tiles = Vec::with_capacity(sheet.rows() * sheet.columns());
        for row in 0..sheet.rows() {
            for col in 0..sheet.columns() {
                if let Some(g) = sheet.crop(col, row) {
                    tiles.push(g);
                }
            }
        }
        Tileset { tiles }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Glyph for a map gid. Gid 0 (or below) and gids past the sheet draw nothing.
    pub fn glyph_for(&self, gid: i32) -> Option<&Glyph> {
        if gid <= 0 {
            return None;
        }
        self.tiles.get((gid - 1) as usize)
    }
}

// ══════════════════════════════════════════════════════════════
// Sprite book
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct BookFile {
    sprites: BTreeMap<String, SpriteEntry>,
    player: PlayerEntry,
    groups: GroupsEntry,
}

#[derive(Deserialize)]
struct SpriteEntry {
    glyph: String,
    #[serde(default)]
    color: Option<[u8; 3]>,
}

#[derive(Deserialize)]
struct PlayerEntry {
    up: Vec<String>,
    down: Vec<String>,
    left: Vec<String>,
    right: Vec<String>,
}

#[derive(Deserialize)]
struct GroupsEntry {
    door: String,
    #[serde(default)]
    good_items: Vec<String>,
    #[serde(default)]
    bad_items: Vec<String>,
    #[serde(default)]
    npcs: Vec<String>,
}

pub struct SpriteBook {
    glyphs: Vec<Glyph>,
}

impl SpriteBook {
    /// Decode the book and resolve every group into handles.
    pub fn decode(text: &str) -> Result<(Self, SpritePools), AssetError> {
        let file: BookFile = toml::from_str(text)?;

        let mut glyphs = Vec::with_capacity(file.sprites.len());
        let mut ids: HashMap<&str, SpriteId> = HashMap::with_capacity(file.sprites.len());
        for (name, entry) in &file.sprites {
            ids.insert(name.as_str(), SpriteId(glyphs.len()));
            glyphs.push(decode_sprite(name, entry)?);
        }

        let lookup = |name: &str| -> Result<SpriteId, AssetError> {
            ids.get(name).copied().ok_or_else(|| AssetError::Sprite {
                name: name.to_string(),
                reason: "referenced by a group but not defined".into(),
            })
        };
        let resolve = |names: &[String]| -> Result<Vec<SpriteId>, AssetError> {
            names.iter().map(|n| lookup(n)).collect()
        };
        let facing = |label: &str, names: &[String]| -> Result<Vec<SpriteId>, AssetError> {
            if names.is_empty() {
                return Err(AssetError::Sprite {
                    name: format!("player.{label}"),
                    reason: "needs at least one frame".into(),
                });
            }
            resolve(names)
        };

        let pools = SpritePools {
            player: PlayerFrames {
                up: facing("up", &file.player.up)?,
                down: facing("down", &file.player.down)?,
                left: facing("left", &file.player.left)?,
                right: facing("right", &file.player.right)?,
            },
            door: Some(lookup(&file.groups.door)?),
            good_items: resolve(&file.groups.good_items)?,
            bad_items: resolve(&file.groups.bad_items)?,
            npcs: resolve(&file.groups.npcs)?,
        };

        Ok((SpriteBook { glyphs }, pools))
    }

    pub fn get(&self, id: SpriteId) -> Option<&Glyph> {
        self.glyphs.get(id.0)
    }
}

fn decode_sprite(name: &str, entry: &SpriteEntry) -> Result<Glyph, AssetError> {
    let fg = entry.color.map(Rgb::from);
    match entry.glyph.chars().count() {
        1 => Ok(Glyph { text: entry.glyph.clone(), fg, bg: None, wide: true }),
        2 => Ok(Glyph { text: entry.glyph.clone(), fg, bg: None, wide: false }),
        n => Err(AssetError::Sprite {
            name: name.to_string(),
            reason: format!("glyph must be 1 wide or 2 narrow characters, got {n}"),
        }),
    }
}

// ══════════════════════════════════════════════════════════════
// Everything the scene needs, loaded together
// ══════════════════════════════════════════════════════════════

pub struct Art {
    pub tiles: Tileset,
    pub sprites: SpriteBook,
}

impl Art {
    pub fn load(bundle: &AssetBundle) -> Result<(Self, SpritePools), AssetError> {
        let sheet = Sheet::decode(&bundle.tileset)?;
        let tiles = Tileset::slice(&sheet);
        log::info!("tileset sliced: {} tiles ({} x {})", tiles.len(), sheet.columns(), sheet.rows());

        let (sprites, pools) = SpriteBook::decode(&bundle.sprites)?;
        log::info!(
            "sprite book: {} good, {} bad, {} npc sprites",
            pools.good_items.len(), pools.bad_items.len(), pools.npcs.len(),
        );

        Ok((Art { tiles, sprites }, pools))
    }
}
