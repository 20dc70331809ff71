/// Terminal backend for the scene painter.
///
/// `draw_scene` fills the `front` grid; `flush_diff` writes only the cells
/// that differ from `back` (the frame on screen), as one queued batch,
/// and then the two grids trade places.
///
/// One map tile is `CELL_W` terminal columns by one row. Entity pixel
/// positions snap to the tile under the sprite's center.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::TILE_PX;
use crate::sim::world::{Phase, WorldState};
use super::art::{Art, Glyph, Rgb};
use super::canvas::{draw_scene, Canvas, TextStyle, TEXT_LINES};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // UTF-8, room for a joined emoji
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // occupies 2 terminal columns
    cont: bool,    // right half of a wide glyph, never printed
}

impl Cell {
    /// Dungeon darkness; also used for full clears.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 20 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    /// Never drawn by the scene, so filling `back` with it repaints everything.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = bg;
        cell
    }

    /// A wide cell from a possibly multi-codepoint string.
    fn from_str_wide(s: &str, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let mut len = s.len().min(cell.ch.len());
        while !s.is_char_boundary(len) {
            len -= 1;
        }
        cell.ch[..len].copy_from_slice(&s.as_bytes()[..len]);
        cell.ch_len = len as u8;
        cell.fg = fg;
        cell.bg = bg;
        cell.wide = true;
        cell
    }

    fn continuation(bg: Color) -> Self {
        Cell { ch: [0; 16], ch_len: 0, cont: true, bg, ..Self::BLANK }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb { r: rgb.0, g: rgb.1, b: rgb.2 }
}

// ── FrameBuffer: the terminal grid ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if (self.width, self.height) != (w, h) {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Overwriting one half of a wide glyph blanks the other half, so a
    /// row never holds a continuation without its owner.
    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }
        let old = self.get(x, y);
        if old.cont && !cell.cont && x > 0 {
            self.blank_keep_bg(x - 1, y);
        }
        if old.wide && !cell.wide && x + 1 < self.width {
            self.blank_keep_bg(x + 1, y);
        }
        self.cells[y * self.width + x] = cell;
    }

    fn blank_keep_bg(&mut self, x: usize, y: usize) {
        let i = y * self.width + x;
        self.cells[i] = Cell { bg: self.cells[i].bg, ..Cell::BLANK };
    }

    /// One map tile, `CELL_W` columns starting at `x`: a wide glyph and its
    /// continuation, or up to `CELL_W` narrow chars. A tile that does not
    /// fit whole is dropped. Glyphs without a background keep the one
    /// beneath them.
    fn put_tile(&mut self, x: usize, y: usize, glyph: &Glyph) {
        if x + CELL_W > self.width || y >= self.height {
            return;
        }
        let bg = glyph.bg.map(color).unwrap_or(self.get(x, y).bg);
        let fg = glyph.fg.map(color).unwrap_or(Color::White);

        if glyph.wide {
            self.set(x, y, Cell::from_str_wide(&glyph.text, fg, bg));
            self.set(x + 1, y, Cell::continuation(bg));
        } else {
            for (i, ch) in glyph.text.chars().take(CELL_W).enumerate() {
                self.set(x + i, y, Cell::from_char(ch, fg, bg));
            }
        }
    }

    /// One char per column, clipped at the right edge.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (cx, ch) in (x..self.width).zip(s.chars()) {
            let bg = self.get(cx, y).bg;
            self.set(cx, y, Cell::from_char(ch, fg, bg));
        }
    }
}

/// Next half-open span `[start, end)` of row `y`, at or after `from`, where
/// `front` differs from `back`. A changed continuation pulls in its wide
/// owner, and a span never ends between a wide glyph and its right half.
fn dirty_run(front: &FrameBuffer, back: &FrameBuffer, y: usize, from: usize) -> Option<(usize, usize)> {
    let dirty = |x: usize| front.get(x, y) != back.get(x, y);
    let mut start = (from..front.width).find(|&x| dirty(x))?;
    if front.get(start, y).cont && start > 0 {
        start -= 1;
    }
    let mut end = start + 1;
    while end < front.width && (dirty(end) || front.get(end, y).cont) {
        end += 1;
    }
    Some((start, end))
}

// ── Renderer ──

/// Terminal columns per map tile.
const CELL_W: usize = 2;

/// First terminal row of the map, below the header text.
const MAP_ROW: usize = TEXT_LINES;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Column of map tile 0; the map is centered horizontally.
    origin_x: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            origin_x: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.fit_terminal();
        Ok(())
    }

    /// Match the grids to the terminal. Returns true when the size changed.
    fn fit_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if tw == self.term_w && th == self.term_h && self.front.width == tw {
            return false;
        }
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        true
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState, art: &Art) -> io::Result<()> {
        let resized = self.fit_terminal();
        // game over banner or restart: repaint from scratch
        if resized || self.last_phase != Some(world.phase) {
            self.invalidate()?;
            self.last_phase = Some(world.phase);
        }

        let map_cols = world.current_map().width.max(0) as usize * CELL_W;
        self.origin_x = self.term_w.saturating_sub(map_cols) / 2;

        self.front.clear();
        draw_scene(world, art, self);

        let map_rows = world.current_map().height.max(0) as usize;
        if self.term_w < map_cols || self.term_h < MAP_ROW + map_rows {
            let note = format!("Terminal too small: need {}x{}", map_cols, MAP_ROW + map_rows);
            let y = self.term_h.saturating_sub(1);
            self.front.put_str(0, y, &note, Color::Red);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    /// Terminal column of the tile whose area holds the sprite's center.
    fn screen_x(&self, px: f64) -> Option<usize> {
        let t = ((px + TILE_PX / 2.0) / TILE_PX).floor();
        if t < 0.0 { return None; }
        Some(self.origin_x + t as usize * CELL_W)
    }

    fn screen_y(&self, py: f64) -> Option<usize> {
        let t = ((py + TILE_PX / 2.0) / TILE_PX).floor();
        if t < 0.0 { return None; }
        Some(MAP_ROW + t as usize)
    }

    /// Print each changed span after a single cursor move. Within a span
    /// the cursor advances by itself: wide cells cover their continuation.
    fn flush_diff(&mut self) -> io::Result<()> {
        let (mut fg, mut bg) = (Color::White, Cell::BASE_BG);
        queue!(self.writer, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        for y in 0..self.front.height {
            let mut from = 0;
            while let Some((start, end)) = dirty_run(&self.front, &self.back, y, from) {
                queue!(self.writer, MoveTo(start as u16, y as u16))?;
                for x in start..end {
                    let cell = self.front.get(x, y);
                    if cell.cont {
                        continue;
                    }
                    if cell.fg != fg {
                        fg = cell.fg;
                        queue!(self.writer, SetForegroundColor(fg))?;
                    }
                    if cell.bg != bg {
                        bg = cell.bg;
                        queue!(self.writer, SetBackgroundColor(bg))?;
                    }
                    queue!(self.writer, Print(cell.as_str()))?;
                }
                from = end;
            }
        }

        self.writer.flush()
    }
}

impl Canvas for Renderer {
    fn draw_tile(&mut self, px: f64, py: f64, glyph: &Glyph) {
        if let (Some(x), Some(y)) = (self.screen_x(px), self.screen_y(py)) {
            self.front.put_tile(x, y, glyph);
        }
    }

    fn draw_text(&mut self, line: usize, text: &str, style: TextStyle) {
        let fg = match style {
            TextStyle::Normal => Color::White,
            TextStyle::Alert => Color::Rgb { r: 255, g: 200, b: 60 },
            TextStyle::Dim => Color::DarkGrey,
        };
        let len = text.chars().count();
        let x = self.origin_x.min(self.term_w.saturating_sub(len));
        self.front.put_str(x, line, text, fg);
    }
}
