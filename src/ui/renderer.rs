/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of ScreenCell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each map cell is two terminal columns. The background shade encodes the
/// height level; the left column prints the level as a hex digit, the right
/// column marks slopes. The actor is drawn on the cell under its center.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::ControlsConfig;
use crate::domain::entity::{Facing, KickAction, KickTag};
use crate::domain::tile::{is_ground_level, Cell, VOID_HEIGHT};
use crate::sim::world::WorldState;

// ── ScreenCell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct ScreenCell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl ScreenCell {
    /// Explicit dark background for every empty terminal cell, so the gap
    /// between rows matches on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: ScreenCell = ScreenCell { ch: ' ', fg: Color::White, bg: ScreenCell::BASE_BG };

    /// Never equal to a drawn cell; forces a full repaint.
    const INVALID: ScreenCell = ScreenCell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        ScreenCell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of ScreenCells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<ScreenCell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![ScreenCell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![ScreenCell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(ScreenCell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(ScreenCell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: ScreenCell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> ScreenCell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            ScreenCell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, ScreenCell::new(ch, fg, bg));
        }
    }

    /// Paint a whole row with `bg`, then the text on top.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, ScreenCell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ══════════════════════════════════════════════════════════════
// Glyphs and colours
// ══════════════════════════════════════════════════════════════

/// Terminal columns per map cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const BOOT_FG: Color = Color::Rgb { r: 230, g: 140, b: 40 };
const ACTOR_FG: Color = Color::Rgb { r: 255, g: 255, b: 140 };

/// Background shade for a height level: darker is lower.
/// Slopes (odd levels) lean warm so they stand out from flat ground.
fn height_color(height: u8) -> Color {
    let h = height.min(VOID_HEIGHT - 1);
    let step = h / 2;
    if is_ground_level(h as i32) {
        Color::Rgb { r: 30 + step * 20, g: 55 + step * 22, b: 40 + step * 16 }
    } else {
        Color::Rgb { r: 70 + step * 20, g: 60 + step * 20, b: 30 + step * 12 }
    }
}

/// Two terminal glyphs plus colours for a map cell.
fn cell_glyphs(cell: Cell) -> (char, char, Color, Color) {
    if cell.is_void() { return (' ', ' ', Color::White, ScreenCell::BASE_BG); }
    let bg = height_color(cell.height);
    if cell.is_boot() { return ('▟', '▙', BOOT_FG, bg); }
    let digit = char::from_digit(cell.height as u32, 16).unwrap_or('?');
    let right = if is_ground_level(cell.height as i32) { ' ' } else { '▒' };
    (digit, right, Color::Rgb { r: 150, g: 150, b: 150 }, bg)
}

/// Actor glyphs: facing arrow, then a body mark for the kick state.
fn actor_glyphs(facing: Facing, tag: KickTag, has_boot: bool) -> (char, char) {
    let arrow = match facing {
        Facing::East => '▶',
        Facing::North => '▲',
        Facing::West => '◀',
        Facing::South => '▼',
    };
    let body = match tag {
        KickTag::Idle if has_boot => '◆',
        KickTag::Idle => '●',
        KickTag::Windup => '◐',
        KickTag::Active(_) => '◉',
        KickTag::Recoil => '○',
    };
    (arrow, body)
}

fn facing_label(facing: Facing) -> &'static str {
    match facing {
        Facing::East => "east",
        Facing::North => "north",
        Facing::West => "west",
        Facing::South => "south",
    }
}

fn kick_label(tag: KickTag) -> &'static str {
    match tag {
        KickTag::Idle => "idle",
        KickTag::Windup => "windup",
        KickTag::Active(KickAction::GrabBoot { .. }) => "grab",
        KickTag::Active(KickAction::Climb) => "climb",
        KickTag::Active(KickAction::Fall) => "fall",
        KickTag::Recoil => "recoil",
    }
}

fn hud_line(w: &WorldState) -> String {
    let a = &w.actor;
    format!(
        " x:{:>7.2}  y:{:>7.2}  z:{:<2}  {:<5}  kick:{:<6}  frame:{:<2}  {}  t:{}",
        a.x, a.y, a.z,
        facing_label(a.facing),
        kick_label(a.kick.tag()),
        w.clock.sprite_frame(),
        if a.has_boot { "booted" } else { "barefoot" },
        w.tick,
    )
}

fn first_key(names: &[String]) -> &str {
    names.first().map(String::as_str).unwrap_or("-")
}

/// One-line key reference built from the configured bindings.
pub fn help_line(c: &ControlsConfig) -> String {
    format!(
        " {}/{}/{}/{}:Walk  {}:Kick  {}:Boost  {}:Pause  {}:Restart  {}:Export  {}:Quit",
        first_key(&c.up), first_key(&c.left), first_key(&c.down), first_key(&c.right),
        first_key(&c.kick), first_key(&c.boost), first_key(&c.pause),
        first_key(&c.restart), first_key(&c.export), first_key(&c.quit),
    )
}

// ══════════════════════════════════════════════════════════════
// Renderer
// ══════════════════════════════════════════════════════════════

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    help: String,
    enhanced: bool,
}

impl Renderer {
    pub fn new(help: String) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            help,
            enhanced: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// accepted keyboard enhancement (so key releases are reported).
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(ScreenCell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES;
            self.enhanced = execute!(self.writer, PushKeyboardEnhancementFlags(flags)).is_ok();
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();

        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Has the terminal changed size since the last render?
    pub fn size_changed(&self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        tw as usize != self.term_w || th as usize != self.term_h
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        if self.size_changed() {
            let (tw, th) = terminal::size().unwrap_or((80, 24));
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(ScreenCell::BASE_BG), Clear(ClearType::All))?;
        }

        // viewport: terminal cols / CELL_W wide, rows minus HUD, message and help
        let reserved_rows = MAP_ROW + 4;
        let (map_w, map_h) = (world.map.width(), world.map.height());
        world.camera.view_w = (self.term_w / CELL_W).min(map_w).max(1);
        world.camera.view_h = self.term_h.saturating_sub(reserved_rows).min(map_h).max(1);

        let (col, row) = world.focus();
        if world.recenter {
            world.camera.center_on(col, row, map_w, map_h);
            world.recenter = false;
        } else {
            world.camera.follow(col, row, map_w, map_h);
        }

        self.front.clear();
        self.compose_world(world);
        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        world.frame_pending = false;
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = ScreenCell::BASE_BG;
        // cursor position after the last print, if known
        let mut cursor: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(ScreenCell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_world(&mut self, w: &WorldState) {
        let cam = &w.camera;

        self.front.put_bar(HUD_ROW, &hud_line(w), Color::White, HUD_BG);

        for vy in 0..cam.view_h {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..cam.view_w {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width { break; }
                let cell = w.map.cell_at(cam.y + vy as i32, cam.x + vx as i32);
                let (c0, c1, fg, bg) = cell_glyphs(cell);
                self.front.set(col, row, ScreenCell::new(c0, fg, bg));
                self.front.set(col + 1, row, ScreenCell::new(c1, fg, bg));
            }
        }

        let (acol, arow) = w.focus();
        if let Some((vx, vy)) = cam.world_to_view(acol, arow) {
            let (row, col) = (MAP_ROW + vy, vx * CELL_W);
            let bg = self.front.get(col, row).bg;
            let (c0, c1) = actor_glyphs(w.actor.facing, w.actor.kick.tag(), w.actor.has_boot);
            self.front.set(col, row, ScreenCell::new(c0, ACTOR_FG, bg));
            self.front.set(col + 1, row, ScreenCell::new(c1, ACTOR_FG, bg));
        }

        let msg_row = MAP_ROW + cam.view_h + 1;
        if msg_row < self.front.height && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.put_bar(msg_row, &msg, Color::Black, MSG_BG);
        }

        let help_row = MAP_ROW + cam.view_h + 3;
        if help_row < self.front.height {
            self.front.put_str(0, help_row, &self.help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let hdr = Color::Rgb { r: 255, g: 220, b: 50 };
        let cam = &w.camera;

        let view_cols = cam.view_w * CELL_W;
        let box_w = 24_usize.min(view_cols);
        let box_h = 5_usize.min(cam.view_h);
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + cam.view_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, ScreenCell::new(' ', Color::Reset, dim));
            }
        }
        self.front.put_str(box_x + 3, box_y + 1, "╔════════════════╗", hdr, dim);
        self.front.put_str(box_x + 3, box_y + 2, "║     PAUSED     ║", hdr, dim);
        self.front.put_str(box_x + 3, box_y + 3, "╚════════════════╝", hdr, dim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::config::GameConfig;
    use crate::domain::tile::TileId;

    #[test]
    fn cells_show_height_and_slope() {
        let (c0, c1, _, _) = cell_glyphs(Cell::new(TileId(3), 10));
        assert_eq!((c0, c1), ('a', ' '));
        let (c0, c1, _, _) = cell_glyphs(Cell::new(TileId(3), 3));
        assert_eq!((c0, c1), ('3', '▒'));
        let (_, _, _, bg) = cell_glyphs(Cell::VOID);
        assert_eq!(bg, ScreenCell::BASE_BG);
        let (c0, _, fg, _) = cell_glyphs(Cell::new(TileId::BOOT, 0));
        assert_eq!((c0, fg), ('▟', BOOT_FG));
    }

    #[test]
    fn higher_ground_is_lighter() {
        let shade = |h| match height_color(h) {
            Color::Rgb { r, g, b } => r as u32 + g as u32 + b as u32,
            _ => 0,
        };
        assert!(shade(0) < shade(2));
        assert!(shade(2) < shade(12));
        assert_ne!(height_color(2), height_color(3));
    }

    #[test]
    fn actor_glyph_tracks_facing_and_kick() {
        assert_eq!(actor_glyphs(Facing::West, KickTag::Idle, false), ('◀', '●'));
        assert_eq!(actor_glyphs(Facing::North, KickTag::Idle, true), ('▲', '◆'));
        assert_eq!(actor_glyphs(Facing::South, KickTag::Active(KickAction::Climb), true).1, '◉');
        assert_eq!(kick_label(KickTag::Active(KickAction::GrabBoot { row: 1, col: 2 })), "grab");
    }

    #[test]
    fn help_uses_first_binding() {
        let mut c = GameConfig::from_toml_str("", Path::new(".")).controls;
        c.kick = vec!["Space".into(), "z".into()];
        c.quit = vec![];
        let help = help_line(&c);
        assert!(help.contains("Space:Kick"));
        assert!(help.contains("-:Quit"));
    }

    #[test]
    fn bar_fills_the_row() {
        let mut fb = FrameBuffer::new(6, 2);
        fb.put_bar(1, "hi", Color::Black, MSG_BG);
        assert_eq!(fb.get(0, 1).ch, 'h');
        assert_eq!(fb.get(5, 1).bg, MSG_BG);
        assert_eq!(fb.get(5, 0), ScreenCell::BLANK);
    }
}
