use crate::anim::{Channel, Element};
use crate::config::Settings;
use crate::director::Director;
use crate::model::{Layout, Rect, Rgb, MOODS};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    /// Replace glyph and foreground, keep whatever background is there.
    pub(crate) fn over(&mut self, x: u16, y: u16, ch: char, fg: Color) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i].ch = ch;
            self.cells[i].fg = fg;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }
    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);

        // Braille: 2×4 pixels per cell
        let canvas = PixelCanvas::new(cols as u32 * 2, rows as u32 * 4);

        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
            canvas,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Pack canvas ink into braille glyphs over the existing cells. Only cells
/// with ink are touched, and they keep their background, so the card
/// gradient shows through the face.
fn canvas_overlay(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    let a = p.a as u32;

                    // threshold: treat alpha as ink
                    if a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            if mask == 0 {
                continue;
            }
            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                let r = (sum_r / ink_count) as u8;
                let g = (sum_g / ink_count) as u8;
                let b = (sum_b / ink_count) as u8;
                Color::Rgb { r, g, b }
            } else {
                Color::White
            };

            out.over(cx as u16, cy as u16, ch, fg);
        }
    }
}

/* -----------------------------
   Widget layout and drawing
------------------------------ */

const CARD_W: u16 = 44;
const CARD_H: u16 = 19;

/// Choreography units (the ±200/300 confetti travel, ±10 pupil offsets) to
/// canvas subpixels.
const UNIT_SCALE: f32 = 0.2;

const CONFETTI_TINTS: [Rgb; 5] = [
    Rgb::new(255, 200, 60),
    Rgb::new(255, 90, 90),
    Rgb::new(110, 230, 205),
    Rgb::new(120, 180, 255),
    Rgb::new(185, 95, 255),
];

fn tint(c: Rgb) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

pub(crate) fn compute_layout(cols: u16, rows: u16) -> Layout {
    let w = CARD_W.min(cols.saturating_sub(2)).max(24);
    let h = CARD_H.min(rows.saturating_sub(2)).max(12);
    let x = cols.saturating_sub(w) / 2;
    let y = rows.saturating_sub(h) / 2;
    let card = Rect { x, y, w, h };

    let dots_y = y + h.saturating_sub(5);
    let inset = 6u16;
    let centers = [x + inset, x + w / 2, x + w - inset - 1];
    let dots = centers.map(|cx| Rect {
        x: cx.saturating_sub(1),
        y: dots_y.saturating_sub(1),
        w: 3,
        h: 3,
    });

    Layout {
        card,
        dots,
        burst_stage: false,
    }
}

/// Draw one frame of the widget into the terminal's buffers and report the
/// geometry used, so the director can normalize pointer input against it.
pub(crate) fn draw_widget(term: &mut Terminal, director: &Director, settings: &Settings) -> Layout {
    term.cur.clear(Color::Black);
    term.canvas.clear(Pixel::default());

    let mut layout = compute_layout(term.cols, term.rows);
    let card = layout.card;
    let st = &director.state;

    draw_card(&mut term.cur, director, card, settings.enable_color);

    if !st.submitted {
        draw_text_centered(&mut term.cur, card, 1, &settings.prompt, Color::White);
        draw_slider(&mut term.cur, &layout);
        draw_mood_label(&mut term.cur, director, card, settings.enable_color);
        if st.show_feedback {
            draw_feedback_line(&mut term.cur, st, card);
        }
    } else {
        draw_thanks(&mut term.cur, st, card);
        // the confetti container now exists on screen
        layout.burst_stage = true;
    }

    if settings.enable_braille {
        draw_face_canvas(&mut term.canvas, director, card);
        if !st.submitted {
            draw_dots_canvas(&mut term.canvas, director, &layout);
        } else {
            draw_confetti_canvas(&mut term.canvas, director, card);
        }
        canvas_overlay(&term.canvas, &mut term.cur, settings.enable_color);
    } else {
        draw_face_ascii(&mut term.cur, director, card);
        if !st.submitted {
            draw_dots_ascii(&mut term.cur, director, &layout);
        } else {
            draw_confetti_ascii(&mut term.cur, director, card);
        }
    }

    draw_hints(&mut term.cur, st);
    layout
}

fn card_color_at(director: &Director, card: Rect, row: u16) -> Rgb {
    let (top, bot) = director.card_palette();
    let span = card.h.max(2) - 1;
    let t = row.saturating_sub(card.y) as f32 / span as f32;
    top.mix(bot, t)
}

fn draw_card(buf: &mut CellBuffer, director: &Director, card: Rect, enable_color: bool) {
    for row in card.y..card.y + card.h {
        let bg = if enable_color {
            tint(card_color_at(director, card, row))
        } else {
            Color::Black
        };
        for col in card.x..card.x + card.w {
            buf.set(
                col,
                row,
                Cell {
                    ch: ' ',
                    fg: Color::White,
                    bg,
                },
            );
        }
    }

    let fg = Color::White;
    let (x1, y1) = (card.x + card.w - 1, card.y + card.h - 1);
    for col in card.x + 1..x1 {
        buf.over(col, card.y, '─', fg);
        buf.over(col, y1, '─', fg);
    }
    for row in card.y + 1..y1 {
        buf.over(card.x, row, '│', fg);
        buf.over(x1, row, '│', fg);
    }
    buf.over(card.x, card.y, '╭', fg);
    buf.over(x1, card.y, '╮', fg);
    buf.over(card.x, y1, '╰', fg);
    buf.over(x1, y1, '╯', fg);
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

pub(crate) fn draw_text_over(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.over(xx, y, ch, fg);
    }
}

fn draw_text_centered(buf: &mut CellBuffer, card: Rect, row_in_card: u16, s: &str, fg: Color) {
    let max_w = card.w.saturating_sub(4) as usize;
    let shown: String = s.chars().take(max_w).collect();
    let x = card.x + (card.w.saturating_sub(shown.chars().count() as u16)) / 2;
    draw_text_over(buf, x, card.y + row_in_card, &shown, fg);
}

fn draw_slider(buf: &mut CellBuffer, layout: &Layout) {
    let rail_y = layout.dots[0].y + 1;
    let from = layout.dots[0].x + 1;
    let to = layout.dots[2].x + 1;
    for col in from..=to {
        buf.over(col, rail_y, '─', Color::Grey);
    }

    let names = ["Bad", "Okay", "Good"];
    for (i, name) in names.iter().enumerate() {
        let cx = layout.dots[i].x + 1;
        let x = (cx as i32 - name.len() as i32 / 2).max(0) as u16;
        draw_text_over(buf, x, rail_y + 2, name, Color::Grey);
    }
}

fn draw_mood_label(buf: &mut CellBuffer, director: &Director, card: Rect, enable_color: bool) {
    let a = &director.anim;
    let opacity = a.value(Element::Label, Channel::Opacity).clamp(0.0, 1.0);
    if opacity <= 0.01 {
        return;
    }
    let scale = a.value(Element::Label, Channel::Scale);
    let xoff = (a.value(Element::Label, Channel::X) * 0.5).round() as i32;

    let text = director.state.mood.label();
    // the overshoot pop reads as letter-spacing in cell space
    let rendered: String = if scale > 1.02 {
        let spaced: String = text.chars().flat_map(|c| [c, ' ']).collect();
        spaced.trim_end().to_string()
    } else {
        text.to_string()
    };

    let row = card.y + card.h.saturating_sub(8);
    let fg = if enable_color {
        let bg = card_color_at(director, card, row);
        tint(bg.mix(Rgb::new(255, 255, 255), opacity))
    } else {
        Color::White
    };
    let mut x = card.x as i32 + (card.w as i32 - rendered.chars().count() as i32) / 2 + xoff;
    x = x.max(card.x as i32 + 1);
    draw_text_over(buf, x as u16, row, &rendered, fg);
}

fn draw_feedback_line(buf: &mut CellBuffer, st: &crate::model::WidgetState, card: Rect) {
    let row = card.y + card.h.saturating_sub(2);
    let x = card.x + 2;
    let max_w = card.w.saturating_sub(4) as usize;

    if st.feedback.is_empty() {
        draw_text_over(buf, x, row, "Write your feedback...", Color::Grey);
        return;
    }
    // show the tail so the caret is always visible
    let tail: String = st
        .feedback
        .chars()
        .rev()
        .take(max_w.saturating_sub(1))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let line = format!("{tail}_");
    draw_text_over(buf, x, row, &line, Color::White);
}

fn draw_thanks(buf: &mut CellBuffer, st: &crate::model::WidgetState, card: Rect) {
    let row = card.h.saturating_sub(7);
    draw_text_centered(buf, card, row, "Thank you for your feedback!", Color::White);
    if !st.feedback.is_empty() {
        let quote = format!("\"{}\"", st.feedback);
        draw_text_centered(buf, card, row + 2, &quote, Color::Grey);
    }
}

fn draw_hints(buf: &mut CellBuffer, st: &crate::model::WidgetState) {
    let hint = if st.submitted {
        "h help | q quit"
    } else if st.show_feedback {
        "type feedback | enter submit | esc close box"
    } else {
        "←/→ or 1-3 mood | tab feedback | enter submit | h help | q quit"
    };
    let y = buf.h.saturating_sub(1);
    draw_text(buf, 1, y, hint, Color::Grey, Color::Black);
}

/* -----------------------------
   Face in braille subpixels
------------------------------ */

fn face_center_subpx(card: Rect) -> (f32, f32) {
    let cx = (card.x + card.w / 2) as f32 * 2.0;
    let cy = (card.y as f32 + 6.5) * 4.0;
    (cx, cy)
}

fn fill_disc(canvas: &mut PixelCanvas, cx: f32, cy: f32, r: f32, p: Pixel) {
    let ir = r.ceil() as i32;
    for vy in -ir..=ir {
        for vx in -ir..=ir {
            if ((vx * vx + vy * vy) as f32) <= r * r {
                canvas.blend_over(cx.round() as i32 + vx, cy.round() as i32 + vy, p);
            }
        }
    }
}

fn draw_face_canvas(canvas: &mut PixelCanvas, director: &Director, card: Rect) {
    let a = &director.anim;
    let (cx, cy) = face_center_subpx(card);
    let tilt = a.value(Element::Face, Channel::Rotation).to_radians();
    let pop = a.value(Element::Face, Channel::Scale);
    let (sin, cos) = tilt.sin_cos();
    let place = |u: f32, v: f32| -> (i32, i32) {
        let x = cx + (u * cos - v * sin) * pop;
        let y = cy + (u * sin + v * cos) * pop;
        (x.round() as i32, y.round() as i32)
    };

    // soft ivory disc, brighter at the middle
    let r = 13.0f32;
    let facecol = Pixel {
        r: 248,
        g: 243,
        b: 232,
        a: 235,
    };
    let ir = r as i32;
    for vy in -ir..=ir {
        for vx in -ir..=ir {
            let d2 = (vx * vx + vy * vy) as f32;
            if d2 > r * r {
                continue;
            }
            let t = 1.0 - (d2 / (r * r)).sqrt();
            let alpha = (facecol.a as f32 * (0.45 + 0.55 * t)) as u8;
            let (px, py) = place(vx as f32, vy as f32);
            canvas.blend_over(px, py, Pixel { a: alpha, ..facecol });
        }
    }

    let ink = Pixel {
        r: 24,
        g: 22,
        b: 28,
        a: 250,
    };
    let white = Pixel {
        r: 255,
        g: 255,
        b: 255,
        a: 245,
    };

    for (eye_el, pupil_el, ex) in [
        (Element::LeftEye, Element::LeftPupil, -5.0f32),
        (Element::RightEye, Element::RightPupil, 5.0f32),
    ] {
        let sy = a.value(eye_el, Channel::ScaleY).max(0.05);
        let rx = 2.4f32;
        let ry = 3.2 * sy;
        let ey = -3.5f32;

        for vy in -4..=4 {
            for vx in -3..=3 {
                let nx = vx as f32 / rx;
                let ny = vy as f32 / ry;
                if nx * nx + ny * ny <= 1.0 {
                    let (px, py) = place(ex + vx as f32, ey + vy as f32);
                    canvas.blend_over(px, py, white);
                }
            }
        }

        let ps = a.value(pupil_el, Channel::Scale);
        if ps > 0.05 {
            let ox = a.value(pupil_el, Channel::X) * 0.25;
            let oy = a.value(pupil_el, Channel::Y) * 0.25;
            let (px, py) = place(ex + ox, ey + oy);
            fill_disc(canvas, px as f32, py as f32, 1.3 * ps, ink);
        }
    }

    // mouth arc: +curve bows down (smile), -curve bows up
    let curve = a.value(Element::Mouth, Channel::Curve);
    let mouth_y = 4.5f32;
    let mw = 6.5f32;
    let steps = 26;
    for i in 0..=steps {
        let u = -mw + (2.0 * mw) * i as f32 / steps as f32;
        let v = mouth_y + curve * 2.8 * (1.0 - (u / mw) * (u / mw));
        let (px, py) = place(u, v);
        canvas.blend_over(px, py, ink);
        let (px2, py2) = place(u, v + 0.9);
        canvas.blend_over(px2, py2, ink);
    }
}

fn draw_dots_canvas(canvas: &mut PixelCanvas, director: &Director, layout: &Layout) {
    let a = &director.anim;
    let active = director.state.mood;
    for (i, m) in MOODS.iter().enumerate() {
        let hit = layout.dots[i];
        let cx = (hit.x + 1) as f32 * 2.0 + 1.0;
        let cy = (hit.y + 1) as f32 * 4.0 + 2.0;
        let scale = a.value(Element::Dot(*m), Channel::Scale);
        let (base, p) = if *m == active {
            (
                2.6,
                Pixel {
                    r: 255,
                    g: 255,
                    b: 255,
                    a: 250,
                },
            )
        } else {
            (
                1.7,
                Pixel {
                    r: 235,
                    g: 235,
                    b: 235,
                    a: 150,
                },
            )
        };
        fill_disc(canvas, cx, cy, base * scale, p);
    }
}

fn draw_confetti_canvas(canvas: &mut PixelCanvas, director: &Director, card: Rect) {
    let ox = (card.x + card.w / 2) as f32 * 2.0;
    let oy = (card.y + 2) as f32 * 4.0;
    for p in director.confetti.iter() {
        let (dx, dy, rot) = p.pose();
        let x = ox + dx * UNIT_SCALE;
        let y = oy + dy * UNIT_SCALE;
        let (s, c) = rot.to_radians().sin_cos();
        let rgb = CONFETTI_TINTS[p.tint as usize % CONFETTI_TINTS.len()];
        let px = Pixel {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
            a: 240,
        };
        for k in [-1.0f32, -0.5, 0.0, 0.5, 1.0] {
            let sx = x + c * k * 1.6;
            let sy = y + s * k * 1.6;
            let col = (sx / 2.0).floor() as i32;
            let row = (sy / 4.0).floor() as i32;
            if col < card.x as i32
                || col >= (card.x + card.w) as i32
                || row < card.y as i32
                || row >= (card.y + card.h) as i32
            {
                continue;
            }
            canvas.blend_over(sx.round() as i32, sy.round() as i32, px);
        }
    }
}

/* -----------------------------
   ASCII fallback
------------------------------ */

fn draw_face_ascii(buf: &mut CellBuffer, director: &Director, card: Rect) {
    let a = &director.anim;
    let cx = (card.x + card.w / 2) as i32;
    let cy = (card.y + 6) as i32;

    let blink = a.value(Element::LeftEye, Channel::ScaleY) < 0.5;
    let have_pupils = a.value(Element::LeftPupil, Channel::Scale) > 0.5;
    let look = a.value(Element::LeftPupil, Channel::X);
    let eye = if blink {
        '-'
    } else if have_pupils {
        'O'
    } else {
        'o'
    };
    let shift = if have_pupils {
        (look / 5.0).round().clamp(-1.0, 1.0) as i32
    } else {
        0
    };

    let mut eyes = [' '; 13];
    let li = (3 + shift) as usize;
    let ri = (9 + shift) as usize;
    eyes[li] = eye;
    eyes[ri] = eye;
    let eyes_line: String = eyes.iter().collect();

    let curve = a.value(Element::Mouth, Channel::Curve);
    let mouth = if curve > 0.3 {
        "\\___/"
    } else if curve < -0.3 {
        "/---\\"
    } else {
        "-----"
    };

    let lines = [
        "  .---------.  ".to_string(),
        " /           \\ ".to_string(),
        format!("|{eyes_line}|"),
        "|             |".to_string(),
        format!(" \\   {mouth}   / "),
        "  `---------'  ".to_string(),
    ];
    for (i, line) in lines.iter().enumerate() {
        let x = cx - 7;
        let y = cy - 3 + i as i32;
        if x >= 0 && y >= 0 {
            draw_text_over(buf, x as u16, y as u16, line, Color::White);
        }
    }
}

fn draw_dots_ascii(buf: &mut CellBuffer, director: &Director, layout: &Layout) {
    let a = &director.anim;
    let active = director.state.mood;
    for (i, m) in MOODS.iter().enumerate() {
        let cx = layout.dots[i].x + 1;
        let cy = layout.dots[i].y + 1;
        let scale = a.value(Element::Dot(*m), Channel::Scale);
        let ch = if *m == active {
            if scale > 1.05 {
                '◉'
            } else {
                '●'
            }
        } else {
            '·'
        };
        buf.over(cx, cy, ch, Color::White);
    }
}

fn draw_confetti_ascii(buf: &mut CellBuffer, director: &Director, card: Rect) {
    let glyphs = ['*', '+', 'x', 'o', '•'];
    let ox = (card.x + card.w / 2) as f32;
    let oy = (card.y + 2) as f32;
    for p in director.confetti.iter() {
        let (dx, dy, _rot) = p.pose();
        let col = (ox + dx * UNIT_SCALE / 2.0).round() as i32;
        let row = (oy + dy * UNIT_SCALE / 4.0).round() as i32;
        if col < card.x as i32
            || col >= (card.x + card.w) as i32
            || row < card.y as i32
            || row >= (card.y + card.h) as i32
        {
            continue;
        }
        let rgb = CONFETTI_TINTS[p.tint as usize % CONFETTI_TINTS.len()];
        buf.over(col as u16, row as u16, glyphs[p.tint as usize % glyphs.len()], tint(rgb));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fits_and_orders_dots_left_to_right() {
        let layout = compute_layout(80, 24);
        let card = layout.card;
        assert!(card.x + card.w <= 80);
        assert!(card.y + card.h <= 24);
        // BAD, OKAY, GOOD across the rail
        assert!(layout.dots[0].x < layout.dots[1].x);
        assert!(layout.dots[1].x < layout.dots[2].x);
        for d in layout.dots {
            assert!(card.contains(d.x + 1, d.y + 1));
        }
        assert!(!layout.burst_stage);
    }

    #[test]
    fn layout_survives_tiny_terminals() {
        for (c, r) in [(10u16, 5u16), (26, 13), (300, 80)] {
            let layout = compute_layout(c, r);
            assert!(layout.card.w >= 24);
            assert!(layout.card.h >= 12);
        }
    }
}
