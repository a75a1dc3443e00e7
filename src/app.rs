use crate::config::{load_settings, project_paths, save_settings_atomic, Paths, Settings};
use crate::director::{Action, Director};
use crate::input::{collect_input_nonblocking, map_event_to_action};
use crate::render::{draw_text_over, draw_widget, Cell, Terminal};
use crossterm::style::Color;
use std::time::{Duration, Instant};

// Animation advances in fixed steps so a slow frame can't stretch a tween.
const ANIM_STEP_SECS: f32 = 1.0 / 120.0;
const MAX_CATCHUP_STEPS: u32 = 8;

pub(crate) struct App {
    settings: Settings,
    director: Director,
    paths: Paths,
    term: Terminal,
    should_quit: bool,
    show_help: bool,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let settings = load_settings(&paths.settings_path);
        let director = Director::new(settings.seed);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            director,
            paths,
            term,
            should_quit: false,
            show_help: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(15, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let step = Duration::from_secs_f32(ANIM_STEP_SECS);

        let mut last_frame = Instant::now();
        let mut acc = Duration::ZERO;

        while !self.should_quit {
            let _resized = self.term.resize_if_needed()?;

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                if let Some(action) = map_event_to_action(&self.director.state, &ev) {
                    match action {
                        Action::Quit => {
                            self.should_quit = true;
                            break;
                        }
                        Action::HelpToggle => self.show_help = !self.show_help,
                        other => self.director.apply(other),
                    }
                }
            }

            // animation fixed-step, with a capped catch-up after stalls
            let now = Instant::now();
            acc = acc.saturating_add(now.saturating_duration_since(last_frame));
            last_frame = now;

            let mut steps = 0;
            while acc >= step {
                self.director.tick(ANIM_STEP_SECS);
                acc = acc.saturating_sub(step);
                steps += 1;
                if steps >= MAX_CATCHUP_STEPS {
                    acc = Duration::ZERO;
                    break;
                }
            }

            self.render_frame()?;

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let layout = draw_widget(&mut self.term, &self.director, &self.settings);
        self.director.set_layout(layout);

        if self.show_help {
            self.draw_help_box();
        }

        self.term.present(true)?;
        Ok(())
    }

    fn draw_help_box(&mut self) {
        let (w, h) = (self.term.cols, self.term.rows);
        let bw = 48.min(w.saturating_sub(4));
        let bh = 14.min(h.saturating_sub(2));
        if bw < 20 || bh < 8 {
            return;
        }
        let x0 = (w - bw) / 2;
        let y0 = (h - bh) / 2;
        let buf = &mut self.term.cur;

        for y in y0..y0 + bh {
            for x in x0..x0 + bw {
                buf.set(
                    x,
                    y,
                    Cell {
                        ch: ' ',
                        fg: Color::White,
                        bg: Color::Black,
                    },
                );
            }
        }
        for x in x0..x0 + bw {
            buf.over(x, y0, '─', Color::White);
            buf.over(x, y0 + bh - 1, '─', Color::White);
        }
        for y in y0..y0 + bh {
            buf.over(x0, y, '│', Color::White);
            buf.over(x0 + bw - 1, y, '│', Color::White);
        }
        buf.over(x0, y0, '┌', Color::White);
        buf.over(x0 + bw - 1, y0, '┐', Color::White);
        buf.over(x0, y0 + bh - 1, '└', Color::White);
        buf.over(x0 + bw - 1, y0 + bh - 1, '┘', Color::White);

        draw_text_over(buf, x0 + 2, y0 + 1, "How to use", Color::White);
        let body = [
            "Pick a mood and tell us how it went.",
            "",
            "left/right, 1-3   select a mood",
            "mouse             the face follows your pointer",
            "click a dot       select that mood",
            "tab               open or close the feedback box",
            "enter             submit",
            "q or esc          quit",
            "",
            "h closes this help.",
        ];
        for (i, line) in body.iter().enumerate() {
            let y = y0 + 3 + i as u16;
            if y >= y0 + bh - 1 {
                break;
            }
            draw_text_over(buf, x0 + 2, y, line, Color::Grey);
        }
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
