use std::{
    error::Error,
    io::{self, Stdout},
    time::Duration,
};

use crossterm::{
    cursor,
    event::{self, Event as CrosstermEvent, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    config::{self, Settings},
    core::Simulation,
    error::RenderError,
    render::{FrameBuffer, RenderCell, Renderer},
    types::ColorId,
};

/// Renders into a [`FrameBuffer`] and flushes it to the terminal on `present`.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    frame: FrameBuffer,
}

impl TerminalRenderer {
    pub fn new() -> Result<Self, RenderError> {
        enable_raw_mode()?;
        let terminal = or_restore(open_terminal(), abandon_setup)?;
        // From here on Drop restores the terminal.
        let mut renderer = Self {
            terminal,
            frame: FrameBuffer::new(0, 0),
        };
        renderer.terminal.clear()?;
        let size = renderer.terminal.size()?;
        renderer.frame.resize(size.width, size.height);
        Ok(renderer)
    }
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Runs `restore` when `result` is an error, then passes the result on.
fn or_restore<T>(result: io::Result<T>, restore: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        restore();
    }
    result
}

fn abandon_setup() {
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, LeaveAlternateScreen, cursor::Show) {
        warn!("failed to leave alternate screen: {err}");
    }
    if let Err(err) = disable_raw_mode() {
        warn!("failed to disable raw mode: {err}");
    }
}

impl Renderer for TerminalRenderer {
    fn plot(&mut self, x: i32, y: i32, symbol: char) -> Result<(), RenderError> {
        self.frame.plot(x, y, symbol)
    }

    fn plot_colored(
        &mut self,
        x: i32,
        y: i32,
        symbol: char,
        color: ColorId,
    ) -> Result<(), RenderError> {
        self.frame.plot_colored(x, y, symbol, color)
    }

    fn clear_screen(&mut self) {
        self.frame.clear();
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let frame = &self.frame;
        self.terminal.draw(|f| {
            let lines: Vec<Line> = (0..frame.height() as u16)
                .map(|y| line_for(frame.row(y)))
                .collect();
            f.render_widget(Paragraph::new(lines), f.size());
        })?;

        // A new size only takes effect from the next tick.
        let size = self.terminal.size()?;
        if i32::from(size.width) != self.frame.width()
            || i32::from(size.height) != self.frame.height()
        {
            self.frame.resize(size.width, size.height);
        }
        Ok(())
    }

    fn sleep(&mut self, seconds: f64) {
        std::thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
    }

    fn width(&self) -> i32 {
        self.frame.width()
    }

    fn height(&self) -> i32 {
        self.frame.height()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(err) = shutdown_terminal(&mut self.terminal) {
            warn!("failed to restore terminal: {err}");
        }
    }
}

fn shutdown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Groups a row into spans of equal color.
fn line_for(row: &[RenderCell]) -> Line<'static> {
    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_color = None;
    for cell in row {
        if cell.color != run_color && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), style_for(run_color)));
        }
        run_color = cell.color;
        run.push(cell.ch);
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, style_for(run_color)));
    }
    Line::from(spans)
}

fn style_for(color: Option<ColorId>) -> Style {
    match color {
        Some(color) => Style::default()
            .fg(color_for(color))
            .add_modifier(Modifier::BOLD),
        None => Style::default(),
    }
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::Red => Color::Red,
        ColorId::Green => Color::Green,
        ColorId::Yellow => Color::Yellow,
        ColorId::Blue => Color::Blue,
        ColorId::Magenta => Color::Magenta,
        ColorId::Cyan => Color::Cyan,
        ColorId::White => Color::White,
        ColorId::Black => Color::Black,
    }
}

/// Drains pending terminal events; `q`, Esc and Ctrl-C ask to stop.
fn keep_running() -> Result<bool, RenderError> {
    while event::poll(Duration::from_millis(0))? {
        if let CrosstermEvent::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(false);
                }
                _ => {}
            }
        }
    }
    Ok(true)
}

pub fn run(settings: &Settings, ticks: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut renderer = TerminalRenderer::new()?;
    let mut sim = Simulation::new(settings, renderer.width(), renderer.height());
    let ran = sim.run(&mut renderer, ticks, keep_running);
    drop(renderer);
    let ran = ran?;
    info!("stopped after {ran} ticks (seed {})", sim.seed());
    Ok(())
}

/// Runs without a terminal and prints the last frame to stdout.
pub fn run_headless(settings: &Settings, ticks: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut frame = FrameBuffer::new(config::HEADLESS_WIDTH, config::HEADLESS_HEIGHT);
    let mut sim = Simulation::new(settings, frame.width(), frame.height());
    let limit = ticks.unwrap_or(config::HEADLESS_TICKS);
    let ran = sim.run(&mut frame, Some(limit), || Ok(true))?;
    info!(
        "headless run: {ran} ticks (iteration {}), {} frames, {:.2}s of pacing requested",
        sim.iteration(),
        frame.frames(),
        frame.slept()
    );
    info!(
        "{} bodies, {} occupied floor cells, {} non-blank cells, seed {}",
        sim.bodies.len(),
        sim.world.occupied(),
        frame.non_blank(),
        sim.seed()
    );
    for y in 0..frame.height() as u16 {
        let row: String = frame.row(y).iter().map(|cell| cell.ch).collect();
        println!("{}", row.trim_end());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod line_for_fn {
        use super::*;

        fn cell(ch: char, color: Option<ColorId>) -> RenderCell {
            RenderCell { ch, color }
        }

        #[test]
        fn merges_runs_of_same_color() {
            let row = [
                cell('a', Some(ColorId::Red)),
                cell('b', Some(ColorId::Red)),
                cell(' ', None),
                cell('c', Some(ColorId::Blue)),
            ];
            let line = line_for(&row);
            assert_eq!(line.spans.len(), 3);
            assert_eq!(line.spans[0].content, "ab");
            assert_eq!(line.spans[0].style.fg, Some(Color::Red));
            assert_eq!(line.spans[1].style, Style::default());
            assert_eq!(line.spans[2].content, "c");
        }

        #[test]
        fn empty_row_has_no_spans() {
            assert!(line_for(&[]).spans.is_empty());
        }
    }

    mod or_restore_fn {
        use super::*;

        #[test]
        fn restores_only_on_error() {
            let mut restored = 0;
            let ok = or_restore(Ok(5), || restored += 1);
            assert_eq!(ok.expect("ok passes through"), 5);
            assert_eq!(restored, 0);

            let failed: io::Result<()> = or_restore(Err(io::Error::other("no tty")), || restored += 1);
            assert!(failed.is_err());
            assert_eq!(restored, 1);
        }
    }

    mod color_for_fn {
        use super::*;

        #[test]
        fn maps_every_palette_entry() {
            let mapped: Vec<Color> = ColorId::ALL.iter().map(|c| color_for(*c)).collect();
            assert_eq!(mapped.len(), 8);
            assert_eq!(color_for(ColorId::Cyan), Color::Cyan);
            assert_eq!(color_for(ColorId::Black), Color::Black);
        }

        #[test]
        fn colored_cells_are_bold() {
            let style = style_for(Some(ColorId::Green));
            assert!(style.add_modifier.contains(Modifier::BOLD));
        }
    }
}
