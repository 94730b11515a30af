use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Frame;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use lagcomp::MoveKeys;

use crate::headless::viewer_label;
use crate::scene::{DemoScene, PLAYERS};

const TRACK_MIN: f32 = -10.0;
const TRACK_MAX: f32 = 10.0;

/// Without key release events a key counts as held for this long after its
/// last press or repeat.
const HOLD_WINDOW: Duration = Duration::from_millis(500);

const PLAYER_COLORS: [Color; PLAYERS] = [Color::Cyan, Color::Magenta];

/// Tracks held movement keys for both players.
struct KeyLatch {
    held_until: [[Option<Instant>; 2]; PLAYERS],
    release_events: bool,
}

impl KeyLatch {
    fn new(release_events: bool) -> Self {
        Self {
            held_until: [[None; 2]; PLAYERS],
            release_events,
        }
    }

    fn binding(code: KeyCode) -> Option<(usize, usize)> {
        match code {
            KeyCode::Left => Some((0, 0)),
            KeyCode::Right => Some((0, 1)),
            KeyCode::Char('a') | KeyCode::Char('A') => Some((1, 0)),
            KeyCode::Char('d') | KeyCode::Char('D') => Some((1, 1)),
            _ => None,
        }
    }

    /// Returns false if the key is not a movement key.
    fn handle(&mut self, key: &KeyEvent, now: Instant) -> bool {
        let Some((player, direction)) = Self::binding(key.code) else {
            return false;
        };
        let slot = &mut self.held_until[player][direction];
        match key.kind {
            KeyEventKind::Release => *slot = None,
            _ if self.release_events => *slot = Some(now + Duration::from_secs(3600)),
            _ => *slot = Some(now + HOLD_WINDOW),
        }
        true
    }

    fn keys(&self, player: usize, now: Instant) -> MoveKeys {
        let held = |slot: Option<Instant>| slot.is_some_and(|until| until > now);
        let [negative, positive] = self.held_until[player];
        let mut keys = MoveKeys::empty();
        keys.set(MoveKeys::NEGATIVE, held(negative));
        keys.set(MoveKeys::POSITIVE, held(positive));
        keys
    }
}

pub fn run(scene: &mut DemoScene) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, scene, release_events);

    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    scene: &mut DemoScene,
    release_events: bool,
) -> Result<()> {
    let mut latch = KeyLatch::new(release_events);

    loop {
        let now = Instant::now();
        for player in 0..PLAYERS {
            scene.hold(player, latch.keys(player, now));
        }

        scene.tick()?;

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if latch.handle(&key, Instant::now()) {
                    continue;
                }
                if key.kind == KeyEventKind::Press && !handle_command(scene, key.code) {
                    break;
                }
            }
        }

        terminal.draw(|frame| render(frame, scene))?;
    }

    Ok(())
}

/// Returns false when the user asked to quit.
fn handle_command(scene: &mut DemoScene, code: KeyCode) -> bool {
    let toggle = match code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char(c @ '1'..='6') => c as usize - '1' as usize,
        _ => return true,
    };

    let Some(player) = scene.players.get_mut(toggle / 3) else {
        return true;
    };
    let client = &mut player.client;
    match toggle % 3 {
        0 => {
            let enabled = !client.config().prediction;
            client.set_prediction(enabled);
        }
        1 => {
            let enabled = !client.config().reconciliation;
            client.set_reconciliation(enabled);
        }
        _ => {
            let enabled = !client.config().interpolation;
            client.set_interpolation(enabled);
        }
    }
    true
}

fn render(frame: &mut Frame, scene: &DemoScene) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], scene);
    render_track(frame, chunks[1], scene, 1);
    render_track(frame, chunks[2], scene, 0);
    render_track(frame, chunks[3], scene, 2);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, scene: &DemoScene) {
    let block = Block::default()
        .title(" Lag Compensation ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let stats = scene.server.stats();
    let text = format!(
        "Time: {:.1}s  |  Server ticks: {}  |  Server rate: {} Hz  |  In flight to server: {}",
        scene.elapsed_secs(),
        stats.ticks,
        scene.server.config().tick_rate,
        stats.pending_inbound
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_track(frame: &mut Frame, area: Rect, scene: &DemoScene, viewer: u32) {
    let block = Block::default()
        .title(format!(" {} ", viewer_label(viewer)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if viewer == 0 {
            Color::Yellow
        } else {
            PLAYER_COLORS[viewer as usize - 1]
        }));

    let width = area.width.saturating_sub(2) as usize;
    let view = scene.view();
    let lines = vec![
        track_line(view.track(viewer), width),
        Line::from(Span::styled(
            status_text(scene, viewer),
            Style::default().fg(Color::Gray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn track_line(positions: &[Option<f32>], width: usize) -> Line<'static> {
    let mut cells: Vec<Span<'static>> = (0..width)
        .map(|_| Span::styled("·", Style::default().fg(Color::DarkGray)))
        .collect();

    for (id, position) in positions.iter().enumerate() {
        let (Some(position), Some(color)) = (position, PLAYER_COLORS.get(id)) else {
            continue;
        };
        if let Some(column) = column_for(*position, width) {
            cells[column] = Span::styled(
                (id + 1).to_string(),
                Style::default().fg(*color).add_modifier(Modifier::BOLD),
            );
        }
    }
    Line::from(cells)
}

fn column_for(position: f32, width: usize) -> Option<usize> {
    if width == 0 {
        return None;
    }
    let t = ((position - TRACK_MIN) / (TRACK_MAX - TRACK_MIN)).clamp(0.0, 1.0);
    Some((t * (width - 1) as f32).round() as usize)
}

fn status_text(scene: &DemoScene, viewer: u32) -> String {
    if viewer == 0 {
        let acks: Vec<String> = (0..PLAYERS as u32)
            .map(|id| match scene.server.last_processed_input(id) {
                Some(seq) => format!("player {}: #{}", id + 1, seq),
                None => format!("player {}: -", id + 1),
            })
            .collect();
        return format!("Last acknowledged input: {}", acks.join("   "));
    }

    let Some(player) = scene.players.get(viewer as usize - 1) else {
        return String::new();
    };
    let config = player.client.config();
    format!(
        "Lag: {}ms  |  Prediction: {}  |  Reconciliation: {}  |  Interpolation: {}  |  Non-acknowledged inputs: {}",
        config.lag.as_millis(),
        on_off(config.prediction),
        on_off(config.reconciliation),
        on_off(config.interpolation),
        player.client.pending_input_count()
    )
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new(vec![
        Line::from("Player 1: Left/Right to move, 1/2/3 toggle prediction/reconciliation/interpolation"),
        Line::from("Player 2: A/D to move, 4/5/6 toggle prediction/reconciliation/interpolation"),
        Line::from("Press 'q' or ESC to quit"),
    ])
    .block(block)
    .style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );

    frame.render_widget(text, area);
}
