use crate::client::AppSnapshot;
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use raffle_client::{
    notify::{
        Notification,
        NotifyKind,
    },
    session::SessionState,
    short_address,
    sync::RaffleSnapshot,
    units,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Connect,
    DisconnectSignal,
    SwitchAccount,
    EnterRaffle,
    Refresh,
}

#[derive(Debug, Default)]
pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

/// Reads crossterm events on a dedicated thread and maps them to
/// [`UserEvent`]s; the receiver plugs into the app's select loop.
pub fn spawn_input_pump() -> mpsc::UnboundedReceiver<UserEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let Ok(ev) = event::read() else {
                break;
            };
            let Event::Key(key) = ev else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let mapped = match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
                KeyCode::Char('c') => Some(UserEvent::Connect),
                KeyCode::Char('d') => Some(UserEvent::DisconnectSignal),
                KeyCode::Char('a') => Some(UserEvent::SwitchAccount),
                KeyCode::Char('e') | KeyCode::Enter => Some(UserEvent::EnterRaffle),
                KeyCode::Char('r') => Some(UserEvent::Refresh),
                _ => None,
            };
            if let Some(ev) = mapped {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        }
    });
    rx
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // One persistent Terminal so buffers survive across draws
    let backend = CrosstermBackend::new(stdout());
    state.terminal = Some(Terminal::new(backend)?);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| page(f, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

fn page(f: &mut Frame, snap: &AppSnapshot) {
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(10),
        Constraint::Length(6),
    ])
    .split(f.area());

    render_header(f, rows[0], snap);
    match &snap.raffle {
        Some(raffle) => render_raffle(f, rows[1], raffle, snap.submitting),
        None => render_no_raffle(f, rows[1], snap.chain_id),
    }
    render_notifications(f, rows[2], &snap.notifications);
}

fn render_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let status = match &snap.session {
        SessionState::Connected(address) => Span::styled(
            format!("Connected @{}", short_address(address)),
            Style::new().fg(Color::Green),
        ),
        SessionState::Connecting => {
            Span::styled("Connecting…", Style::new().fg(Color::Yellow))
        }
        SessionState::Disconnected => Span::styled(
            "Disconnected — [c] connect",
            Style::new().fg(Color::DarkGray),
        ),
    };
    let line = Line::from(vec![
        Span::raw(format!("Smart Contract Raffle — chain {}  ", snap.chain_id)),
        status,
    ]);
    let header = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" [c]onnect [d]isconnect [a]ccount [e]nter [r]efresh [q]uit "),
    );
    f.render_widget(header, area);
}

fn render_raffle(f: &mut Frame, area: Rect, raffle: &RaffleSnapshot, submitting: bool) {
    let parts =
        Layout::vertical([Constraint::Length(5), Constraint::Min(5)]).split(area);

    let winner = if raffle.recent_winner.is_empty() {
        String::from("—")
    } else {
        raffle.recent_winner.clone()
    };
    let entry_hint = if submitting {
        Span::styled("submitting entry…", Style::new().fg(Color::Yellow))
    } else {
        Span::raw("press [e] to enter the raffle")
    };
    let info = Paragraph::new(vec![
        Line::raw(format!(
            "Entrance fee: {} ETH",
            units::format_wei(raffle.entrance_fee_wei)
        )),
        Line::raw(format!("Players in the raffle: {}", raffle.player_count)),
        Line::from(vec![Span::raw(format!("Recent winner: {winner}  ")), entry_hint]),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Raffle "));
    f.render_widget(info, parts[0]);

    let title = if raffle.players_loading {
        format!(" Players ({}) — loading… ", raffle.player_count)
    } else {
        format!(" Players ({}) ", raffle.player_count)
    };
    let rows: Vec<Row> = raffle
        .players
        .iter()
        .map(|player| {
            Row::new(vec![player.index.to_string(), player.address.clone()])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(4), Constraint::Min(20)])
        .header(Row::new(vec!["#", "Player"]).style(Style::new().fg(Color::Blue)))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, parts[1]);
}

fn render_no_raffle(f: &mut Frame, area: Rect, chain_id: u64) {
    let body = Paragraph::new(format!(
        "No raffle deployment detected for chain {chain_id}."
    ))
    .style(Style::new().fg(Color::Red))
    .block(Block::default().borders(Borders::ALL).title(" Raffle "));
    f.render_widget(body, area);
}

fn render_notifications(f: &mut Frame, area: Rect, notifications: &[Notification]) {
    let lines: Vec<Line> = notifications
        .iter()
        .map(|toast| {
            let style = match toast.kind {
                NotifyKind::Success => Style::new().fg(Color::Green),
                NotifyKind::Error => Style::new().fg(Color::Red),
            };
            Line::styled(format!("{}: {}", toast.title, toast.message), style)
        })
        .collect();
    let feed = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Notifications "),
    );
    f.render_widget(feed, area);
}
