//! Cow Empire rendering: farm, referral, and withdraw screens plus the
//! offline-earnings overlay. Every tappable row registers a click target.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::ClickState;

use super::actions::*;
use super::format::format_scaled;
use super::logic;
use super::state::{ReferralPhase, UpgradeKind, MIN_WITHDRAW, SWAP_COST};
use super::{MilkGame, Screen, WithdrawField};

/// Idle cow art, two frames for a slow blink.
const COW_ART: &[&[&str]] = &[
    &[
        r"         ^__^",
        r"         (oo)\_______",
        r"         (__)\       )\/\",
        r"             ||----w |",
        r"             ||     ||",
    ],
    &[
        r"         ^__^",
        r"         (--)\_______",
        r"         (__)\       )\/\",
        r"             ||----w |",
        r"             ||     ||",
    ],
];

/// Pressed frame shown briefly after a tap.
const COW_CLICK_ART: &[&str] = &[
    r"         ^__^",
    r"         (OO)\_______",
    r"         (__)\       )\/\  moo!",
    r"             ||----w |",
    r"             ||     ||",
];

pub fn render(game: &MilkGame, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(game, f, chunks[0]);

    // Log panel on the right when wide enough.
    let (content, log_area) = if chunks[1].width >= 80 {
        let h = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        (h[0], Some(h[1]))
    } else {
        (chunks[1], None)
    };

    match game.screen {
        Screen::Farm => render_farm(game, f, content, click_state),
        Screen::Referral => render_referral(game, f, content, click_state),
        Screen::Withdraw => render_withdraw(game, f, content, click_state),
    }

    if let Some(log_area) = log_area {
        render_log(game, f, log_area);
    }

    render_help(game, f, chunks[2]);

    if game.offline_offer.is_some() {
        render_offline_overlay(game, f, area, click_state);
    }
}

fn render_header(game: &MilkGame, f: &mut Frame, area: Rect) {
    let rate = logic::production_rate(&game.state);
    let line = Line::from(vec![
        Span::styled(
            format!(" 🥛 {} ", format_scaled(game.state.milk, false)),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("(+{}/s) ", format_scaled(rate, false)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!(" $COW {} ", format_scaled(game.state.cow_coin as f64, true)),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);
    let header = Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Cow Empire "),
        )
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn render_farm(game: &MilkGame, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),  // cow
            Constraint::Length(5),  // upgrades
            Constraint::Length(4),  // swap + ad
            Constraint::Min(2),     // nav
        ])
        .split(area);

    render_cow(game, f, chunks[0], click_state);
    render_upgrades(game, f, chunks[1], click_state);
    render_economy_buttons(game, f, chunks[2], click_state);
    render_nav(f, chunks[3], click_state);
}

fn render_cow(game: &MilkGame, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let art: &[&str] = if game.click_flash_ms > 0.0 {
        COW_CLICK_ART
    } else {
        COW_ART[(game.anim_frame / 4) as usize % COW_ART.len()]
    };
    let lines: Vec<Line> = art
        .iter()
        .map(|row| {
            Line::from(Span::styled(
                *row,
                Style::default().fg(if game.click_flash_ms > 0.0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ))
        })
        .collect();
    let cow = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" The Barn (tap the cow) "),
    );
    f.render_widget(cow, area);
    click_state.borrow_mut().add_target(area, CLICK_COW);
}

fn render_upgrades(
    game: &MilkGame,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let items: Vec<ListItem> = UpgradeKind::all()
        .iter()
        .map(|kind| {
            let upgrade = game.state.upgrade(kind);
            let cost = logic::upgrade_cost(&game.state, kind);
            let affordable = game.state.milk >= cost;
            let style = if affordable {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" [{}] ", kind.key()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "{:<13} Lv.{:<3} x{:.2}  cost {} milk",
                        kind.name(),
                        upgrade.level,
                        upgrade.multiplier,
                        format_scaled(cost, true)
                    ),
                    style,
                ),
                Span::styled(
                    format!("  {}", kind.description()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Upgrades "),
    );
    f.render_widget(list, area);

    let mut cs = click_state.borrow_mut();
    for (i, kind) in UpgradeKind::all().iter().enumerate() {
        let action = match kind {
            UpgradeKind::Quality => BUY_QUALITY,
            UpgradeKind::Count => BUY_COUNT,
            UpgradeKind::Happiness => BUY_HAPPINESS,
        };
        let row = area.y + 1 + i as u16;
        cs.add_target(Rect::new(area.x, row, area.width, 1), action);
    }
}

fn render_economy_buttons(
    game: &MilkGame,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let swap_ready = game.state.milk >= SWAP_COST;
    let ad_busy = game.ad_gate.is_in_flight();

    let swap_style = if swap_ready {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let ad_style = if ad_busy {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let lines = vec![
        Line::from(Span::styled(
            format!(" [S] Swap {} milk → 1 $COW", format_scaled(SWAP_COST, true)),
            swap_style,
        )),
        Line::from(Span::styled(
            if ad_busy {
                " [A] Watching ad...".to_string()
            } else {
                " [A] Watch an ad (+1-50 $COW)".to_string()
            },
            ad_style,
        )),
    ];
    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Exchange "),
    );
    f.render_widget(block, area);

    let mut cs = click_state.borrow_mut();
    cs.add_target(Rect::new(area.x, area.y + 1, area.width, 1), SWAP_MILK);
    cs.add_target(Rect::new(area.x, area.y + 2, area.width, 1), WATCH_AD);
}

fn render_nav(f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let lines = vec![
        Line::from(Span::styled(
            " [R] Invite friends (+5% each)",
            Style::default().fg(Color::Magenta),
        )),
        Line::from(Span::styled(
            " [W] Withdraw $COW",
            Style::default().fg(Color::Blue),
        )),
    ];
    let block = Paragraph::new(lines);
    f.render_widget(block, area);

    let mut cs = click_state.borrow_mut();
    cs.add_target(Rect::new(area.x, area.y, area.width, 1), GO_REFERRAL);
    cs.add_target(Rect::new(area.x, area.y + 1, area.width, 1), GO_WITHDRAW);
}

fn render_referral(
    game: &MilkGame,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let referral = &game.state.referral;
    let link = game.share_link.as_deref().unwrap_or("Loading...");
    let bonus = referral.referral_count * 5;

    let mut lines = vec![
        Line::from(Span::styled(
            format!(" Friends invited: {}", referral.referral_count),
            Style::default().fg(Color::White),
        )),
        Line::from(Span::styled(
            format!(" Production bonus: +{}%", bonus),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Your link: {}", link),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " [C] Copy invite link",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(" [Q] Back", Style::default().fg(Color::Gray))),
    ];
    if let Some(by) = &referral.referred_by {
        lines.push(Line::from(""));
        let status = match referral.phase() {
            ReferralPhase::ReferralPending => " (verifying welcome bonus...)",
            _ => "",
        };
        lines.push(Line::from(Span::styled(
            format!(" Invited by {}{}", by, status),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let block = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title(" Invite Friends "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(block, area);

    let mut cs = click_state.borrow_mut();
    cs.add_target(Rect::new(area.x, area.y + 6, area.width, 1), COPY_REF_LINK);
    cs.add_target(Rect::new(area.x, area.y + 7, area.width, 1), BACK_TO_FARM);
}

fn render_withdraw(
    game: &MilkGame,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let form = &game.withdraw_form;
    let field_line = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::styled(format!(" {label} "), Style::default().fg(Color::Gray)),
            Span::styled(format!("{value}_"), style),
        ])
    };

    let lines = vec![
        Line::from(Span::styled(
            format!(
                " Balance: {} $COW   (minimum withdrawal {})",
                game.state.cow_coin, MIN_WITHDRAW
            ),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        field_line(
            "TON address:",
            &form.address,
            form.focus == WithdrawField::Address,
        ),
        field_line(
            "Amount:     ",
            &form.amount,
            form.focus == WithdrawField::Amount,
        ),
        Line::from(""),
        Line::from(Span::styled(
            if form.submitting {
                " Sending..."
            } else {
                " [Enter] Submit request"
            },
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            " [Tab] Switch field   [Esc] Back",
            Style::default().fg(Color::Gray),
        )),
    ];

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Withdraw $COW "),
    );
    f.render_widget(block, area);

    let mut cs = click_state.borrow_mut();
    cs.add_target(Rect::new(area.x, area.y + 3, area.width, 1), FOCUS_ADDRESS);
    cs.add_target(Rect::new(area.x, area.y + 4, area.width, 1), FOCUS_AMOUNT);
    cs.add_target(Rect::new(area.x, area.y + 6, area.width, 1), SUBMIT_WITHDRAW);
    cs.add_target(Rect::new(area.x, area.y + 7, area.width, 1), BACK_TO_FARM);
}

fn render_log(game: &MilkGame, f: &mut Frame, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = game.log.len().saturating_sub(visible);
    let lines: Vec<Line> = game.log[start..]
        .iter()
        .map(|entry| {
            let style = if entry.is_important {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(&entry.text, style))
        })
        .collect();
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue))
                .title(" News "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(widget, area);
}

fn render_help(game: &MilkGame, f: &mut Frame, area: Rect) {
    let text = if game.offline_offer.is_some() {
        "[C] Collect offline milk   [X] Dismiss"
    } else {
        match game.screen {
            Screen::Farm => "[C] Pet cow  [1-3] Upgrade  [S] Swap  [A] Ad  [R] Invite  [W] Withdraw",
            Screen::Referral => "[C] Copy link  [Q] Back",
            Screen::Withdraw => "Type to fill fields  [Tab] Switch  [Enter] Submit  [Esc] Back",
        }
    };
    let help = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
    .alignment(Alignment::Center);
    f.render_widget(help, area);
}

/// Centered modal offering the computed offline earnings.
fn render_offline_overlay(
    game: &MilkGame,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let Some(credit) = &game.offline_offer else { return };

    let width = area.width.min(46);
    let height = 8u16;
    let rect = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );
    f.render_widget(Clear, rect);

    let lines = vec![
        Line::from(Span::styled(
            " Welcome back!",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                " Your cows made {} milk while you were away.",
                format_scaled(credit.amount(), true)
            ),
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " [C] Collect",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(" [X] Dismiss", Style::default().fg(Color::Gray))),
    ];
    let modal = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Offline Earnings "),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(modal, rect);

    let mut cs = click_state.borrow_mut();
    cs.add_target(Rect::new(rect.x, rect.y + 5, rect.width, 1), CLAIM_OFFLINE);
    cs.add_target(Rect::new(rect.x, rect.y + 6, rect.width, 1), DISMISS_OFFLINE);
}
