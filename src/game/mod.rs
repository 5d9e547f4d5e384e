//! Cow Empire — an idle milk-and-coin clicker.

pub mod actions;
pub mod format;
pub mod logic;
pub mod referral;
pub mod render;
pub mod save;
mod simulator;
pub mod state;

use crate::ads::AdGate;
use crate::audio;
use crate::input::InputEvent;
use crate::time::{FrameClock, OneShot, PeriodicTask};

use actions::*;
use logic::OfflineCredit;
use referral::RewardDelivery;
use state::{EconomyState, UpgradeKind};

/// Engine tick cadence: one second of production per tick.
pub const TICK_SECS: f64 = 1.0;
const TICK_INTERVAL_MS: f64 = 1_000.0;
/// Persistence flush cadence.
const FLUSH_INTERVAL_MS: f64 = 5_000.0;
/// Ambient sound roll cadence.
const AMBIENT_INTERVAL_MS: f64 = 10_000.0;
/// Simulated verification delay before the welcome bonus lands.
const WELCOME_DELAY_MS: f64 = 3_000.0;
/// Largest frame delta fed to the scheduler; longer gaps are the
/// offline-earnings path's business.
const MAX_FRAME_DELTA_MS: f64 = 2_000.0;

/// Which screen is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Farm,
    Referral,
    Withdraw,
}

/// Which withdraw-form field has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawField {
    Address,
    Amount,
}

/// Withdrawal form state. Text lives here until submission; validation
/// and the debit happen in `logic::begin_withdrawal`.
pub struct WithdrawForm {
    pub address: String,
    pub amount: String,
    pub focus: WithdrawField,
    pub submitting: bool,
}

impl WithdrawForm {
    fn new() -> Self {
        Self {
            address: String::new(),
            amount: String::new(),
            focus: WithdrawField::Address,
            submitting: false,
        }
    }

    fn reset(&mut self) {
        self.address.clear();
        self.amount.clear();
        self.focus = WithdrawField::Address;
        self.submitting = false;
    }
}

/// A notification entry.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

/// Side effects the shell must run outside the game borrow (async
/// boundaries cannot be entered while `&mut self` is held).
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    None,
    WatchAd,
    SubmitWithdrawal { address: String, amount: u64 },
    CopyInviteLink,
}

/// Top-level game: the economy ledger plus UI state and scheduling.
pub struct MilkGame {
    pub state: EconomyState,
    pub screen: Screen,
    pub log: Vec<LogEntry>,
    pub ad_gate: AdGate,
    pub offline_offer: Option<OfflineCredit>,
    pub withdraw_form: WithdrawForm,
    /// Outbound invite link, filled in by the shell once location is known.
    pub share_link: Option<String>,
    /// Animation frame, one per engine tick.
    pub anim_frame: u32,
    /// Cow press feedback, milliseconds remaining.
    pub click_flash_ms: f64,

    clock: FrameClock,
    tick_task: PeriodicTask,
    flush_task: PeriodicTask,
    ambient_task: PeriodicTask,
    welcome_delay: Option<OneShot>,
}

impl MilkGame {
    pub fn new(now_ms: f64) -> Self {
        let state = EconomyState::new(now_ms);

        #[cfg(target_arch = "wasm32")]
        let state = save::load_game(now_ms).unwrap_or(state);

        Self {
            state,
            screen: Screen::Farm,
            log: Vec::new(),
            ad_gate: AdGate::new(),
            offline_offer: None,
            withdraw_form: WithdrawForm::new(),
            share_link: None,
            anim_frame: 0,
            click_flash_ms: 0.0,
            clock: FrameClock::new(MAX_FRAME_DELTA_MS),
            tick_task: PeriodicTask::new(TICK_INTERVAL_MS),
            flush_task: PeriodicTask::new(FLUSH_INTERVAL_MS),
            ambient_task: PeriodicTask::new(AMBIENT_INTERVAL_MS),
            welcome_delay: None,
        }
    }

    /// Session-start reconciliation: identity, pending referrer credit,
    /// inbound invite link, offline earnings offer.
    pub fn startup(
        &mut self,
        now_ms: f64,
        inbound_referrer: Option<&str>,
        delivery: &mut dyn RewardDelivery,
    ) {
        referral::ensure_identity(&mut self.state);

        let credited = referral::collect_pending_referral_credit(&mut self.state, delivery);
        if credited > 0 {
            self.notify_important(&format!(
                "{} friend(s) joined through your invite! Production +{}%",
                credited,
                credited * 5
            ));
        }

        if let Some(referrer) = inbound_referrer {
            if referral::resolve_inbound_referral(&mut self.state, referrer, delivery) {
                self.welcome_delay = Some(OneShot::new(WELCOME_DELAY_MS));
                self.notify("Invite accepted! Verifying your welcome bonus...");
            }
        }

        self.offline_offer = logic::claim_offline_earnings(&mut self.state, now_ms);
        self.persist();
    }

    /// Drive all periodic work from the frame clock. Called once per draw.
    pub fn advance_frame(&mut self, now_ms: f64) {
        let delta = self.clock.frame(now_ms);

        for _ in 0..self.tick_task.advance(delta) {
            logic::tick(&mut self.state, TICK_SECS, now_ms);
            self.anim_frame = self.anim_frame.wrapping_add(1);
        }

        if self.flush_task.advance(delta) > 0 {
            self.persist();
        }

        for _ in 0..self.ambient_task.advance(delta) {
            if self.state.next_random() % 5 == 0 {
                audio::play_sound(audio::SOUND_MOO);
            }
        }

        let welcome_fired = self
            .welcome_delay
            .as_mut()
            .map_or(false, |shot| shot.advance(delta));
        if welcome_fired {
            self.welcome_delay = None;
            if logic::apply_referral_welcome_bonus(&mut self.state) {
                audio::play_sound(audio::SOUND_UPGRADE);
                self.notify_important(&format!("Welcome bonus: +{} $COW!", state::WELCOME_BONUS));
                self.persist();
            }
        }

        if self.click_flash_ms > 0.0 {
            self.click_flash_ms = (self.click_flash_ms - delta).max(0.0);
        }
    }

    /// Handle one input event. Returns a side effect for the shell to run
    /// after the borrow ends.
    pub fn handle_input(&mut self, event: &InputEvent) -> Effect {
        // The offline offer is modal.
        if self.offline_offer.is_some() {
            self.handle_offline_overlay(event);
            return Effect::None;
        }

        let effect = match self.screen {
            Screen::Farm => self.handle_farm(event),
            Screen::Referral => self.handle_referral(event),
            Screen::Withdraw => self.handle_withdraw(event),
        };
        self.persist();
        effect
    }

    fn handle_offline_overlay(&mut self, event: &InputEvent) {
        let action = match event {
            InputEvent::Key('c') | InputEvent::Enter | InputEvent::Click(CLAIM_OFFLINE) => {
                Some(true)
            }
            InputEvent::Key('x') | InputEvent::Escape | InputEvent::Click(DISMISS_OFFLINE) => {
                Some(false)
            }
            _ => None,
        };
        let Some(claim) = action else { return };
        let Some(credit) = self.offline_offer.take() else { return };
        if claim {
            let amount = credit.amount();
            logic::commit_offline_earnings(&mut self.state, credit);
            self.notify_important(&format!(
                "+{} milk collected while you were away!",
                format::format_scaled(amount, true)
            ));
        }
        self.persist();
    }

    fn handle_farm(&mut self, event: &InputEvent) -> Effect {
        let action = match event {
            InputEvent::Key('c') | InputEvent::Click(CLICK_COW) => CLICK_COW,
            InputEvent::Key('1') | InputEvent::Click(BUY_QUALITY) => BUY_QUALITY,
            InputEvent::Key('2') | InputEvent::Click(BUY_COUNT) => BUY_COUNT,
            InputEvent::Key('3') | InputEvent::Click(BUY_HAPPINESS) => BUY_HAPPINESS,
            InputEvent::Key('s') | InputEvent::Click(SWAP_MILK) => SWAP_MILK,
            InputEvent::Key('a') | InputEvent::Click(WATCH_AD) => WATCH_AD,
            InputEvent::Key('r') | InputEvent::Click(GO_REFERRAL) => GO_REFERRAL,
            InputEvent::Key('w') | InputEvent::Click(GO_WITHDRAW) => GO_WITHDRAW,
            _ => return Effect::None,
        };
        match action {
            CLICK_COW => {
                self.click_flash_ms = 300.0;
                if self.state.next_random() % 2 == 0 {
                    audio::play_sound(audio::SOUND_MOO);
                }
            }
            BUY_QUALITY => self.buy(UpgradeKind::Quality),
            BUY_COUNT => self.buy(UpgradeKind::Count),
            BUY_HAPPINESS => self.buy(UpgradeKind::Happiness),
            SWAP_MILK => {
                if logic::swap(&mut self.state) {
                    audio::play_sound(audio::SOUND_UPGRADE);
                    self.notify("You got 1 $COW!");
                }
            }
            WATCH_AD => {
                if !self.ad_gate.is_in_flight() {
                    return Effect::WatchAd;
                }
            }
            GO_REFERRAL => self.screen = Screen::Referral,
            GO_WITHDRAW => {
                self.withdraw_form.reset();
                self.screen = Screen::Withdraw;
            }
            _ => {}
        }
        Effect::None
    }

    fn buy(&mut self, kind: UpgradeKind) {
        match logic::buy_upgrade(&mut self.state, &kind) {
            logic::PurchaseOutcome::Purchased { .. } => {
                audio::play_sound(audio::SOUND_UPGRADE);
                let upgrade = self.state.upgrade(&kind);
                self.notify(&format!("{} is now level {}", kind.name(), upgrade.level));
            }
            logic::PurchaseOutcome::InsufficientFunds { cost } => {
                self.notify(&format!(
                    "Not enough milk for {} ({} needed)",
                    kind.name(),
                    format::format_scaled(cost, true)
                ));
            }
        }
    }

    fn handle_referral(&mut self, event: &InputEvent) -> Effect {
        match event {
            InputEvent::Key('c') | InputEvent::Click(COPY_REF_LINK) => Effect::CopyInviteLink,
            InputEvent::Key('q') | InputEvent::Escape | InputEvent::Click(BACK_TO_FARM) => {
                self.screen = Screen::Farm;
                Effect::None
            }
            _ => Effect::None,
        }
    }

    fn handle_withdraw(&mut self, event: &InputEvent) -> Effect {
        if self.withdraw_form.submitting {
            return Effect::None;
        }
        match event {
            InputEvent::Escape | InputEvent::Click(BACK_TO_FARM) => {
                self.screen = Screen::Farm;
            }
            InputEvent::Tab => {
                self.withdraw_form.focus = match self.withdraw_form.focus {
                    WithdrawField::Address => WithdrawField::Amount,
                    WithdrawField::Amount => WithdrawField::Address,
                };
            }
            InputEvent::Click(FOCUS_ADDRESS) => self.withdraw_form.focus = WithdrawField::Address,
            InputEvent::Click(FOCUS_AMOUNT) => self.withdraw_form.focus = WithdrawField::Amount,
            InputEvent::Backspace => {
                match self.withdraw_form.focus {
                    WithdrawField::Address => self.withdraw_form.address.pop(),
                    WithdrawField::Amount => self.withdraw_form.amount.pop(),
                };
            }
            InputEvent::Key(c) => match self.withdraw_form.focus {
                WithdrawField::Address => {
                    if c.is_ascii_graphic() && self.withdraw_form.address.len() < 64 {
                        self.withdraw_form.address.push(*c);
                    }
                }
                WithdrawField::Amount => {
                    if c.is_ascii_digit() && self.withdraw_form.amount.len() < 12 {
                        self.withdraw_form.amount.push(*c);
                    }
                }
            },
            InputEvent::Enter | InputEvent::Click(SUBMIT_WITHDRAW) => {
                return self.submit_withdrawal();
            }
            _ => {}
        }
        Effect::None
    }

    /// Validate the form, optimistically debit, and hand the request to
    /// the network boundary.
    fn submit_withdrawal(&mut self) -> Effect {
        let address = self.withdraw_form.address.trim().to_string();
        let amount = match self.withdraw_form.amount.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                self.notify(logic::WithdrawError::InvalidAmount.message());
                return Effect::None;
            }
        };
        match logic::begin_withdrawal(&mut self.state, &address, amount) {
            Ok(()) => {
                self.withdraw_form.submitting = true;
                self.notify("Sending withdrawal request...");
                Effect::SubmitWithdrawal { address, amount }
            }
            Err(err) => {
                self.notify(err.message());
                Effect::None
            }
        }
    }

    /// Webhook accepted the request: the optimistic debit stands.
    pub fn on_withdrawal_accepted(&mut self, amount: u64) {
        self.withdraw_form.reset();
        self.screen = Screen::Farm;
        self.notify_important(&format!(
            "Withdrawal request for {} $COW received!",
            amount
        ));
        self.persist();
    }

    /// Webhook failed: compensate the optimistic debit.
    pub fn on_withdrawal_failed(&mut self, amount: u64) {
        logic::refund_withdrawal(&mut self.state, amount);
        self.withdraw_form.submitting = false;
        self.notify("Could not send withdrawal request. Please try again.");
        self.persist();
    }

    /// The ad SDK resolved: credit the reward.
    pub fn on_ad_completed(&mut self) {
        let reward = logic::apply_ad_reward(&mut self.state);
        audio::play_sound(audio::SOUND_UPGRADE);
        self.notify_important(&format!("Congrats! You earned {} $COW!", reward));
        self.persist();
    }

    pub fn notify(&mut self, text: &str) {
        self.push_log(text, false);
    }

    pub fn notify_important(&mut self, text: &str) {
        self.push_log(text, true);
    }

    fn push_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > 50 {
            self.log.remove(0);
        }
    }

    fn persist(&self) {
        #[cfg(target_arch = "wasm32")]
        save::save_game(&self.state);
    }
}
