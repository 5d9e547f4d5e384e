/// Cow Empire economy state definitions.

/// Base milk production in units per second, before any multiplier.
pub const BASE_RATE: f64 = 0.5;

/// Milk debited for one $COW on a swap. Fixed for the whole session.
pub const SWAP_COST: f64 = 50_000.0;

/// Production bonus per confirmed referral (+5% each, uncapped).
pub const BONUS_PER_REFERRAL: f64 = 0.05;

/// One-time $COW credit for joining through an invite link.
pub const WELCOME_BONUS: u64 = 50;

/// Offline gaps at or below this many seconds are ignored entirely.
pub const OFFLINE_MIN_SECS: f64 = 10.0;

/// Offline accrual is capped at two hours.
pub const OFFLINE_CAP_SECS: f64 = 7200.0;

/// Upper bound (inclusive) of the random ad reward.
pub const AD_REWARD_MAX: u32 = 50;

/// Minimum $COW accepted by the withdrawal form.
pub const MIN_WITHDRAW: u64 = 100;

/// Kinds of production upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeKind {
    Quality,
    Count,
    Happiness,
}

impl UpgradeKind {
    /// All upgrade kinds in display order.
    pub fn all() -> &'static [UpgradeKind] {
        &[UpgradeKind::Quality, UpgradeKind::Count, UpgradeKind::Happiness]
    }

    /// Position within `all()`.
    pub fn index(&self) -> usize {
        match self {
            UpgradeKind::Quality => 0,
            UpgradeKind::Count => 1,
            UpgradeKind::Happiness => 2,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::Quality => "Milk Quality",
            UpgradeKind::Count => "Cow Count",
            UpgradeKind::Happiness => "Cow Happiness",
        }
    }

    /// One-line description shown on the upgrade card.
    pub fn description(&self) -> &'static str {
        match self {
            UpgradeKind::Quality => "Better feed, richer milk",
            UpgradeKind::Count => "One more cow in the barn",
            UpgradeKind::Happiness => "Happy cows give more milk",
        }
    }

    /// Cost of the first level-up.
    pub fn base_cost(&self) -> f64 {
        match self {
            UpgradeKind::Quality => 100.0,
            UpgradeKind::Count => 250.0,
            UpgradeKind::Happiness => 500.0,
        }
    }

    /// Per-level cost multiplier.
    pub fn cost_growth(&self) -> f64 {
        match self {
            UpgradeKind::Quality => 2.0,
            UpgradeKind::Count => 2.1,
            UpgradeKind::Happiness => 2.2,
        }
    }

    /// Production multiplier gained per level above 1.
    pub fn effect_per_level(&self) -> f64 {
        match self {
            UpgradeKind::Quality => 0.10,
            UpgradeKind::Count => 0.20,
            UpgradeKind::Happiness => 0.30,
        }
    }

    /// Key to buy ('1'-'3' mapped to display order).
    pub fn key(&self) -> char {
        match self {
            UpgradeKind::Quality => '1',
            UpgradeKind::Count => '2',
            UpgradeKind::Happiness => '3',
        }
    }
}

/// How fractional upgrade costs are snapped to whole milk.
/// Older saves were produced under `Floor`; `Ceil` is current behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoundingPolicy {
    Floor,
    #[default]
    Ceil,
}

impl RoundingPolicy {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            RoundingPolicy::Floor => value.floor(),
            RoundingPolicy::Ceil => value.ceil(),
        }
    }
}

/// A single levelable upgrade.
///
/// `multiplier` is derived from `level` and must be recomputed whenever
/// the level changes or state is loaded. It is never persisted.
#[derive(Clone, Debug)]
pub struct UpgradeInstance {
    pub kind: UpgradeKind,
    pub level: u32,
    pub multiplier: f64,
}

impl UpgradeInstance {
    pub fn new(kind: UpgradeKind) -> Self {
        Self {
            kind,
            level: 1,
            multiplier: 1.0,
        }
    }

    /// Restore the invariant `multiplier == 1 + (level-1) * effect`.
    pub fn recompute_multiplier(&mut self) {
        self.multiplier = 1.0 + (self.level - 1) as f64 * self.kind.effect_per_level();
    }

    /// Cost of the next level, from the current level. Never cached.
    pub fn cost(&self, rounding: RoundingPolicy) -> f64 {
        rounding.apply(self.kind.base_cost() * self.kind.cost_growth().powi(self.level as i32 - 1))
    }
}

/// Where this identity stands in the referral flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferralPhase {
    /// No identity assigned yet.
    Unidentified,
    /// Identity exists, no inbound referral claimed.
    Identified,
    /// Inbound referral claimed, welcome bonus not yet delivered.
    ReferralPending,
    /// Inbound referral claimed and welcome bonus delivered.
    ReferralResolved,
}

/// Referral bookkeeping for this identity.
#[derive(Clone, Debug, Default)]
pub struct Referral {
    /// Opaque identity token, assigned once and persisted thereafter.
    pub self_id: Option<String>,
    /// Identity of whoever invited us, if we arrived through a link.
    pub referred_by: Option<String>,
    /// Set exactly once when an inbound referral is accepted.
    pub inbound_claimed: bool,
    /// Session gate: the welcome bonus credited this session. Not persisted.
    pub welcome_granted: bool,
    /// Confirmed invites credited to us; feeds the production bonus.
    pub referral_count: u32,
}

impl Referral {
    pub fn phase(&self) -> ReferralPhase {
        if self.self_id.is_none() {
            ReferralPhase::Unidentified
        } else if !self.inbound_claimed {
            ReferralPhase::Identified
        } else if !self.welcome_granted {
            ReferralPhase::ReferralPending
        } else {
            ReferralPhase::ReferralResolved
        }
    }

    /// Production multiplier from confirmed referrals.
    pub fn bonus_factor(&self) -> f64 {
        1.0 + self.referral_count as f64 * BONUS_PER_REFERRAL
    }
}

/// Full economy ledger. One instance per session, owned by the shell and
/// mutated only through `logic::` operations.
#[derive(Clone, Debug)]
pub struct EconomyState {
    /// Milk on hand. Never negative.
    pub milk: f64,
    /// $COW on hand.
    pub cow_coin: u64,
    /// Epoch-milliseconds watermark for offline reconciliation.
    pub last_update_ms: f64,
    /// Upgrades in `UpgradeKind::all()` order.
    pub upgrades: Vec<UpgradeInstance>,
    /// Referral bookkeeping.
    pub referral: Referral,
    /// Cost rounding policy.
    pub rounding: RoundingPolicy,
    /// Simple RNG state for ad rewards and id generation.
    pub rng_state: u32,
}

impl EconomyState {
    pub fn new(now_ms: f64) -> Self {
        let seed = (now_ms as u64).wrapping_mul(0x9E37_79B9) as u32;
        Self {
            milk: 0.0,
            cow_coin: 0,
            last_update_ms: now_ms,
            upgrades: UpgradeKind::all().iter().map(|k| UpgradeInstance::new(*k)).collect(),
            referral: Referral::default(),
            rounding: RoundingPolicy::default(),
            rng_state: if seed == 0 { 0x2545_F491 } else { seed },
        }
    }

    pub fn upgrade(&self, kind: &UpgradeKind) -> &UpgradeInstance {
        &self.upgrades[kind.index()]
    }

    pub fn upgrade_mut(&mut self, kind: &UpgradeKind) -> &mut UpgradeInstance {
        &mut self.upgrades[kind.index()]
    }

    /// xorshift32 step.
    pub fn next_random(&mut self) -> u32 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_defaults() {
        let state = EconomyState::new(1000.0);
        assert!((state.milk - 0.0).abs() < f64::EPSILON);
        assert_eq!(state.cow_coin, 0);
        assert_eq!(state.upgrades.len(), 3);
        for u in &state.upgrades {
            assert_eq!(u.level, 1);
            assert!((u.multiplier - 1.0).abs() < f64::EPSILON);
        }
        assert_eq!(state.rounding, RoundingPolicy::Ceil);
    }

    #[test]
    fn upgrade_initial_cost() {
        let u = UpgradeInstance::new(UpgradeKind::Quality);
        assert!((u.cost(RoundingPolicy::Ceil) - 100.0).abs() < 0.001);
    }

    #[test]
    fn upgrade_cost_scales_exponentially() {
        let mut u = UpgradeInstance::new(UpgradeKind::Count);
        u.level = 4;
        // 250 * 2.1^3 = 2315.25 → ceil 2316
        assert!((u.cost(RoundingPolicy::Ceil) - 2316.0).abs() < 0.001);
        assert!((u.cost(RoundingPolicy::Floor) - 2315.0).abs() < 0.001);
    }

    #[test]
    fn multiplier_invariant_after_recompute() {
        for kind in UpgradeKind::all() {
            let mut u = UpgradeInstance::new(*kind);
            for level in 1..20 {
                u.level = level;
                u.recompute_multiplier();
                let expected = 1.0 + (level - 1) as f64 * kind.effect_per_level();
                assert!((u.multiplier - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn referral_bonus_factor() {
        let mut r = Referral::default();
        assert!((r.bonus_factor() - 1.0).abs() < f64::EPSILON);
        r.referral_count = 4;
        assert!((r.bonus_factor() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn referral_phase_progression() {
        let mut r = Referral::default();
        assert_eq!(r.phase(), ReferralPhase::Unidentified);
        r.self_id = Some("abc".into());
        assert_eq!(r.phase(), ReferralPhase::Identified);
        r.inbound_claimed = true;
        assert_eq!(r.phase(), ReferralPhase::ReferralPending);
        r.welcome_granted = true;
        assert_eq!(r.phase(), ReferralPhase::ReferralResolved);
    }

    #[test]
    fn next_random_advances_state() {
        let mut state = EconomyState::new(42.0);
        let a = state.next_random();
        let b = state.next_random();
        assert_ne!(a, b);
    }

    #[test]
    fn rng_seed_never_zero() {
        let state = EconomyState::new(0.0);
        assert_ne!(state.rng_state, 0);
    }
}
