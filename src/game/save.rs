//! Save/load for the economy state.
//!
//! The persisted shape has drifted across releases: fields have been added,
//! removed, and renamed, and old saves must keep loading. The rules here:
//!
//! - Only durable facts are persisted. Upgrade entries carry the **level
//!   only**; the derived multiplier is recomputed on load, never trusted.
//! - Loading never fails. A snapshot that is missing a field, or carries a
//!   field of the wrong shape, falls back to the fresh-state default for
//!   that field alone. A fully unreadable payload loads as a fresh state.
//! - Unknown fields are ignored, so newer saves load in older builds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::state::{EconomyState, UpgradeKind};

/// localStorage key. Unchanged since the first release so old saves load.
#[cfg(target_arch = "wasm32")]
const STORAGE_KEY: &str = "myCowEmpireState";

/// Deserialize a field, substituting the default when the value is present
/// but of the wrong shape. Field-level tolerance; the document parse is
/// unaffected.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Persisted projection of `EconomyState`.
#[derive(Serialize, Deserialize, Default, Debug)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "lenient")]
    milk: f64,
    #[serde(rename = "cowCoin", deserialize_with = "lenient")]
    cow_coin: u64,
    #[serde(rename = "lastUpdate", deserialize_with = "lenient")]
    last_update: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    referral: Option<ReferralSnapshot>,
    #[serde(deserialize_with = "lenient")]
    upgrades: UpgradeLevels,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
struct ReferralSnapshot {
    #[serde(rename = "userId", deserialize_with = "lenient")]
    user_id: Option<String>,
    #[serde(rename = "referralCount", deserialize_with = "lenient")]
    referral_count: u32,
    #[serde(rename = "referredBy", deserialize_with = "lenient")]
    referred_by: Option<String>,
    /// Older saves called this `claimedReferral`.
    #[serde(
        rename = "inboundClaimed",
        alias = "claimedReferral",
        deserialize_with = "lenient"
    )]
    inbound_claimed: bool,
}

/// Per-upgrade persisted form: the level, nothing else.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
struct UpgradeLevels {
    #[serde(deserialize_with = "lenient")]
    quality: LevelOnly,
    #[serde(deserialize_with = "lenient")]
    count: LevelOnly,
    #[serde(deserialize_with = "lenient")]
    happiness: LevelOnly,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
struct LevelOnly {
    #[serde(deserialize_with = "lenient")]
    level: u32,
}

impl Default for LevelOnly {
    fn default() -> Self {
        Self { level: 1 }
    }
}

/// Project the durable parts of the state into a snapshot.
pub fn extract_snapshot(state: &EconomyState) -> Snapshot {
    Snapshot {
        milk: state.milk,
        cow_coin: state.cow_coin,
        last_update: Some(state.last_update_ms),
        referral: Some(ReferralSnapshot {
            user_id: state.referral.self_id.clone(),
            referral_count: state.referral.referral_count,
            referred_by: state.referral.referred_by.clone(),
            inbound_claimed: state.referral.inbound_claimed,
        }),
        upgrades: UpgradeLevels {
            quality: LevelOnly {
                level: state.upgrade(&UpgradeKind::Quality).level,
            },
            count: LevelOnly {
                level: state.upgrade(&UpgradeKind::Count).level,
            },
            happiness: LevelOnly {
                level: state.upgrade(&UpgradeKind::Happiness).level,
            },
        },
    }
}

/// Overlay a snapshot onto a freshly initialized state. Fields the snapshot
/// lacks keep their fresh defaults; derived multipliers are recomputed.
pub fn apply_snapshot(state: &mut EconomyState, snap: &Snapshot) {
    if snap.milk.is_finite() && snap.milk >= 0.0 {
        state.milk = snap.milk;
    }
    state.cow_coin = snap.cow_coin;

    if let Some(ts) = snap.last_update {
        if ts.is_finite() && ts > 0.0 {
            state.last_update_ms = ts;
        }
    }

    if let Some(r) = &snap.referral {
        state.referral.self_id = r.user_id.clone().filter(|s| !s.is_empty());
        state.referral.referred_by = r.referred_by.clone().filter(|s| !s.is_empty());
        state.referral.inbound_claimed = r.inbound_claimed;
        state.referral.referral_count = r.referral_count;
        // An inbound claimed in an earlier session already had its welcome
        // bonus; the session gate must not reopen on load.
        state.referral.welcome_granted = r.inbound_claimed;
    }

    let levels = [
        (UpgradeKind::Quality, snap.upgrades.quality.level),
        (UpgradeKind::Count, snap.upgrades.count.level),
        (UpgradeKind::Happiness, snap.upgrades.happiness.level),
    ];
    for (kind, level) in levels {
        let upgrade = state.upgrade_mut(&kind);
        upgrade.level = level.max(1);
        upgrade.recompute_multiplier();
    }
}

/// Serialize the durable state to the external JSON form.
pub fn serialize_state(state: &EconomyState) -> Result<String, serde_json::Error> {
    serde_json::to_string(&extract_snapshot(state))
}

/// Rebuild a state from persisted JSON. Never fails: an unreadable payload
/// yields a fresh default state, a partially readable one recovers every
/// field it can.
pub fn deserialize_state(json: &str, now_ms: f64) -> EconomyState {
    let mut state = EconomyState::new(now_ms);
    match serde_json::from_str::<Snapshot>(json) {
        Ok(snap) => apply_snapshot(&mut state, &snap),
        Err(_e) => {
            #[cfg(target_arch = "wasm32")]
            web_sys::console::warn_1(
                &format!("Cow Empire: discarding unreadable save: {_e}").into(),
            );
        }
    }
    state
}

/// Access localStorage. WASM only.
#[cfg(target_arch = "wasm32")]
fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Persist the state. Failures are logged to the console and ignored.
#[cfg(target_arch = "wasm32")]
pub fn save_game(state: &EconomyState) {
    let json = match serialize_state(state) {
        Ok(j) => j,
        Err(e) => {
            web_sys::console::warn_1(&format!("Cow Empire: save serialization failed: {e}").into());
            return;
        }
    };
    if let Some(storage) = get_storage() {
        if let Err(e) = storage.set_item(STORAGE_KEY, &json) {
            web_sys::console::warn_1(&format!("Cow Empire: localStorage write failed: {e:?}").into());
        }
    }
}

/// Load the saved state, or None when no save exists.
#[cfg(target_arch = "wasm32")]
pub fn load_game(now_ms: f64) -> Option<EconomyState> {
    let storage = get_storage()?;
    let json = storage.get_item(STORAGE_KEY).ok()??;
    Some(deserialize_state(&json, now_ms))
}

/// Remove the save entirely.
#[cfg(target_arch = "wasm32")]
#[allow(dead_code)]
pub fn delete_save() {
    if let Some(storage) = get_storage() {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::logic;

    fn populated_state() -> EconomyState {
        let mut state = EconomyState::new(5_000.0);
        state.milk = 12_345.6;
        state.cow_coin = 42;
        state.last_update_ms = 1_700_000_000_000.0;
        state.upgrade_mut(&UpgradeKind::Quality).level = 5;
        state.upgrade_mut(&UpgradeKind::Count).level = 3;
        state.upgrade_mut(&UpgradeKind::Happiness).level = 2;
        for u in &mut state.upgrades {
            u.recompute_multiplier();
        }
        state.referral.self_id = Some("a1b2c3d4".into());
        state.referral.referred_by = Some("ffee0011".into());
        state.referral.inbound_claimed = true;
        state.referral.welcome_granted = true;
        state.referral.referral_count = 3;
        state
    }

    #[test]
    fn round_trip_preserves_durable_fields() {
        let original = populated_state();
        let json = serialize_state(&original).unwrap();
        let restored = deserialize_state(&json, 0.0);

        assert!((restored.milk - original.milk).abs() < 1e-9);
        assert_eq!(restored.cow_coin, original.cow_coin);
        assert!((restored.last_update_ms - original.last_update_ms).abs() < 1e-3);
        for kind in UpgradeKind::all() {
            assert_eq!(restored.upgrade(kind).level, original.upgrade(kind).level);
        }
        assert_eq!(restored.referral.self_id, original.referral.self_id);
        assert_eq!(restored.referral.referred_by, original.referral.referred_by);
        assert_eq!(restored.referral.inbound_claimed, true);
        assert_eq!(restored.referral.referral_count, 3);
    }

    #[test]
    fn round_trip_recomputes_multipliers() {
        let mut original = populated_state();
        // Poison the cached multipliers; the restored state must not see them.
        for u in &mut original.upgrades {
            u.multiplier = 99.0;
        }
        let json = serialize_state(&original).unwrap();
        let restored = deserialize_state(&json, 0.0);
        for u in &restored.upgrades {
            let expected = 1.0 + (u.level - 1) as f64 * u.kind.effect_per_level();
            assert!((u.multiplier - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn snapshot_omits_multiplier() {
        let state = populated_state();
        let json = serialize_state(&state).unwrap();
        assert!(!json.contains("multiplier"));
    }

    #[test]
    fn persisted_multiplier_is_ignored() {
        // A hostile or ancient save carrying multipliers must not bypass the
        // recompute.
        let json = r#"{
            "milk": 10.0,
            "upgrades": {"quality": {"level": 3, "multiplier": 500.0}}
        }"#;
        let state = deserialize_state(json, 0.0);
        assert_eq!(state.upgrade(&UpgradeKind::Quality).level, 3);
        assert!((state.upgrade(&UpgradeKind::Quality).multiplier - 1.2).abs() < 1e-12);
    }

    #[test]
    fn garbage_json_loads_fresh_state() {
        let state = deserialize_state("not json at all {", 777_000.0);
        assert!((state.milk - 0.0).abs() < f64::EPSILON);
        assert_eq!(state.cow_coin, 0);
        assert!((state.last_update_ms - 777_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_object_loads_fresh_state() {
        let state = deserialize_state("{}", 321_000.0);
        assert_eq!(state.cow_coin, 0);
        assert!((state.last_update_ms - 321_000.0).abs() < f64::EPSILON);
        for u in &state.upgrades {
            assert_eq!(u.level, 1);
        }
    }

    #[test]
    fn missing_referral_block_recovers_other_fields() {
        let json = r#"{"milk": 500.5, "cowCoin": 7, "upgrades": {"count": {"level": 4}}}"#;
        let state = deserialize_state(json, 0.0);
        assert!((state.milk - 500.5).abs() < 1e-9);
        assert_eq!(state.cow_coin, 7);
        assert_eq!(state.upgrade(&UpgradeKind::Count).level, 4);
        assert!(state.referral.self_id.is_none());
        assert_eq!(state.referral.referral_count, 0);
    }

    #[test]
    fn wrong_shape_fields_default_individually() {
        // milk is a string, cowCoin is negative, quality level is a string:
        // each falls back alone, the rest of the document still loads.
        let json = r#"{
            "milk": "lots",
            "cowCoin": -3,
            "lastUpdate": 1234.0,
            "referral": {"userId": "deadbeef", "referralCount": "many"},
            "upgrades": {"quality": {"level": "high"}, "happiness": {"level": 6}}
        }"#;
        let state = deserialize_state(json, 0.0);
        assert!((state.milk - 0.0).abs() < f64::EPSILON);
        assert_eq!(state.cow_coin, 0);
        assert!((state.last_update_ms - 1234.0).abs() < f64::EPSILON);
        assert_eq!(state.referral.self_id.as_deref(), Some("deadbeef"));
        assert_eq!(state.referral.referral_count, 0);
        assert_eq!(state.upgrade(&UpgradeKind::Quality).level, 1);
        assert_eq!(state.upgrade(&UpgradeKind::Happiness).level, 6);
    }

    #[test]
    fn legacy_claimed_referral_alias_accepted() {
        let json = r#"{"referral": {"userId": "cafe", "claimedReferral": true}}"#;
        let state = deserialize_state(json, 0.0);
        assert!(state.referral.inbound_claimed);
        // The welcome bonus from that old session must not re-fire.
        assert!(state.referral.welcome_granted);
        let mut state = state;
        assert!(!logic::apply_referral_welcome_bonus(&mut state));
    }

    #[test]
    fn legacy_bonus_per_referral_field_ignored() {
        // Old saves persisted the bonus rate; the constant governs now.
        let json = r#"{"referral": {"userId": "cafe", "referralCount": 2, "bonusPerReferral": 0.5}}"#;
        let state = deserialize_state(json, 0.0);
        assert_eq!(state.referral.referral_count, 2);
        assert!((state.referral.bonus_factor() - 1.10).abs() < 1e-12);
    }

    #[test]
    fn unknown_fields_ignored() {
        let json = r#"{"milk": 9.0, "futureField": {"nested": [1,2,3]}}"#;
        let state = deserialize_state(json, 0.0);
        assert!((state.milk - 9.0).abs() < 1e-12);
    }

    #[test]
    fn zero_level_clamped_to_one() {
        let json = r#"{"upgrades": {"quality": {"level": 0}}}"#;
        let state = deserialize_state(json, 0.0);
        assert_eq!(state.upgrade(&UpgradeKind::Quality).level, 1);
        assert!((state.upgrade(&UpgradeKind::Quality).multiplier - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negative_milk_rejected() {
        let json = r#"{"milk": -500.0}"#;
        let state = deserialize_state(json, 0.0);
        assert!((state.milk - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_identity_strings_treated_as_absent() {
        let json = r#"{"referral": {"userId": "", "referredBy": ""}}"#;
        let state = deserialize_state(json, 0.0);
        assert!(state.referral.self_id.is_none());
        assert!(state.referral.referred_by.is_none());
    }
}
