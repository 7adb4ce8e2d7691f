use serde::{Deserialize, Serialize};

use crate::models::{common::defaults, world::SimulationError};
use crate::physics::BroadPhase;

/// 物理パラメータ
///
/// `step` に明示的に渡され、グローバルな可変状態は持ちません。
/// 省略した項目は `defaults` の定数になります。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// ボールの摩擦係数（1ティックごとに速度へ乗算）
    pub ball_friction: f64,
    /// 選手の摩擦係数
    pub player_friction: f64,
    /// 反発係数
    pub restitution: f64,
    /// 選手の加速度
    pub player_acceleration: f64,
    /// 選手の最大速度
    pub player_max_speed: f64,
    /// 最大速度で走り続けた場合の1秒あたりのスタミナ消費
    pub stamina_drain_per_s: f64,
    /// スタミナ0のときの最大速度の倍率
    pub fatigue_floor: f64,
    pub broad_phase: BroadPhase,
    /// 衝突イベントを出力するか
    pub emit_collision_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ball_friction: defaults::BALL_FRICTION,
            player_friction: defaults::PLAYER_FRICTION,
            restitution: defaults::COEFFICIENT_OF_RESTITUTION,
            player_acceleration: defaults::PLAYER_ACCELERATION,
            player_max_speed: defaults::PLAYER_MAX_SPEED,
            stamina_drain_per_s: 0.1,
            fatigue_floor: 0.6,
            broad_phase: BroadPhase::Naive,
            emit_collision_events: false,
        }
    }
}

impl SimulationConfig {
    /// 物理パラメータの検証
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| -> Result<(), SimulationError> { Err(SimulationError::InvalidConfiguration(msg)) };

        for (name, value) in [("ball_friction", self.ball_friction), ("player_friction", self.player_friction)] {
            if !(value > 0.0 && value <= 1.0) {
                return invalid(format!("{} must be in (0, 1], got {}", name, value));
            }
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return invalid(format!("restitution must be in [0, 1], got {}", self.restitution));
        }
        if !(self.player_acceleration > 0.0 && self.player_acceleration.is_finite()) {
            return invalid(format!("player_acceleration must be positive, got {}", self.player_acceleration));
        }
        if !(self.player_max_speed > 0.0 && self.player_max_speed.is_finite()) {
            return invalid(format!("player_max_speed must be positive, got {}", self.player_max_speed));
        }
        if !(self.stamina_drain_per_s >= 0.0 && self.stamina_drain_per_s.is_finite()) {
            return invalid(format!("stamina_drain_per_s must be non-negative, got {}", self.stamina_drain_per_s));
        }
        if !(0.0..=1.0).contains(&self.fatigue_floor) {
            return invalid(format!("fatigue_floor must be in [0, 1], got {}", self.fatigue_floor));
        }
        Ok(())
    }
}
