use serde::{Deserialize, Serialize};

use crate::models::{
    common::{defaults, BodyId, Role, TeamId, Vector2},
    config::SimulationConfig,
    traits::{IBody, IMovable},
};

/// 選手固有の状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// 所属チーム
    pub team_id: TeamId,
    /// ポジション
    pub role: Role,
    /// スタミナ [0, 100]（試合中は単調非増加）
    pub stamina: f64,
    /// 外部操作中かどうか
    pub controlled: bool,
    /// 背番号
    pub shirt_number: u8,
    /// フォーメーション上の正規化座標（depth: 自陣ゴールからの深さ, lateral: 横位置）
    pub anchor: Vector2,
}

impl PlayerState {
    /// スタミナを考慮した実効最大速度
    ///
    /// スタミナ100で `player_max_speed`、0で `player_max_speed * fatigue_floor`。
    pub fn effective_max_speed(&self, config: &SimulationConfig) -> f64 {
        let ratio = (self.stamina / defaults::MAX_STAMINA).clamp(0.0, 1.0);
        config.player_max_speed * (config.fatigue_floor + (1.0 - config.fatigue_floor) * ratio)
    }

    fn drain_stamina(&mut self, speed: f64, config: &SimulationConfig, dt: f64) {
        if config.player_max_speed <= 0.0 {
            return;
        }
        let drain = config.stamina_drain_per_s * (speed / config.player_max_speed) * dt;
        self.stamina = (self.stamina - drain.max(0.0)).max(0.0);
    }
}

/// ボディの種類
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    Ball,
    Player(PlayerState),
}

/// 円形の剛体ボディ
///
/// Worldが排他的に所有し、1ティックにつき1回だけ物理ステップで更新されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f64,
    pub mass: f64,
    pub kind: BodyKind,
}

impl Body {
    pub fn ball(id: BodyId, position: Vector2, radius: f64, mass: f64) -> Self {
        Self {
            id,
            position,
            velocity: Vector2::ZERO,
            radius,
            mass,
            kind: BodyKind::Ball,
        }
    }

    pub fn player(id: BodyId, position: Vector2, radius: f64, mass: f64, state: PlayerState) -> Self {
        Self {
            id,
            position,
            velocity: Vector2::ZERO,
            radius,
            mass,
            kind: BodyKind::Player(state),
        }
    }

    pub fn is_ball(&self) -> bool {
        matches!(self.kind, BodyKind::Ball)
    }

    pub fn player_state(&self) -> Option<&PlayerState> {
        match &self.kind {
            BodyKind::Player(state) => Some(state),
            BodyKind::Ball => None,
        }
    }

    pub fn player_state_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            BodyKind::Player(state) => Some(state),
            BodyKind::Ball => None,
        }
    }

    pub fn team(&self) -> Option<TeamId> {
        self.player_state().map(|p| p.team_id)
    }

    /// 運動エネルギー
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.dot(self.velocity)
    }
}

impl IBody for Body {
    fn get_id(&self) -> BodyId {
        self.id
    }

    fn get_radius(&self) -> f64 {
        self.radius
    }

    fn get_mass(&self) -> f64 {
        self.mass
    }
}

impl IMovable for Body {
    fn move_body(&mut self, steering: Option<Vector2>, config: &SimulationConfig, dt: f64) {
        let friction = match self.kind {
            BodyKind::Ball => config.ball_friction,
            BodyKind::Player(_) => config.player_friction,
        };

        // 目標方向への加速（摩擦より先に適用し、実効最大速度でクリップ）
        if let (BodyKind::Player(state), Some(direction)) = (&self.kind, steering) {
            let max_speed = state.effective_max_speed(config);
            let nudge = direction.normalize() * (config.player_acceleration * dt);
            self.velocity = (self.velocity + nudge).clamp_magnitude(max_speed);
        }

        self.velocity = self.velocity * friction;
        self.position = self.position + self.velocity * dt;

        if let BodyKind::Player(state) = &mut self.kind {
            state.drain_stamina(self.velocity.magnitude(), config, dt);
        }
    }

    fn get_position(&self) -> Vector2 {
        self.position
    }

    fn get_velocity(&self) -> Vector2 {
        self.velocity
    }
}
