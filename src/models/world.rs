use serde::Serialize;
use thiserror::Error;

use crate::models::{
    body::{Body, BodyKind, PlayerState},
    clock::{MatchClock, MatchPhase},
    common::{defaults, BodyId, TeamId, Vector2},
    field::Field,
    formation::Formation,
};

/// シミュレーションコアのエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// World構築時の設定不正（即時失敗）
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// 現在のフェーズでは実行できない操作
    #[error("cannot {operation} during {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: MatchPhase,
    },
}

/// ボールの物理パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpec {
    pub radius: f64,
    pub mass: f64,
}

impl Default for BallSpec {
    fn default() -> Self {
        Self {
            radius: defaults::BALL_RADIUS,
            mass: defaults::BALL_MASS,
        }
    }
}

/// チーム構成
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSpec {
    pub name: String,
    pub formation: Formation,
    pub player_radius: f64,
    pub player_mass: f64,
    /// 外部操作する選手の背番号
    pub controlled_shirt: Option<u8>,
}

impl TeamSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formation: Formation::default(),
            player_radius: defaults::PLAYER_RADIUS,
            player_mass: defaults::PLAYER_MASS,
            controlled_shirt: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamInfo {
    pub name: String,
    pub formation: String,
}

/// シミュレーション世界
///
/// 全ボディ（ボール1 + 選手22）、フィールド、試合時計を所有する唯一の可変集約です。
/// 状態の変更は `simulation` モジュールのステップAPIからのみ行われ、
/// ステップ間であれば自由にスナップショットを読み出せます。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct World {
    bodies: Vec<Body>,
    field: Field,
    teams: [TeamInfo; 2],
    pub(crate) clock: MatchClock,
    pub(crate) score: [u32; 2],
    opening_kickoff: TeamId,
    pub(crate) kickoff_team: TeamId,
    /// アウトオブバウンズ後の再開位置
    pub(crate) restart_point: Option<Vector2>,
    /// 直近の失点チーム（resume時のキックオフ権）
    pub(crate) last_conceding: Option<TeamId>,
    pub(crate) tick: u64,
}

impl World {
    pub const BALL_ID: BodyId = BodyId(0);

    /// Worldを構築し、全ボディをキックオフ隊形に配置
    ///
    /// # 引数
    ///
    /// * `field` - 検証済みのフィールド
    /// * `ball` - ボールの半径・質量
    /// * `teams` - [Home, Away] のチーム構成
    /// * `duration` - 試合時間（秒）
    /// * `opening_kickoff` - 前半キックオフのチーム
    pub fn new(
        field: Field,
        ball: BallSpec,
        teams: [TeamSpec; 2],
        duration: f64,
        opening_kickoff: TeamId,
    ) -> Result<Self, SimulationError> {
        check_positive("ball radius", ball.radius)?;
        check_positive("ball mass", ball.mass)?;
        check_positive("match duration", duration)?;

        let mut bodies = Vec::with_capacity(1 + 2 * defaults::PLAYERS_PER_TEAM);
        bodies.push(Body::ball(Self::BALL_ID, field.center(), ball.radius, ball.mass));

        for (team_id, spec) in [TeamId::Home, TeamId::Away].into_iter().zip(teams.iter()) {
            check_positive(&format!("{} player radius", spec.name), spec.player_radius)?;
            check_positive(&format!("{} player mass", spec.name), spec.player_mass)?;

            let anchors = spec.formation.anchors();
            if anchors.len() != defaults::PLAYERS_PER_TEAM {
                return Err(SimulationError::InvalidConfiguration(format!(
                    "{} must field {} players, formation gives {}",
                    spec.name,
                    defaults::PLAYERS_PER_TEAM,
                    anchors.len()
                )));
            }
            if let Some(shirt) = spec.controlled_shirt {
                if !(1..=defaults::PLAYERS_PER_TEAM).contains(&(shirt as usize)) {
                    return Err(SimulationError::InvalidConfiguration(format!(
                        "{} controlled shirt #{} is not in 1..={}",
                        spec.name,
                        shirt,
                        defaults::PLAYERS_PER_TEAM
                    )));
                }
            }

            for (index, (role, anchor)) in anchors.into_iter().enumerate() {
                let shirt_number = (index + 1) as u8;
                let state = PlayerState {
                    team_id,
                    role,
                    stamina: defaults::MAX_STAMINA,
                    controlled: spec.controlled_shirt == Some(shirt_number),
                    shirt_number,
                    anchor,
                };
                let id = BodyId(bodies.len());
                let position = field.anchor_to_field(team_id, anchor);
                bodies.push(Body::player(id, position, spec.player_radius, spec.player_mass, state));
            }
        }

        let team_info = |spec: &TeamSpec| TeamInfo {
            name: spec.name.clone(),
            formation: spec
                .formation
                .lines()
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join("-"),
        };

        let mut world = Self {
            bodies,
            teams: [team_info(&teams[0]), team_info(&teams[1])],
            field,
            clock: MatchClock::new(duration),
            score: [0, 0],
            opening_kickoff,
            kickoff_team: opening_kickoff,
            restart_point: None,
            last_conceding: None,
            tick: 0,
        };
        world.place_kickoff_formation(opening_kickoff);
        Ok(world)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0)
    }

    pub fn ball(&self) -> &Body {
        &self.bodies[Self::BALL_ID.0]
    }

    pub(crate) fn ball_mut(&mut self) -> &mut Body {
        &mut self.bodies[Self::BALL_ID.0]
    }

    pub fn players(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(|b| !b.is_ball())
    }

    pub fn team_players(&self, team: TeamId) -> impl Iterator<Item = &Body> {
        self.players().filter(move |b| b.team() == Some(team))
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn team(&self, team: TeamId) -> &TeamInfo {
        &self.teams[team.index()]
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn phase(&self) -> MatchPhase {
        self.clock.phase()
    }

    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed
    }

    /// スコア [home, away]
    pub fn score(&self) -> [u32; 2] {
        self.score
    }

    pub fn kickoff_team(&self) -> TeamId {
        self.kickoff_team
    }

    pub fn opening_kickoff(&self) -> TeamId {
        self.opening_kickoff
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// 選手のフォーメーション上の基準位置（フィールド座標）
    pub fn anchor_position(&self, player: &Body) -> Option<Vector2> {
        player
            .player_state()
            .map(|state| self.field.anchor_to_field(state.team_id, state.anchor))
    }

    /// 全ボディをキックオフ隊形に配置し、速度をゼロにする
    ///
    /// キックオフ側の最前線の選手（同列なら最小ID）をセンタースポットのすぐ後ろに置きます。
    pub(crate) fn place_kickoff_formation(&mut self, kicking_team: TeamId) {
        let center = self.field.center();
        let ball_radius = self.ball().radius;

        let kicker = self
            .team_players(kicking_team)
            .filter_map(|b| b.player_state().map(|s| (b.id, s.anchor.x)))
            .fold(None::<(BodyId, f64)>, |best, (id, depth)| match best {
                Some((_, best_depth)) if best_depth >= depth => best,
                _ => Some((id, depth)),
            })
            .map(|(id, _)| id);

        let attack = self.field.attack_direction(kicking_team);
        for i in 0..self.bodies.len() {
            let position = match &self.bodies[i].kind {
                BodyKind::Ball => center,
                BodyKind::Player(_) if Some(self.bodies[i].id) == kicker => {
                    let gap = ball_radius + self.bodies[i].radius + 1.0;
                    center - attack * gap
                }
                BodyKind::Player(state) => self.field.anchor_to_field(state.team_id, state.anchor),
            };
            let body = &mut self.bodies[i];
            body.position = position;
            body.velocity = Vector2::ZERO;
        }

        self.kickoff_team = kicking_team;
        self.restart_point = None;
    }

    /// 試合を最初からやり直す（スコア・時計・スタミナをリセット）
    pub(crate) fn reset_match_state(&mut self) {
        self.clock.reset();
        self.score = [0, 0];
        self.last_conceding = None;
        self.tick = 0;
        for body in &mut self.bodies {
            if let Some(state) = body.player_state_mut() {
                state.stamina = defaults::MAX_STAMINA;
            }
        }
        self.place_kickoff_formation(self.opening_kickoff);
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), SimulationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::InvalidConfiguration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}
