//! # Strategy モジュール
//!
//! 選手の移動目標を供給する戦術AIの実装です。コアの物理ステップからは
//! [`IStrategy`] トレイト越しにのみ参照され、乱数はここに注入されたシード付き
//! 生成器だけが使います。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::models::{
    body::Body,
    common::{BodyId, Role, TeamId, Vector2},
    field::PlayAxis,
    traits::IStrategy,
    world::World,
};

/// 何もしない戦術（全選手が慣性のみで動く）
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleStrategy;

impl IStrategy for IdleStrategy {
    fn target_for(&mut self, _player: &Body, _world: &World) -> Option<Vector2> {
        None
    }
}

/// フォーメーション維持 + 最寄り選手によるボール追跡
///
/// - 各チームでボールに最も近いフィールドプレーヤーがボールを追い、相手ゴール方向へ押し出す
/// - ゴールキーパーはゴールライン上でボールの横位置を追う
/// - その他の選手は基準位置をボール方向へずらした地点に、シード付きの揺らぎを加えて移動する
#[derive(Debug, Clone)]
pub struct FormationStrategy {
    rng: ChaCha8Rng,
    /// 目標地点の揺らぎ幅
    pub jitter: f64,
    /// ボール位置へ基準位置を引き寄せる割合
    pub ball_influence: f64,
}

impl FormationStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            jitter: 6.0,
            ball_influence: 0.35,
        }
    }

    /// チーム内でボールに最も近いフィールドプレーヤー
    fn chaser(world: &World, team: TeamId) -> Option<BodyId> {
        let ball = world.ball().position;
        world
            .team_players(team)
            .filter(|b| b.player_state().map(|s| s.role) != Some(Role::Goalkeeper))
            .fold(None::<(BodyId, f64)>, |best, b| {
                let distance = b.position.distance(ball);
                match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((b.id, distance)),
                }
            })
            .map(|(id, _)| id)
    }

    fn chase_target(player: &Body, team: TeamId, world: &World) -> Vector2 {
        let ball = world.ball();
        let goal = world.field().goal_center(team.opponent());
        let to_goal = (goal - ball.position).normalize();
        let behind_ball = ball.position - to_goal * (ball.radius + player.radius);

        // ボールの後ろに回り込めていれば、ボールを通して相手ゴール方向へ走る
        let approach = (ball.position - player.position).normalize();
        if approach.dot(to_goal) > 0.7 {
            ball.position + to_goal * player.radius
        } else {
            behind_ball
        }
    }

    fn keeper_target(anchor: Vector2, world: &World) -> Vector2 {
        let field = world.field();
        let [min, max] = field.goal_mouth;
        let ball = world.ball().position;
        match field.play_axis() {
            PlayAxis::X => Vector2::new(anchor.x, ball.y.clamp(min, max)),
            PlayAxis::Y => Vector2::new(ball.x.clamp(min, max), anchor.y),
        }
    }
}

impl IStrategy for FormationStrategy {
    fn target_for(&mut self, player: &Body, world: &World) -> Option<Vector2> {
        let state = player.player_state()?;
        let anchor = world.anchor_position(player)?;

        // 乱数の消費回数を分岐に依存させない
        let jitter = Vector2::new(
            self.rng.gen_range(-self.jitter..=self.jitter),
            self.rng.gen_range(-self.jitter..=self.jitter),
        );

        if state.role == Role::Goalkeeper {
            return Some(Self::keeper_target(anchor, world));
        }
        if Self::chaser(world, state.team_id) == Some(player.id) {
            return Some(Self::chase_target(player, state.team_id, world));
        }

        let shift = (world.ball().position - world.field().center()) * self.ball_influence;
        Some(anchor + shift + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::world::tests::standard_world;

    #[test]
    fn test_idle_strategy_has_no_targets() {
        let world = standard_world();
        let mut strategy = IdleStrategy;
        assert!(world.players().all(|p| strategy.target_for(p, &world).is_none()));
    }

    #[test]
    fn test_ball_gets_no_target() {
        let world = standard_world();
        let mut strategy = FormationStrategy::new(1);
        assert!(strategy.target_for(world.ball(), &world).is_none());
    }

    #[test]
    fn test_same_seed_gives_same_targets() {
        let world = standard_world();
        let collect = |seed: u64| {
            let mut strategy = FormationStrategy::new(seed);
            world
                .players()
                .map(|p| strategy.target_for(p, &world))
                .collect::<Vec<_>>()
        };
        assert_eq!(collect(11), collect(11));
        assert_ne!(collect(11), collect(12));
    }

    #[test]
    fn test_keeper_stays_on_goal_mouth() {
        let world = standard_world();
        let mut strategy = FormationStrategy::new(3);
        let keeper = world
            .team_players(TeamId::Home)
            .find(|p| p.player_state().map(|s| s.role) == Some(Role::Goalkeeper))
            .expect("keeper");
        let target = strategy.target_for(keeper, &world).expect("target");
        let [min, max] = world.field().goal_mouth;
        assert!(target.y >= min && target.y <= max);
        assert!(target.x < 50.0);
    }

    #[test]
    fn test_one_chaser_per_team_heads_for_ball() {
        let world = standard_world();
        let mut strategy = FormationStrategy::new(5);
        let ball = world.ball().position;
        for team in [TeamId::Home, TeamId::Away] {
            let chaser = FormationStrategy::chaser(&world, team).expect("chaser");
            let player = world.body(chaser).expect("body");
            let target = strategy.target_for(player, &world).expect("target");
            assert!(target.distance(ball) <= world.ball().radius + player.radius + 1e-9);
        }
    }
}
