use serde::{Deserialize, Serialize};

use crate::models::{
    clock::{MatchPhase, PhaseTransition},
    common::{BodyId, FieldEdge, LineKind, TeamId, Vector2},
};

/// 1ティック中に発生したイベント
///
/// 実況・描画などの外部コンシューマはこのストリームを購読します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchEvent {
    /// 得点
    Goal {
        team_id: TeamId,
        /// 得点後のスコア [home, away]
        score: [u32; 2],
        position: Vector2,
        elapsed: f64,
    },
    /// ボールがフィールド外に出た
    OutOfBounds {
        side: FieldEdge,
        line: LineKind,
        position: Vector2,
        elapsed: f64,
    },
    /// 試合フェーズの変化
    PhaseChange {
        from: MatchPhase,
        to: MatchPhase,
        elapsed: f64,
    },
    /// 衝突（設定で有効な場合のみ）
    Collision {
        a: BodyId,
        b: BodyId,
        depth: f64,
        elapsed: f64,
    },
}

impl MatchEvent {
    pub fn elapsed(&self) -> f64 {
        match self {
            MatchEvent::Goal { elapsed, .. }
            | MatchEvent::OutOfBounds { elapsed, .. }
            | MatchEvent::PhaseChange { elapsed, .. }
            | MatchEvent::Collision { elapsed, .. } => *elapsed,
        }
    }
}

impl From<PhaseTransition> for MatchEvent {
    fn from(t: PhaseTransition) -> Self {
        MatchEvent::PhaseChange {
            from: t.from,
            to: t.to,
            elapsed: t.elapsed,
        }
    }
}
