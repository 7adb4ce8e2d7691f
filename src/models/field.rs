use serde::{Deserialize, Serialize};

use crate::models::{
    common::{FieldEdge, LineKind, TeamId, Vector2},
    world::SimulationError,
};

/// プレー方向の軸
///
/// ゴールは常に短辺に置かれます。`width >= height` ならプレー方向はX軸
/// （ゴールはWest/East、ゴールマウスはY方向で測る）、それ以外はY軸です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayAxis {
    X,
    Y,
}

/// ボールのフィールド外への移動の分類結果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryCrossing {
    /// ゴールマウスを通過した
    Goal {
        scoring_team: TeamId,
        edge: FieldEdge,
        point: Vector2,
    },
    /// ゴールマウス以外からフィールド外に出た
    OutOfBounds {
        edge: FieldEdge,
        line: LineKind,
        point: Vector2,
    },
}

impl BoundaryCrossing {
    pub fn point(&self) -> Vector2 {
        match self {
            BoundaryCrossing::Goal { point, .. } => *point,
            BoundaryCrossing::OutOfBounds { point, .. } => *point,
        }
    }
}

/// 矩形フィールド
///
/// 内部は開区間 `(0, width) x (0, height)` で、辺上のボールはフィールド外とみなします。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
    /// ゴールマウスの範囲 [min, max]（短辺方向の座標）
    pub goal_mouth: [f64; 2],
}

impl Field {
    /// フィールドを作成（構築時に検証）
    pub fn new(width: f64, height: f64, goal_mouth: [f64; 2]) -> Result<Self, SimulationError> {
        if !(width > 0.0 && width.is_finite()) || !(height > 0.0 && height.is_finite()) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "field size must be positive: {}x{}",
                width, height
            )));
        }
        let field = Self {
            width,
            height,
            goal_mouth,
        };
        let [min, max] = goal_mouth;
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(SimulationError::InvalidConfiguration(format!(
                "goal mouth must be a non-empty range: [{}, {}]",
                min, max
            )));
        }
        let edge_length = field.goal_line_length();
        if min <= 0.0 || max >= edge_length {
            return Err(SimulationError::InvalidConfiguration(format!(
                "goal mouth [{}, {}] does not fit on a goal line of length {}",
                min, max, edge_length
            )));
        }
        Ok(field)
    }

    pub fn play_axis(&self) -> PlayAxis {
        if self.width >= self.height {
            PlayAxis::X
        } else {
            PlayAxis::Y
        }
    }

    /// ゴールラインの長さ（短辺）
    pub fn goal_line_length(&self) -> f64 {
        match self.play_axis() {
            PlayAxis::X => self.height,
            PlayAxis::Y => self.width,
        }
    }

    /// プレー方向の長さ（長辺）
    pub fn pitch_length(&self) -> f64 {
        match self.play_axis() {
            PlayAxis::X => self.width,
            PlayAxis::Y => self.height,
        }
    }

    /// チームが守るゴールの辺
    pub fn goal_edge(&self, team: TeamId) -> FieldEdge {
        match (self.play_axis(), team) {
            (PlayAxis::X, TeamId::Home) => FieldEdge::West,
            (PlayAxis::X, TeamId::Away) => FieldEdge::East,
            (PlayAxis::Y, TeamId::Home) => FieldEdge::South,
            (PlayAxis::Y, TeamId::Away) => FieldEdge::North,
        }
    }

    /// 辺を守るチーム（長辺ならNone）
    pub fn defending_team(&self, edge: FieldEdge) -> Option<TeamId> {
        [TeamId::Home, TeamId::Away]
            .into_iter()
            .find(|team| self.goal_edge(*team) == edge)
    }

    pub fn center(&self) -> Vector2 {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }

    /// 点がフィールド内部（開区間）にあるか
    pub fn contains(&self, p: Vector2) -> bool {
        p.x > 0.0 && p.x < self.width && p.y > 0.0 && p.y < self.height
    }

    /// 点をフィールド内部へ `margin` だけ引き戻す
    pub fn clamp_inside(&self, p: Vector2, margin: f64) -> Vector2 {
        let mx = margin.min(self.width / 2.0);
        let my = margin.min(self.height / 2.0);
        Vector2::new(p.x.clamp(mx, self.width - mx), p.y.clamp(my, self.height - my))
    }

    /// ゴールマウスの中心点
    pub fn goal_center(&self, team: TeamId) -> Vector2 {
        let mid = (self.goal_mouth[0] + self.goal_mouth[1]) / 2.0;
        match self.goal_edge(team) {
            FieldEdge::West => Vector2::new(0.0, mid),
            FieldEdge::East => Vector2::new(self.width, mid),
            FieldEdge::South => Vector2::new(mid, 0.0),
            FieldEdge::North => Vector2::new(mid, self.height),
        }
    }

    /// 正規化フォーメーション座標をフィールド座標へ変換
    ///
    /// `anchor.x` は自陣ゴールラインからの深さ（0..1）、`anchor.y` は横位置（0..1）。
    pub fn anchor_to_field(&self, team: TeamId, anchor: Vector2) -> Vector2 {
        let depth = match team {
            TeamId::Home => anchor.x,
            TeamId::Away => 1.0 - anchor.x,
        };
        let along = depth * self.pitch_length();
        let across = anchor.y * self.goal_line_length();
        match self.play_axis() {
            PlayAxis::X => Vector2::new(along, across),
            PlayAxis::Y => Vector2::new(across, along),
        }
    }

    /// 相手ゴールへ向かう単位ベクトル
    pub fn attack_direction(&self, team: TeamId) -> Vector2 {
        let sign = match team {
            TeamId::Home => 1.0,
            TeamId::Away => -1.0,
        };
        match self.play_axis() {
            PlayAxis::X => Vector2::new(sign, 0.0),
            PlayAxis::Y => Vector2::new(0.0, sign),
        }
    }

    /// 点の位置だけでフィールド外判定を分類
    ///
    /// 複数の辺の外側にある場合（コーナー）は、はみ出し量の大きい辺を採用し、
    /// 同量ならゴールのある辺を優先します。
    pub fn classify_point(&self, p: Vector2) -> Option<BoundaryCrossing> {
        if self.contains(p) {
            return None;
        }
        let overshoots = [
            (FieldEdge::West, -p.x),
            (FieldEdge::East, p.x - self.width),
            (FieldEdge::South, -p.y),
            (FieldEdge::North, p.y - self.height),
        ];
        let mut best: Option<(FieldEdge, f64)> = None;
        for (edge, amount) in overshoots {
            if amount < 0.0 {
                continue;
            }
            best = match best {
                None => Some((edge, amount)),
                Some((_, best_amount)) if amount > best_amount => Some((edge, amount)),
                Some((best_edge, best_amount))
                    if amount == best_amount
                        && self.defending_team(edge).is_some()
                        && self.defending_team(best_edge).is_none() =>
                {
                    Some((edge, amount))
                }
                keep => keep,
            };
        }
        best.map(|(edge, _)| self.classify_on_edge(edge, self.project_to_edge(edge, p)))
    }

    /// 始点から終点への移動でフィールド外に出た場合、通過点を求めて分類
    ///
    /// `from` が既にフィールド外の場合は終点だけで分類します。
    pub fn classify_exit(&self, from: Vector2, to: Vector2) -> Option<BoundaryCrossing> {
        if self.contains(to) {
            return None;
        }
        if !self.contains(from) {
            return self.classify_point(to);
        }

        let delta = to - from;
        let mut candidates: Vec<(f64, FieldEdge)> = Vec::with_capacity(2);
        if to.x <= 0.0 {
            candidates.push((-from.x / delta.x, FieldEdge::West));
        }
        if to.x >= self.width {
            candidates.push(((self.width - from.x) / delta.x, FieldEdge::East));
        }
        if to.y <= 0.0 {
            candidates.push((-from.y / delta.y, FieldEdge::South));
        }
        if to.y >= self.height {
            candidates.push(((self.height - from.y) / delta.y, FieldEdge::North));
        }

        let mut best: Option<(f64, FieldEdge)> = None;
        for (t, edge) in candidates {
            best = match best {
                None => Some((t, edge)),
                Some((best_t, _)) if t < best_t => Some((t, edge)),
                Some((best_t, best_edge))
                    if t == best_t
                        && self.defending_team(edge).is_some()
                        && self.defending_team(best_edge).is_none() =>
                {
                    Some((t, edge))
                }
                keep => keep,
            };
        }

        let (t, edge) = best?;
        let crossing = from + delta * t.clamp(0.0, 1.0);
        Some(self.classify_on_edge(edge, self.project_to_edge(edge, crossing)))
    }

    fn project_to_edge(&self, edge: FieldEdge, p: Vector2) -> Vector2 {
        match edge {
            FieldEdge::West => Vector2::new(0.0, p.y.clamp(0.0, self.height)),
            FieldEdge::East => Vector2::new(self.width, p.y.clamp(0.0, self.height)),
            FieldEdge::South => Vector2::new(p.x.clamp(0.0, self.width), 0.0),
            FieldEdge::North => Vector2::new(p.x.clamp(0.0, self.width), self.height),
        }
    }

    fn classify_on_edge(&self, edge: FieldEdge, point: Vector2) -> BoundaryCrossing {
        match self.defending_team(edge) {
            Some(defending) => {
                let along = match edge {
                    FieldEdge::West | FieldEdge::East => point.y,
                    FieldEdge::South | FieldEdge::North => point.x,
                };
                if along >= self.goal_mouth[0] && along <= self.goal_mouth[1] {
                    BoundaryCrossing::Goal {
                        scoring_team: defending.opponent(),
                        edge,
                        point,
                    }
                } else {
                    BoundaryCrossing::OutOfBounds {
                        edge,
                        line: LineKind::GoalLine,
                        point,
                    }
                }
            }
            None => BoundaryCrossing::OutOfBounds {
                edge,
                line: LineKind::Touchline,
                point,
            },
        }
    }
}
