use serde::{Deserialize, Serialize};
use std::fmt;

/// 試合フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    Kickoff,
    InPlay,
    GoalScored,
    OutOfBounds,
    HalfTime,
    FullTime,
}

impl MatchPhase {
    /// 物理ステップを停止するフェーズか
    pub fn is_paused(self) -> bool {
        matches!(self, MatchPhase::GoalScored | MatchPhase::HalfTime | MatchPhase::FullTime)
    }

    /// 遷移表
    pub fn can_transition_to(self, to: MatchPhase) -> bool {
        use MatchPhase::*;
        match (self, to) {
            (Kickoff, InPlay) => true,
            (InPlay, GoalScored | OutOfBounds) => true,
            (GoalScored, Kickoff) => true,
            (OutOfBounds, InPlay | Kickoff) => true,
            (HalfTime, Kickoff) => true,
            (Kickoff | InPlay | GoalScored | OutOfBounds, HalfTime | FullTime) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchPhase::Kickoff => "KICKOFF",
            MatchPhase::InPlay => "IN_PLAY",
            MatchPhase::GoalScored => "GOAL_SCORED",
            MatchPhase::OutOfBounds => "OUT_OF_BOUNDS",
            MatchPhase::HalfTime => "HALF_TIME",
            MatchPhase::FullTime => "FULL_TIME",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchHalf {
    First,
    Second,
}

/// フェーズ遷移の記録
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTransition {
    pub from: MatchPhase,
    pub to: MatchPhase,
    pub elapsed: f64,
}

/// 試合時計とフェーズ状態機械
///
/// フェーズの変更はこの型を経由してのみ行われます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClock {
    /// 経過時間（秒）
    pub elapsed: f64,
    /// 試合時間（秒）
    pub duration: f64,
    pub half: MatchHalf,
    phase: MatchPhase,
}

impl MatchClock {
    pub fn new(duration: f64) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            half: MatchHalf::First,
            phase: MatchPhase::Kickoff,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    /// フェーズを遷移させる（遷移表にない場合はNone）
    pub fn transition(&mut self, to: MatchPhase) -> Option<PhaseTransition> {
        if !self.phase.can_transition_to(to) {
            return None;
        }
        let from = self.phase;
        self.phase = to;
        if from == MatchPhase::HalfTime {
            self.half = MatchHalf::Second;
        }
        Some(PhaseTransition {
            from,
            to,
            elapsed: self.elapsed,
        })
    }

    /// 時計を進め、ハーフタイム・試合終了に達した場合はその遷移を返す
    ///
    /// 境界を越えた場合、経過時間は境界値ちょうどに揃えます。
    pub fn advance(&mut self, dt: f64) -> Option<PhaseTransition> {
        self.elapsed += dt;
        let tolerance = 1e-9 * self.duration.max(1.0);

        if self.elapsed >= self.duration - tolerance {
            self.elapsed = self.duration;
            return self.transition(MatchPhase::FullTime);
        }

        let half_time = self.duration / 2.0;
        if self.half == MatchHalf::First && self.elapsed >= half_time - tolerance {
            self.elapsed = half_time;
            return self.transition(MatchPhase::HalfTime);
        }

        None
    }

    /// 試合開始状態に戻す
    pub fn reset(&mut self) {
        *self = Self::new(self.duration);
    }
}
