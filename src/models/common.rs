use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// 2次元ベクトル（位置・速度・方向に共通で使用）
///
/// 値型であり、全ての演算は新しいインスタンスを返します。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64, // m
    pub y: f64, // m
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(self, other: Vector2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Vector2) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    /// ベクトルの長さ
    pub fn magnitude(self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 単位ベクトルを返す
    ///
    /// 長さ0のベクトルはゼロ除算せずにゼロベクトルを返します（退化ケース）。
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            Self::ZERO
        }
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2点間の距離
    pub fn distance(self, other: Vector2) -> f64 {
        (other - self).magnitude()
    }

    /// 大きさを上限でクリップ
    pub fn clamp_magnitude(self, max_len: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_len && mag > 0.0 {
            self.scale(max_len / mag)
        } else {
            self
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Vector2::add(self, other)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Vector2::sub(self, other)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        self.scale(scalar)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// ボディ識別子（World内のインデックスと一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// チーム識別子
///
/// Homeは座標の小さい側のゴール（West/South）を守り、Awayは反対側を守ります。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamId {
    Home,
    Away,
}

impl TeamId {
    pub fn index(self) -> usize {
        match self {
            TeamId::Home => 0,
            TeamId::Away => 1,
        }
    }

    pub fn opponent(self) -> TeamId {
        match self {
            TeamId::Home => TeamId::Away,
            TeamId::Away => TeamId::Home,
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamId::Home => write!(f, "HOME"),
            TeamId::Away => write!(f, "AWAY"),
        }
    }
}

/// 選手のポジション
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Forward,
    Defender,
    Midfielder,
    Goalkeeper,
}

/// フィールドの辺
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEdge {
    /// x = 0
    West,
    /// x = width
    East,
    /// y = 0
    South,
    /// y = height
    North,
}

/// ボールが越えたラインの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// 長辺（タッチライン）
    Touchline,
    /// 短辺のゴールマウス外（ゴールライン）
    GoalLine,
}

/// シミュレーション定数のデフォルト値
pub mod defaults {
    pub const FIELD_WIDTH: f64 = 800.0;
    pub const FIELD_HEIGHT: f64 = 600.0;
    pub const GOAL_MOUTH: [f64; 2] = [250.0, 350.0];
    pub const PLAYERS_PER_TEAM: usize = 11;
    pub const PLAYER_RADIUS: f64 = 10.0;
    pub const PLAYER_MASS: f64 = 70.0;
    pub const PLAYER_MAX_SPEED: f64 = 5.0;
    pub const PLAYER_ACCELERATION: f64 = 0.5;
    pub const PLAYER_FRICTION: f64 = 0.95;
    pub const BALL_RADIUS: f64 = 7.0;
    pub const BALL_MASS: f64 = 0.5;
    pub const BALL_FRICTION: f64 = 0.98;
    pub const COEFFICIENT_OF_RESTITUTION: f64 = 0.7;
    pub const MATCH_DURATION_S: f64 = 300.0;
    pub const DT_S: f64 = 1.0 / 60.0;
    pub const MAX_STAMINA: f64 = 100.0;
}
