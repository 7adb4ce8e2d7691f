//! 円同士の重なり検知
//!
//! ボディ数は23体と小さいため、既定では全ペアを調べるO(n²)の単純な方式を使います。
//! 一様グリッドによるブロードフェーズも選択でき、出力は単純方式と完全に一致します。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    body::Body,
    common::{BodyId, Vector2},
};

/// ブロードフェーズの方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadPhase {
    /// 全ペア総当たり
    #[default]
    Naive,
    /// 一様グリッド
    Grid,
}

/// 重なっているボディの組（`a < b`）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionPair {
    pub a: BodyId,
    pub b: BodyId,
    /// 検知時点の侵入深さ
    pub depth: f64,
}

impl CollisionPair {
    pub fn key(&self) -> (BodyId, BodyId) {
        (self.a, self.b)
    }
}

/// 重なっている全ペアを `(a, b)` 昇順で返す
///
/// 判定は `distance < radius_a + radius_b`（接触しているだけのペアは含まない）。
pub fn detect_collisions(bodies: &[Body], broad_phase: BroadPhase) -> Vec<CollisionPair> {
    let mut pairs = match broad_phase {
        BroadPhase::Naive => detect_naive(bodies),
        BroadPhase::Grid => detect_grid(bodies),
    };
    pairs.sort_by_key(|p| p.key());
    pairs
}

fn detect_naive(bodies: &[Body]) -> Vec<CollisionPair> {
    let mut pairs = Vec::new();
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            if let Some(pair) = overlap(&bodies[i], &bodies[j]) {
                pairs.push(pair);
            }
        }
    }
    pairs
}

fn detect_grid(bodies: &[Body]) -> Vec<CollisionPair> {
    let max_radius = bodies.iter().map(|b| b.radius).fold(0.0_f64, f64::max);
    if max_radius <= 0.0 {
        return detect_naive(bodies);
    }
    // 重なり得る2体の中心距離は 2*max_radius 未満なので隣接セルまでで十分
    let cell_size = 2.0 * max_radius;
    let cell_of = |p: Vector2| ((p.x / cell_size).floor() as i64, (p.y / cell_size).floor() as i64);

    let mut grid: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (index, body) in bodies.iter().enumerate() {
        grid.entry(cell_of(body.position)).or_default().push(index);
    }

    let mut pairs = Vec::new();
    for (i, body) in bodies.iter().enumerate() {
        let (cx, cy) = cell_of(body.position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(members) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &j in members.iter().filter(|&&j| j > i) {
                    if let Some(pair) = overlap(body, &bodies[j]) {
                        pairs.push(pair);
                    }
                }
            }
        }
    }
    pairs
}

fn overlap(first: &Body, second: &Body) -> Option<CollisionPair> {
    if first.id == second.id {
        return None;
    }
    let distance = first.position.distance(second.position);
    let radii = first.radius + second.radius;
    if distance < radii {
        Some(CollisionPair {
            a: first.id.min(second.id),
            b: first.id.max(second.id),
            depth: radii - distance,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn disc(id: usize, x: f64, y: f64, radius: f64) -> Body {
        Body::ball(BodyId(id), Vector2::new(x, y), radius, 1.0)
    }

    #[test]
    fn test_detects_overlapping_pairs_only() {
        let bodies = vec![
            disc(0, 0.0, 0.0, 10.0),
            disc(1, 15.0, 0.0, 10.0),  // 0と重なる
            disc(2, 35.0, 0.0, 10.0),  // 1とちょうど接触（重ならない）
            disc(3, 100.0, 100.0, 5.0),
            disc(4, 103.0, 104.0, 1.0), // 3と重なる（距離5 < 6）
        ];
        let pairs = detect_collisions(&bodies, BroadPhase::Naive);
        let keys: Vec<_> = pairs.iter().map(|p| (p.a.0, p.b.0)).collect();
        assert_eq!(keys, vec![(0, 1), (3, 4)]);
        assert!((pairs[0].depth - 5.0).abs() < 1e-12);
        assert!((pairs[1].depth - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pairs_are_deduplicated_and_ordered() {
        let bodies = vec![
            disc(0, 0.0, 0.0, 10.0),
            disc(1, 1.0, 0.0, 10.0),
            disc(2, 2.0, 0.0, 10.0),
        ];
        for broad_phase in [BroadPhase::Naive, BroadPhase::Grid] {
            let pairs = detect_collisions(&bodies, broad_phase);
            let keys: Vec<_> = pairs.iter().map(|p| (p.a.0, p.b.0)).collect();
            assert_eq!(keys, vec![(0, 1), (0, 2), (1, 2)]);
            assert!(pairs.iter().all(|p| p.a < p.b));
        }
    }

    #[test]
    fn test_coincident_bodies_collide() {
        let bodies = vec![disc(0, 5.0, 5.0, 1.0), disc(1, 5.0, 5.0, 1.0)];
        let pairs = detect_collisions(&bodies, BroadPhase::Grid);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].depth, 2.0);
    }

    proptest! {
        #[test]
        fn prop_grid_matches_naive(
            positions in prop::collection::vec((-50.0f64..850.0, -50.0f64..650.0, 1.0f64..12.0), 0..40)
        ) {
            let bodies: Vec<Body> = positions
                .iter()
                .enumerate()
                .map(|(i, &(x, y, r))| disc(i, x, y, r))
                .collect();
            let naive = detect_collisions(&bodies, BroadPhase::Naive);
            let grid = detect_collisions(&bodies, BroadPhase::Grid);
            prop_assert_eq!(naive, grid);
        }
    }
}
