//! 衝突応答（位置補正 + 反発係数付きインパルス）
//!
//! ペアは `(min(a,b), max(a,b))` の昇順で1回ずつ処理します。あるペアの解消が別のペアの
//! 重なりを変えることはありますが、反復ソルバーは持たない単一パスの近似です。

use crate::models::{body::Body, common::Vector2, traits::IBody};
use crate::physics::detector::CollisionPair;

/// 中心が一致した場合に使う衝突法線
const FALLBACK_NORMAL: Vector2 = Vector2 { x: 1.0, y: 0.0 };

/// 検知済みのペアをID昇順に解消し、実際に応答したペアを返す
///
/// 返り値の `depth` は解消直前に再計算した侵入深さです。
/// 先に処理したペアの影響で重なりが無くなったペアはスキップします。
pub fn resolve_collisions(bodies: &mut [Body], pairs: &[CollisionPair], restitution: f64) -> Vec<CollisionPair> {
    let mut ordered: Vec<CollisionPair> = pairs
        .iter()
        .map(|p| CollisionPair {
            a: p.a.min(p.b),
            b: p.a.max(p.b),
            depth: p.depth,
        })
        .collect();
    ordered.sort_by_key(|p| p.key());
    ordered.dedup_by_key(|p| p.key());

    let mut resolved = Vec::with_capacity(ordered.len());
    for pair in ordered {
        if pair.a == pair.b {
            continue;
        }
        let (first, second) = pair_mut(bodies, pair.a.0, pair.b.0);
        if let Some(depth) = resolve_pair(first, second, restitution) {
            resolved.push(CollisionPair { depth, ..pair });
        }
    }
    resolved
}

/// 2体の衝突を解消する
///
/// 1. 侵入深さ `d` を現在位置から計算（重なっていなければ何もしない）
/// 2. 逆質量比で法線方向に押し離す
/// 3. 接近している場合のみ反発係数 `restitution` のインパルスを与える
///
/// 質量が正でないボディはワールド構築時の検証を通らないため、ここでは致命的な前提違反として扱います。
pub fn resolve_pair(a: &mut Body, b: &mut Body, restitution: f64) -> Option<f64> {
    assert!(
        a.get_mass() > 0.0 && b.get_mass() > 0.0,
        "non-positive mass in collision between {} and {}",
        a.id,
        b.id
    );

    let delta = b.position - a.position;
    let distance = delta.magnitude();
    let depth = a.radius + b.radius - distance;
    if depth <= 0.0 {
        return None;
    }

    let normal = if distance > 0.0 {
        delta * (1.0 / distance)
    } else {
        FALLBACK_NORMAL
    };

    let total_mass = a.mass + b.mass;
    a.position = a.position - normal * (depth * b.mass / total_mass);
    b.position = b.position + normal * (depth * a.mass / total_mass);

    let closing_speed = (b.velocity - a.velocity).dot(normal);
    if closing_speed > 0.0 {
        // 既に離れつつある
        return Some(depth);
    }

    let impulse = -(1.0 + restitution) * closing_speed / (a.inverse_mass() + b.inverse_mass());
    a.velocity = a.velocity - normal * (impulse * a.inverse_mass());
    b.velocity = b.velocity + normal * (impulse * b.inverse_mass());

    Some(depth)
}

fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (head, tail) = bodies.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::BodyId;
    use crate::physics::detector::{detect_collisions, BroadPhase};
    use proptest::prelude::*;

    fn disc(id: usize, position: Vector2, velocity: Vector2, radius: f64, mass: f64) -> Body {
        let mut body = Body::ball(BodyId(id), position, radius, mass);
        body.velocity = velocity;
        body
    }

    fn normal_momentum(a: &Body, b: &Body, n: Vector2) -> f64 {
        a.mass * a.velocity.dot(n) + b.mass * b.velocity.dot(n)
    }

    fn normal_energy(a: &Body, b: &Body, n: Vector2) -> f64 {
        0.5 * a.mass * a.velocity.dot(n).powi(2) + 0.5 * b.mass * b.velocity.dot(n).powi(2)
    }

    #[test]
    fn test_isolated_pair_is_separated() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::ZERO, 10.0, 70.0);
        let mut b = disc(1, Vector2::new(12.0, 0.0), Vector2::ZERO, 7.0, 0.5);

        let depth = resolve_pair(&mut a, &mut b, 0.7).expect("overlapping");
        assert!((depth - 5.0).abs() < 1e-12);
        assert!(a.position.distance(b.position) >= 17.0 - 1e-9);
        // 軽いボールの方が大きく動く
        assert!((b.position.x - 12.0) > (0.0 - a.position.x));
    }

    #[test]
    fn test_elastic_collision_conserves_normal_momentum() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::new(3.0, 1.0), 10.0, 70.0);
        let mut b = disc(1, Vector2::new(15.0, 5.0), Vector2::new(-2.0, 0.5), 7.0, 0.5);
        let n = (b.position - a.position).normalize();
        let before = normal_momentum(&a, &b, n);

        resolve_pair(&mut a, &mut b, 1.0).expect("overlapping");

        let after = normal_momentum(&a, &b, n);
        assert!((before - after).abs() < 1e-9, "before={} after={}", before, after);
    }

    #[test]
    fn test_restitution_loses_normal_energy() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::new(4.0, 0.0), 10.0, 70.0);
        let mut b = disc(1, Vector2::new(15.0, 0.0), Vector2::new(-1.0, 0.0), 10.0, 70.0);
        let n = Vector2::new(1.0, 0.0);
        let before = normal_energy(&a, &b, n);
        let total_before = a.kinetic_energy() + b.kinetic_energy();
        let momentum_before = normal_momentum(&a, &b, n);

        resolve_pair(&mut a, &mut b, 0.7).expect("overlapping");

        assert!(normal_energy(&a, &b, n) < before);
        assert!(a.kinetic_energy() + b.kinetic_energy() < total_before);
        assert!((normal_momentum(&a, &b, n) - momentum_before).abs() < 1e-9);
        // 反発後の相対速度は接近速度の0.7倍
        let separating = (b.velocity - a.velocity).dot(n);
        assert!((separating - 0.7 * 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_separating_pair_gets_no_impulse() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::new(-1.0, 0.0), 10.0, 1.0);
        let mut b = disc(1, Vector2::new(15.0, 0.0), Vector2::new(1.0, 0.0), 10.0, 1.0);

        resolve_pair(&mut a, &mut b, 0.7).expect("overlapping");

        assert_eq!(a.velocity, Vector2::new(-1.0, 0.0));
        assert_eq!(b.velocity, Vector2::new(1.0, 0.0));
        assert!((a.position.distance(b.position) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_centers_use_fallback_normal() {
        let mut a = disc(0, Vector2::new(5.0, 5.0), Vector2::ZERO, 1.0, 1.0);
        let mut b = disc(1, Vector2::new(5.0, 5.0), Vector2::ZERO, 1.0, 1.0);
        resolve_pair(&mut a, &mut b, 0.7).expect("overlapping");
        assert_eq!(a.position, Vector2::new(4.0, 5.0));
        assert_eq!(b.position, Vector2::new(6.0, 5.0));
    }

    #[test]
    fn test_non_overlapping_pair_is_skipped() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0), 1.0, 1.0);
        let mut b = disc(1, Vector2::new(5.0, 0.0), Vector2::ZERO, 1.0, 1.0);
        assert_eq!(resolve_pair(&mut a, &mut b, 0.7), None);
        assert_eq!(a.velocity, Vector2::new(1.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "non-positive mass")]
    fn test_negative_mass_is_fatal() {
        let mut a = disc(0, Vector2::new(0.0, 0.0), Vector2::ZERO, 1.0, -1.0);
        let mut b = disc(1, Vector2::new(1.0, 0.0), Vector2::ZERO, 1.0, 1.0);
        resolve_pair(&mut a, &mut b, 0.7);
    }

    #[test]
    fn test_resolution_order_does_not_depend_on_input_order() {
        let bodies = vec![
            disc(0, Vector2::new(0.0, 0.0), Vector2::new(2.0, 0.0), 10.0, 1.0),
            disc(1, Vector2::new(15.0, 0.0), Vector2::ZERO, 10.0, 1.0),
            disc(2, Vector2::new(28.0, 3.0), Vector2::new(-1.0, 0.0), 10.0, 2.0),
        ];
        let pairs = detect_collisions(&bodies, BroadPhase::Naive);
        let mut reversed = pairs.clone();
        reversed.reverse();

        let mut forward = bodies.clone();
        let mut backward = bodies.clone();
        let first = resolve_collisions(&mut forward, &pairs, 0.7);
        let second = resolve_collisions(&mut backward, &reversed, 0.7);

        assert_eq!(first, second);
        assert_eq!(forward, backward);
    }

    proptest! {
        #[test]
        fn prop_isolated_resolution_removes_overlap(
            angle in 0.0f64..std::f64::consts::TAU,
            gap in 0.01f64..0.99,
            ra in 1.0f64..12.0,
            rb in 1.0f64..12.0,
            ma in 0.1f64..100.0,
            mb in 0.1f64..100.0,
            va in (-10.0f64..10.0, -10.0f64..10.0),
            vb in (-10.0f64..10.0, -10.0f64..10.0),
        ) {
            let distance = (ra + rb) * gap;
            let offset = Vector2::new(angle.cos(), angle.sin()) * distance;
            let mut a = disc(0, Vector2::new(100.0, 100.0), Vector2::new(va.0, va.1), ra, ma);
            let mut b = disc(1, Vector2::new(100.0, 100.0) + offset, Vector2::new(vb.0, vb.1), rb, mb);
            let n = offset.normalize();
            let momentum_before = normal_momentum(&a, &b, n);

            prop_assert!(resolve_pair(&mut a, &mut b, 1.0).is_some());

            prop_assert!(a.position.distance(b.position) >= ra + rb - 1e-9);
            let momentum_after = normal_momentum(&a, &b, n);
            prop_assert!((momentum_before - momentum_after).abs() < 1e-6 * (1.0 + momentum_before.abs()));
        }
    }
}
