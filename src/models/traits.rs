use crate::models::{
    body::Body,
    common::{BodyId, Vector2},
    config::SimulationConfig,
    world::World,
};

/// 全ての剛体ボディが実装する基本インターフェース
pub trait IBody {
    /// ボディIDの取得
    fn get_id(&self) -> BodyId;

    /// 衝突半径
    fn get_radius(&self) -> f64;

    /// 質量
    fn get_mass(&self) -> f64;

    /// 逆質量（インパルス計算用）
    fn inverse_mass(&self) -> f64 {
        1.0 / self.get_mass()
    }
}

/// 移動可能なボディのインターフェース
pub trait IMovable {
    /// 1ティック分の運動更新
    ///
    /// `steering` は正規化前の進行方向（AI目標への方向、または外部操作入力）。
    fn move_body(&mut self, steering: Option<Vector2>, config: &SimulationConfig, dt: f64);

    /// 現在位置の取得
    fn get_position(&self) -> Vector2;

    /// 現在速度の取得
    fn get_velocity(&self) -> Vector2;
}

/// 選手の移動目標を供給する戦術AIのインターフェース
///
/// コアの外部協調者です。各ティックの開始時に、ID昇順で全選手について呼び出されます。
pub trait IStrategy {
    /// 外部操作されていない選手の移動目標地点
    fn target_for(&mut self, player: &Body, world: &World) -> Option<Vector2>;

    /// 外部操作中の選手の入力方向
    fn control_for(&mut self, _player: &Body, _world: &World) -> Option<Vector2> {
        None
    }
}
