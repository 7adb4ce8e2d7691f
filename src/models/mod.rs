// 基本的なデータ型と定数
pub mod common;

// ボディ・戦術AIの基本インターフェース（trait）定義
pub mod traits;

// 試合を構成するモデル
pub mod body;
pub mod clock;
pub mod config;
pub mod events;
pub mod field;
pub mod formation;
pub mod world;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use body::{Body, BodyKind, PlayerState};
pub use config::SimulationConfig;
pub use clock::{MatchClock, MatchHalf, MatchPhase, PhaseTransition};
pub use events::MatchEvent;
pub use field::{BoundaryCrossing, Field, PlayAxis};
pub use formation::Formation;
pub use world::{BallSpec, SimulationError, TeamInfo, TeamSpec, World};
