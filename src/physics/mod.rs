//! # Physics モジュール
//!
//! 円形剛体同士の衝突検知と衝突応答を提供します。
//!
//! 1ティックの中で、積分（`IMovable::move_body`）の後に
//! [`detect_collisions`] → [`resolve_collisions`] の順に呼び出されます。

pub mod detector;
pub mod resolver;

pub use detector::{detect_collisions, BroadPhase, CollisionPair};
pub use resolver::{resolve_collisions, resolve_pair};
