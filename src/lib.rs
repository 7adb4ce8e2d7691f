//! # pitchsim
//!
//! 2Dサッカーの剛体シミュレーションコアです。
//!
//! - [`models`]: ベクトル・ボディ・フィールド・試合時計などのデータモデル
//! - [`physics`]: 衝突検知と衝突応答
//! - [`simulation`]: 1ティックのステップAPIとホスト側エンジン
//! - [`strategy`]: 選手の移動目標を決める戦術AI
//! - [`scenario`]: YAMLシナリオの読み込みと検証
//! - [`logging`]: tracingによるログ出力の初期化

pub mod logging;
pub mod models;
pub mod physics;
pub mod scenario;
pub mod simulation;
pub mod strategy;
