//! # Simulation モジュール
//!
//! 試合シミュレーションの中核となるステップAPIと、それを回すホスト側エンジンを提供します。
//!
//! ## ステップ処理順序
//!
//! 各ティックは以下の順序で同期的に実行され、途中で中断されることはありません。
//!
//! 1. **戦術サンプリング**: `IStrategy` から各選手の目標を取得
//! 2. **積分**: 摩擦・加速度による速度と位置の更新
//! 3. **衝突検知**: 円同士の重なりペアを列挙
//! 4. **衝突応答**: ID昇順に位置補正とインパルスを適用
//! 5. **境界判定**: ボールのゴール・アウトオブバウンズ判定
//! 6. **時計更新**: ハーフタイム・試合終了の判定
//!
//! `step` 自体は時間待ちを一切行いません。実時間に合わせたペーシングはホストの責務です。
//!
//! ## 使用例
//!
//! ```no_run
//! use pitchsim::scenario::ScenarioConfig;
//! use pitchsim::simulation::SimulationEngine;
//! use pitchsim::strategy::FormationStrategy;
//!
//! let scenario = ScenarioConfig::from_file("scenarios/default_match.yaml")?;
//! let strategy = Box::new(FormationStrategy::new(scenario.sim.seed));
//! let mut engine = SimulationEngine::new(&scenario, strategy, 1)?;
//! let summary = engine.run()?;
//! println!("{:?}", summary.score);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, trace, warn};

use crate::models::{
    clock::MatchPhase,
    common::{TeamId, Vector2},
    config::SimulationConfig,
    events::MatchEvent,
    field::BoundaryCrossing,
    traits::{IMovable, IStrategy},
    world::{SimulationError, World},
};
use crate::physics::{detect_collisions, resolve_collisions};
use crate::scenario::ScenarioConfig;

/// シミュレーションを1ティック進め、このティックで発生したイベントを返す
///
/// `GoalScored`・`HalfTime`・`FullTime` の間は何も変更せず空のリストを返します。
/// `Kickoff` と `OutOfBounds` からは自動的に `InPlay` に遷移してから物理ステップを実行します。
///
/// # パニック
///
/// `dt` が正の有限値でない場合、または衝突中のボディの質量が正でない場合。
pub fn step(world: &mut World, config: &SimulationConfig, dt: f64, strategy: &mut dyn IStrategy) -> Vec<MatchEvent> {
    if world.clock.is_paused() {
        return Vec::new();
    }
    assert!(dt > 0.0 && dt.is_finite(), "dt must be positive and finite, got {}", dt);

    let mut events = Vec::new();
    match world.phase() {
        MatchPhase::Kickoff => enter_phase(world, MatchPhase::InPlay, &mut events),
        MatchPhase::OutOfBounds => {
            if let Some(point) = world.restart_point.take() {
                let ball = world.ball_mut();
                ball.position = point;
                ball.velocity = Vector2::ZERO;
            }
            enter_phase(world, MatchPhase::InPlay, &mut events);
        }
        _ => {}
    }

    // 1. 戦術サンプリング（ID昇順）
    let steering = sample_steering(world, strategy);

    // 2. 積分
    let ball_start = world.ball().position;
    for (body, direction) in world.bodies_mut().iter_mut().zip(steering) {
        body.move_body(direction, config, dt);
    }

    // 3-4. 衝突検知と応答
    let pairs = detect_collisions(world.bodies(), config.broad_phase);
    let resolved = resolve_collisions(world.bodies_mut(), &pairs, config.restitution);
    if config.emit_collision_events {
        let elapsed = world.elapsed();
        events.extend(resolved.iter().map(|pair| MatchEvent::Collision {
            a: pair.a,
            b: pair.b,
            depth: pair.depth,
            elapsed,
        }));
    }

    // 5. 境界判定（ボールのみ）
    if let Some(crossing) = world.field().classify_exit(ball_start, world.ball().position) {
        handle_crossing(world, crossing, &mut events);
    }

    // 6. 時計更新
    world.tick += 1;
    if let Some(transition) = world.clock.advance(dt) {
        events.push(transition.into());
    }

    events
}

/// 全ボディをキックオフ隊形に戻し、失点チームのキックオフで再開できる状態にする
///
/// `GoalScored`・`OutOfBounds`・`HalfTime`・`Kickoff` で呼び出せます。
pub fn reset_kickoff(world: &mut World, conceding_team: TeamId) -> Result<Vec<MatchEvent>, SimulationError> {
    let phase = world.phase();
    if phase != MatchPhase::Kickoff && !phase.can_transition_to(MatchPhase::Kickoff) {
        return Err(SimulationError::InvalidPhase {
            operation: "reset kickoff",
            phase,
        });
    }

    world.place_kickoff_formation(conceding_team);
    world.last_conceding = None;

    let mut events = Vec::new();
    if phase != MatchPhase::Kickoff {
        enter_phase(world, MatchPhase::Kickoff, &mut events);
    }
    debug!("キックオフ位置にリセット: {} ボール", conceding_team);
    Ok(events)
}

/// 停止中の試合を再開する（ホストからの再開シグナル）
///
/// - `GoalScored`: 失点チームのキックオフ
/// - `HalfTime`: 前半にキックオフしなかったチームのキックオフで後半開始
pub fn resume(world: &mut World) -> Result<Vec<MatchEvent>, SimulationError> {
    match world.phase() {
        MatchPhase::GoalScored => {
            let conceding = world.last_conceding.unwrap_or(world.kickoff_team.opponent());
            reset_kickoff(world, conceding)
        }
        MatchPhase::HalfTime => {
            let second_half_kicker = world.opening_kickoff().opponent();
            reset_kickoff(world, second_half_kicker)
        }
        phase => Err(SimulationError::InvalidPhase {
            operation: "resume",
            phase,
        }),
    }
}

/// 試合を最初からやり直す（スコア・時計・スタミナ・隊形をリセット）
pub fn restart_match(world: &mut World) {
    world.reset_match_state();
    info!("試合をリスタートしました");
}

fn sample_steering(world: &World, strategy: &mut dyn IStrategy) -> Vec<Option<Vector2>> {
    world
        .bodies()
        .iter()
        .map(|body| {
            let state = body.player_state()?;
            let direction = if state.controlled {
                strategy.control_for(body, world)
            } else {
                strategy.target_for(body, world).map(|target| target - body.position)
            };
            direction.filter(|d| d.is_finite())
        })
        .collect()
}

fn enter_phase(world: &mut World, to: MatchPhase, events: &mut Vec<MatchEvent>) {
    match world.clock.transition(to) {
        Some(transition) => {
            trace!("フェーズ遷移: {} -> {}", transition.from, transition.to);
            events.push(transition.into());
        }
        None => warn!("不正なフェーズ遷移を無視: {} -> {}", world.phase(), to),
    }
}

fn handle_crossing(world: &mut World, crossing: BoundaryCrossing, events: &mut Vec<MatchEvent>) {
    let elapsed = world.elapsed();
    match crossing {
        BoundaryCrossing::Goal {
            scoring_team, point, ..
        } => {
            world.score[scoring_team.index()] += 1;
            world.last_conceding = Some(scoring_team.opponent());
            world.ball_mut().velocity = Vector2::ZERO;
            debug!(
                "ゴール: {} ({}-{}) {:.1}秒",
                scoring_team, world.score[0], world.score[1], elapsed
            );
            events.push(MatchEvent::Goal {
                team_id: scoring_team,
                score: world.score,
                position: point,
                elapsed,
            });
            enter_phase(world, MatchPhase::GoalScored, events);
        }
        BoundaryCrossing::OutOfBounds { edge, line, point } => {
            let ball_radius = world.ball().radius;
            world.restart_point = Some(world.field().clamp_inside(point, ball_radius));
            world.ball_mut().velocity = Vector2::ZERO;
            debug!("アウトオブバウンズ: {:?} {:?} {} {:.1}秒", edge, line, point, elapsed);
            events.push(MatchEvent::OutOfBounds {
                side: edge,
                line,
                position: point,
                elapsed,
            });
            enter_phase(world, MatchPhase::OutOfBounds, events);
        }
    }
}

/// 得点記録
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalRecord {
    pub team_id: TeamId,
    pub elapsed: f64,
}

/// 試合結果の集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub home: String,
    pub away: String,
    pub score: [u32; 2],
    pub goals: Vec<GoalRecord>,
    pub out_of_bounds: u32,
    pub collisions: u32,
    pub elapsed: f64,
    pub steps: u64,
    pub completed: bool,
}

impl MatchSummary {
    /// 試合結果を表示
    pub fn print(&self) {
        println!("=== 試合結果 ===");
        println!("{} {} - {} {}", self.home, self.score[0], self.score[1], self.away);
        for goal in &self.goals {
            let scorer = match goal.team_id {
                TeamId::Home => &self.home,
                TeamId::Away => &self.away,
            };
            println!("  {:>6.1}秒  {}", goal.elapsed, scorer);
        }
        println!("アウトオブバウンズ: {}回", self.out_of_bounds);
        if self.collisions > 0 {
            println!("衝突: {}回", self.collisions);
        }
        println!("経過時間: {:.1}秒 / 総ステップ数: {}", self.elapsed, self.steps);
        if !self.completed {
            println!("（ステップ上限に達したため試合終了前に停止）");
        }
    }
}

/// ホスト側の試合エンジン
///
/// `step` を固定時間刻みで呼び出し、得点やハーフタイムでは `resume` で試合を再開します。
/// イベントはログに記録し、必要に応じてJSON Lines形式で書き出します。
pub struct SimulationEngine {
    pub world: World,
    pub config: SimulationConfig,
    pub dt: f64,
    pub max_steps: u64,
    pub step_count: u64,
    pub strategy: Box<dyn IStrategy>,
    pub event_log: Vec<MatchEvent>,
    pub verbose_level: u8,
    event_writer: Option<Box<dyn Write>>,
}

impl SimulationEngine {
    pub fn new(
        scenario: &ScenarioConfig,
        strategy: Box<dyn IStrategy>,
        verbose_level: u8,
    ) -> Result<Self, SimulationError> {
        scenario.physics.validate()?;
        let world = scenario.build_world()?;

        if verbose_level > 0 {
            info!(
                "Worldを初期化: {} vs {} ({:.0}x{:.0})",
                world.team(TeamId::Home).name,
                world.team(TeamId::Away).name,
                world.field().width,
                world.field().height
            );
        }

        Ok(Self {
            world,
            config: scenario.physics.clone(),
            dt: scenario.sim.dt_s,
            max_steps: scenario.max_steps(),
            step_count: 0,
            strategy,
            event_log: Vec::new(),
            verbose_level,
            event_writer: None,
        })
    }

    /// イベントをJSON Lines形式で書き出す先を設定
    pub fn with_event_writer(mut self, writer: Box<dyn Write>) -> Self {
        self.event_writer = Some(writer);
        self
    }

    /// 1ティック進め、停止フェーズに入った場合はホストとして再開処理を行う
    pub fn step(&mut self) -> Result<Vec<MatchEvent>, Box<dyn std::error::Error>> {
        let mut events = step(&mut self.world, &self.config, self.dt, self.strategy.as_mut());
        self.step_count += 1;

        match self.world.phase() {
            MatchPhase::GoalScored => events.extend(resume(&mut self.world)?),
            MatchPhase::HalfTime => {
                info!("ハーフタイム: {}-{}", self.world.score()[0], self.world.score()[1]);
                events.extend(resume(&mut self.world)?);
            }
            _ => {}
        }

        for event in &events {
            self.record(event)?;
        }
        Ok(events)
    }

    /// 試合終了（またはステップ上限）まで実行
    pub fn run(&mut self) -> Result<MatchSummary, Box<dyn std::error::Error>> {
        info!("=== 試合開始 ===");

        while self.world.phase() != MatchPhase::FullTime {
            if self.step_count >= self.max_steps {
                warn!("ステップ上限 {} に達しました", self.max_steps);
                break;
            }

            self.step()?;

            if self.verbose_level > 2 {
                trace!("時刻: {:.2}秒 (ステップ: {})", self.world.elapsed(), self.step_count);
            }

            if self.step_count % 600 == 0 && self.verbose_level > 0 {
                let progress = (self.world.elapsed() / self.world.clock().duration) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}秒) スコア {}-{}",
                    progress,
                    self.world.elapsed(),
                    self.world.clock().duration,
                    self.world.score()[0],
                    self.world.score()[1]
                );
            }
        }

        if let Some(writer) = self.event_writer.as_mut() {
            writer.flush()?;
        }

        let summary = self.summary();
        info!("=== 試合終了 ===");
        info!("スコア: {}-{}", summary.score[0], summary.score[1]);
        info!("総ステップ数: {}", summary.steps);
        Ok(summary)
    }

    fn record(&mut self, event: &MatchEvent) -> Result<(), Box<dyn std::error::Error>> {
        match event {
            MatchEvent::Goal { team_id, score, elapsed, .. } => {
                info!(
                    "ゴール! {} ({}-{}) {:.1}秒",
                    self.world.team(*team_id).name,
                    score[0],
                    score[1],
                    elapsed
                );
            }
            MatchEvent::PhaseChange { from, to, elapsed } if self.verbose_level > 1 => {
                debug!("フェーズ: {} -> {} ({:.1}秒)", from, to, elapsed);
            }
            _ => trace!("イベント {:.2}秒: {:?}", event.elapsed(), event),
        }

        if let Some(writer) = self.event_writer.as_mut() {
            serde_json::to_writer(&mut *writer, event)?;
            writer.write_all(b"\n")?;
        }
        self.event_log.push(event.clone());
        Ok(())
    }

    /// 現在までのイベントから試合結果を集計
    pub fn summary(&self) -> MatchSummary {
        let mut goals = Vec::new();
        let mut out_of_bounds = 0;
        let mut collisions = 0;
        for event in &self.event_log {
            match event {
                MatchEvent::Goal { team_id, elapsed, .. } => goals.push(GoalRecord {
                    team_id: *team_id,
                    elapsed: *elapsed,
                }),
                MatchEvent::OutOfBounds { .. } => out_of_bounds += 1,
                MatchEvent::Collision { .. } => collisions += 1,
                MatchEvent::PhaseChange { .. } => {}
            }
        }

        MatchSummary {
            home: self.world.team(TeamId::Home).name.clone(),
            away: self.world.team(TeamId::Away).name.clone(),
            score: self.world.score(),
            goals,
            out_of_bounds,
            collisions,
            elapsed: self.world.elapsed(),
            steps: self.step_count,
            completed: self.world.phase() == MatchPhase::FullTime,
        }
    }
}
