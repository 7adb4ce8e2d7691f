use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{
    common::{defaults, TeamId},
    field::Field,
    formation::Formation,
    world::{BallSpec, SimulationError, TeamSpec, World},
};

pub use crate::models::config::SimulationConfig;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// 実行設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    pub dt_s: f64,
    pub duration_s: f64,
    pub seed: u64,
    /// ステップ数の上限（省略時は試合時間から算出）
    #[serde(default)]
    pub max_steps: Option<u64>,
}

/// フィールド設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldConfig {
    pub width_m: f64,
    pub height_m: f64,
    pub goal_mouth_m: [f64; 2],
}

/// ボール設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BallConfig {
    pub radius_m: f64,
    pub mass_kg: f64,
}

/// チーム設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamConfig {
    pub name: String,
    #[serde(default = "default_formation")]
    pub formation: String,
    #[serde(default = "default_player_radius")]
    pub player_radius_m: f64,
    #[serde(default = "default_player_mass")]
    pub player_mass_kg: f64,
    #[serde(default)]
    pub controlled_shirt: Option<u8>,
}

fn default_formation() -> String {
    "4-4-2".to_string()
}

fn default_player_radius() -> f64 {
    defaults::PLAYER_RADIUS
}

fn default_player_mass() -> f64 {
    defaults::PLAYER_MASS
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamsConfig {
    pub home: TeamConfig,
    pub away: TeamConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KickoffSide {
    #[default]
    Home,
    Away,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: RunConfig,
    #[serde(default)]
    pub physics: SimulationConfig,
    pub field: FieldConfig,
    pub ball: BallConfig,
    pub teams: TeamsConfig,
    #[serde(default)]
    pub kickoff: KickoffSide,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig =
            serde_yaml::from_str(&contents).map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig =
            serde_yaml::from_str(contents).map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 組み込みのデモシナリオ
    ///
    /// 既定の定数のままでは選手が遅すぎるため、速度と加速度だけ試合らしい値にしています。
    pub fn demo() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "Demo match".to_string(),
                description: "組み込みデモ: 800x600フィールド、4-4-2対4-3-3、5分間".to_string(),
            },
            sim: RunConfig {
                dt_s: defaults::DT_S,
                duration_s: defaults::MATCH_DURATION_S,
                seed: 42,
                max_steps: None,
            },
            physics: SimulationConfig {
                player_acceleration: 450.0,
                player_max_speed: 120.0,
                stamina_drain_per_s: 0.15,
                ..SimulationConfig::default()
            },
            field: FieldConfig {
                width_m: defaults::FIELD_WIDTH,
                height_m: defaults::FIELD_HEIGHT,
                goal_mouth_m: defaults::GOAL_MOUTH,
            },
            ball: BallConfig {
                radius_m: defaults::BALL_RADIUS,
                mass_kg: defaults::BALL_MASS,
            },
            teams: TeamsConfig {
                home: TeamConfig {
                    name: "Team A".to_string(),
                    formation: "4-4-2".to_string(),
                    player_radius_m: defaults::PLAYER_RADIUS,
                    player_mass_kg: defaults::PLAYER_MASS,
                    controlled_shirt: None,
                },
                away: TeamConfig {
                    name: "Team B".to_string(),
                    formation: "4-3-3".to_string(),
                    player_radius_m: defaults::PLAYER_RADIUS,
                    player_mass_kg: defaults::PLAYER_MASS,
                    controlled_shirt: None,
                },
            },
            kickoff: KickoffSide::Home,
        }
    }

    /// 設定の検証
    ///
    /// 実際にWorldを構築して、フィールド・ボディ・フォーメーションの不正も検出します。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.sim.dt_s > 0.0 && self.sim.dt_s.is_finite()) {
            return Err(ScenarioError::ValidationError("dt_s must be positive".to_string()));
        }
        if !(self.sim.duration_s > 0.0 && self.sim.duration_s.is_finite()) {
            return Err(ScenarioError::ValidationError("duration_s must be positive".to_string()));
        }
        if self.sim.dt_s > self.sim.duration_s / 2.0 {
            return Err(ScenarioError::ValidationError(format!(
                "dt_s {} must not exceed half of duration_s {}",
                self.sim.dt_s, self.sim.duration_s
            )));
        }
        if self.sim.max_steps == Some(0) {
            return Err(ScenarioError::ValidationError("max_steps must be positive".to_string()));
        }

        self.physics.validate()?;
        self.build_world()?;
        Ok(())
    }

    /// シナリオからWorldを構築
    pub fn build_world(&self) -> Result<World, SimulationError> {
        let field = Field::new(self.field.width_m, self.field.height_m, self.field.goal_mouth_m)?;
        let ball = BallSpec {
            radius: self.ball.radius_m,
            mass: self.ball.mass_kg,
        };
        let teams = [team_spec(&self.teams.home)?, team_spec(&self.teams.away)?];
        let opening = match self.kickoff {
            KickoffSide::Home => TeamId::Home,
            KickoffSide::Away => TeamId::Away,
        };
        World::new(field, ball, teams, self.sim.duration_s, opening)
    }

    /// ステップ数の上限
    pub fn max_steps(&self) -> u64 {
        self.sim
            .max_steps
            .unwrap_or_else(|| (self.sim.duration_s / self.sim.dt_s).ceil() as u64 * 2 + 100)
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.4}秒", self.sim.dt_s);
        println!("試合時間: {:.1}秒 ({:.1}分)", self.sim.duration_s, self.sim.duration_s / 60.0);
        println!("シード値: {}", self.sim.seed);
        println!("ブロードフェーズ: {:?}", self.physics.broad_phase);
        println!();

        println!("=== フィールド ===");
        println!("サイズ: {:.0} x {:.0}", self.field.width_m, self.field.height_m);
        println!("ゴールマウス: [{:.0}, {:.0}]", self.field.goal_mouth_m[0], self.field.goal_mouth_m[1]);
        println!();

        println!("=== チーム ===");
        for (label, team) in [("HOME", &self.teams.home), ("AWAY", &self.teams.away)] {
            print!("  {}: {} ({})", label, team.name, team.formation);
            if let Some(shirt) = team.controlled_shirt {
                print!(" 操作選手: #{}", shirt);
            }
            println!();
        }
    }
}

fn team_spec(config: &TeamConfig) -> Result<TeamSpec, SimulationError> {
    Ok(TeamSpec {
        name: config.name.clone(),
        formation: Formation::parse(&config.formation)?,
        player_radius: config.player_radius_m,
        player_mass: config.player_mass_kg,
        controlled_shirt: config.controlled_shirt,
    })
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    ValidationError(String),

    #[error("設定検証エラー: {0}")]
    Simulation(#[from] SimulationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BroadPhase;
    use std::io::Write;

    const SAMPLE: &str = r#"
meta:
  version: "1.0"
  name: "unit test"
sim:
  dt_s: 0.1
  duration_s: 60.0
  seed: 7
physics:
  restitution: 0.5
  broad_phase: grid
field:
  width_m: 800.0
  height_m: 600.0
  goal_mouth_m: [250.0, 350.0]
ball:
  radius_m: 7.0
  mass_kg: 0.5
teams:
  home:
    name: "Reds"
    formation: "4-3-3"
    controlled_shirt: 10
  away:
    name: "Blues"
kickoff: away
"#;

    #[test]
    fn test_parse_sample_scenario() {
        let scenario = ScenarioConfig::from_yaml_str(SAMPLE).expect("valid scenario");
        assert_eq!(scenario.sim.seed, 7);
        assert_eq!(scenario.physics.restitution, 0.5);
        assert_eq!(scenario.physics.broad_phase, BroadPhase::Grid);
        // 省略した項目はデフォルト値
        assert_eq!(scenario.physics.ball_friction, defaults::BALL_FRICTION);
        assert_eq!(scenario.teams.away.formation, "4-4-2");
        assert_eq!(scenario.kickoff, KickoffSide::Away);
        assert!(scenario.max_steps() >= 1200);

        let world = scenario.build_world().expect("world");
        assert_eq!(world.kickoff_team(), TeamId::Away);
        assert_eq!(world.team(TeamId::Home).formation, "4-3-3");
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        let scenario = ScenarioConfig::from_file(file.path()).expect("valid scenario");
        assert_eq!(scenario.meta.name, "unit test");
    }

    #[test]
    fn test_missing_file() {
        let result = ScenarioConfig::from_file("does/not/exist.yaml");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = ScenarioConfig::from_yaml_str("meta: [unclosed");
        assert!(matches!(result, Err(ScenarioError::ParseError(_, _))));
    }

    #[test]
    fn test_validation_errors() {
        let bad_mouth = SAMPLE.replace("goal_mouth_m: [250.0, 350.0]", "goal_mouth_m: [100.0, 700.0]");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&bad_mouth),
            Err(ScenarioError::Simulation(SimulationError::InvalidConfiguration(_)))
        ));

        let bad_dt = SAMPLE.replace("dt_s: 0.1", "dt_s: 0.0");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&bad_dt),
            Err(ScenarioError::ValidationError(_))
        ));

        let bad_restitution = SAMPLE.replace("restitution: 0.5", "restitution: 1.5");
        assert!(ScenarioConfig::from_yaml_str(&bad_restitution).is_err());

        let bad_mass = SAMPLE.replace("mass_kg: 0.5", "mass_kg: -0.5");
        assert!(ScenarioConfig::from_yaml_str(&bad_mass).is_err());

        let bad_formation = SAMPLE.replace("formation: \"4-3-3\"", "formation: \"4-3-2\"");
        assert!(ScenarioConfig::from_yaml_str(&bad_formation).is_err());

        let overflowing = SAMPLE.replace("formation: \"4-3-3\"", "formation: \"4294967295-11\"");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&overflowing),
            Err(ScenarioError::Simulation(SimulationError::InvalidConfiguration(_)))
        ));

        for shirt in ["0", "42"] {
            let bad_shirt = SAMPLE.replace("controlled_shirt: 10", &format!("controlled_shirt: {}", shirt));
            assert!(matches!(
                ScenarioConfig::from_yaml_str(&bad_shirt),
                Err(ScenarioError::Simulation(SimulationError::InvalidConfiguration(_)))
            ));
        }
    }

    #[test]
    fn test_demo_scenario_is_valid() {
        let demo = ScenarioConfig::demo();
        assert!(demo.validate().is_ok());
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_bundled_scenarios_are_valid() {
        for name in ["default_match", "short_match", "tall_pitch"] {
            let path = format!("{}/scenarios/{}.yaml", env!("CARGO_MANIFEST_DIR"), name);
            let scenario = ScenarioConfig::from_file(&path).unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert!(scenario.build_world().is_ok(), "{}", name);
        }
    }
}
