use crate::models::{
    common::{defaults, Role, Vector2},
    world::SimulationError,
};

/// キックオフ時の最前列の深さ（ハーフウェイラインの手前）
const FRONT_LINE_DEPTH: f64 = 0.45;
/// 最後列の深さ
const BACK_LINE_DEPTH: f64 = 0.15;
const GOALKEEPER_DEPTH: f64 = 0.03;

/// "4-4-2" 形式のフォーメーション
///
/// ゴールキーパーを除くフィールドプレーヤーのライン構成を後方から順に保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    lines: Vec<u32>,
}

impl Formation {
    /// 文字列からフォーメーションを解析
    pub fn parse(spec: &str) -> Result<Self, SimulationError> {
        let lines = spec
            .split('-')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                SimulationError::InvalidConfiguration(format!("invalid formation '{}': {}", spec, e))
            })?;

        let outfield = defaults::PLAYERS_PER_TEAM - 1;
        // 1ラインの人数を先に制限してから合計する
        let valid_lines = lines.iter().all(|&count| count >= 1 && count as usize <= outfield);
        if lines.is_empty() || !valid_lines || lines.iter().map(|&count| count as usize).sum::<usize>() != outfield {
            return Err(SimulationError::InvalidConfiguration(format!(
                "formation '{}' must describe {} outfield players",
                spec, outfield
            )));
        }

        Ok(Self { lines })
    }

    /// 後方からのライン構成
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// 検証を経ずにライン構成を指定（World側の検証のテスト用）
    #[cfg(test)]
    pub(crate) fn from_lines_unchecked(lines: Vec<u32>) -> Self {
        Self { lines }
    }

    /// 各選手の役割と正規化座標（x: 自陣からの深さ, y: 横位置）を生成
    ///
    /// 先頭はゴールキーパー、以降は後方ラインから左右順に並びます。
    pub fn anchors(&self) -> Vec<(Role, Vector2)> {
        let mut anchors = vec![(Role::Goalkeeper, Vector2::new(GOALKEEPER_DEPTH, 0.5))];
        let line_count = self.lines.len();

        for (line_index, &count) in self.lines.iter().enumerate() {
            let depth = if line_count > 1 {
                BACK_LINE_DEPTH
                    + (FRONT_LINE_DEPTH - BACK_LINE_DEPTH) * line_index as f64 / (line_count - 1) as f64
            } else {
                (BACK_LINE_DEPTH + FRONT_LINE_DEPTH) / 2.0
            };
            let role = match line_index {
                _ if line_count == 1 => Role::Midfielder,
                0 => Role::Defender,
                i if i == line_count - 1 => Role::Forward,
                _ => Role::Midfielder,
            };

            for slot in 0..count {
                let lateral = (slot + 1) as f64 / (count + 1) as f64;
                anchors.push((role, Vector2::new(depth, lateral)));
            }
        }

        anchors
    }
}

impl Default for Formation {
    fn default() -> Self {
        Self { lines: vec![4, 4, 2] }
    }
}
