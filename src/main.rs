use std::fs::File;
use std::io::BufWriter;
use std::str::FromStr;

use clap::{Arg, Command};
use pitchsim::logging::{init_logging, parse_log_level, LogConfig, LogOutput};
use pitchsim::scenario::ScenarioConfig;
use pitchsim::simulation::SimulationEngine;
use pitchsim::strategy::FormationStrategy;
use tracing::{error, info};

/// 実行オプション
struct RunOptions {
    info_only: bool,
    verbose_level: u8,
    seed: Option<u64>,
    events_path: Option<String>,
    final_state_path: Option<String>,
}

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("pitchsim")
        .version("0.1.0")
        .about("2Dサッカー物理シミュレーション (Pitch Simulation)")
        .long_about("固定時間刻みの2D剛体シミュレーションでサッカーの試合を再現します。\n\
                     ボールと22人の選手の移動・衝突・得点・試合時計を扱います。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合は使用方法を表示します。")
                .conflicts_with("demo")
        )
        .arg(
            Arg::new("demo")
                .short('d')
                .long("demo")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みのデモシナリオを実行")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("戦術AIの乱数シードを上書き")
        )
        .arg(
            Arg::new("events")
                .long("events")
                .value_name("FILE")
                .help("試合イベントをJSON Lines形式で出力")
        )
        .arg(
            Arg::new("final-state")
                .long("final-state")
                .value_name("FILE")
                .help("試合終了時のWorldをJSONで出力")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルのディレクトリ")
        )
        .get_matches();

    // ログシステムの初期化
    let output = match matches.get_one::<String>("log-output").map(|s| LogOutput::from_str(s)) {
        Some(Ok(output)) => output,
        Some(Err(e)) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        None => LogOutput::Console,
    };
    let log_config = LogConfig {
        level: parse_log_level(matches.get_one::<String>("log-level").map(String::as_str).unwrap_or("info")),
        output,
        log_dir: matches.get_one::<String>("log-dir").cloned().unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };
    let _log_guard = match init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: ログの初期化に失敗しました: {}", e);
            std::process::exit(1);
        }
    };

    println!("2Dサッカー物理シミュレーション (Pitch Simulation) - pitchsim v0.1.0");
    println!();

    // 詳細レベルの設定
    let verbose_level = matches.get_count("verbose");
    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    let options = RunOptions {
        info_only: matches.get_flag("info"),
        verbose_level,
        seed: matches.get_one::<u64>("seed").copied(),
        events_path: matches.get_one::<String>("events").cloned(),
        final_state_path: matches.get_one::<String>("final-state").cloned(),
    };

    // シナリオの決定
    let scenario = if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match ScenarioConfig::from_file(scenario_path) {
            Ok(scenario) => {
                if verbose_level > 0 {
                    println!("シナリオファイル読み込み完了: {}", scenario_path);
                }
                scenario
            }
            Err(e) => {
                error!("シナリオの読み込みに失敗: {}", e);
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else if matches.get_flag("demo") {
        ScenarioConfig::demo()
    } else {
        // デフォルト動作: 使用方法と利用可能なシナリオ一覧を表示
        show_default_help();
        return;
    };

    match run_scenario(scenario, &options) {
        Ok(_) => {
            if verbose_level > 0 {
                println!("シナリオ実行が正常に完了しました。");
            }
        }
        Err(e) => {
            error!("シミュレーションエラー: {}", e);
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    }
}

/// シナリオを実行（または情報のみ表示）
fn run_scenario(mut scenario: ScenarioConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(seed) = options.seed {
        scenario.sim.seed = seed;
    }

    // 情報表示のみの場合
    if options.info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, options)
}

/// シナリオの実行
fn execute_scenario(scenario: ScenarioConfig, options: &RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    // 基本情報表示
    scenario.print_summary();
    println!();

    if options.verbose_level > 0 {
        println!("シミュレーション設定:");
        println!("  時間刻み: {:.4}秒", scenario.sim.dt_s);
        println!("  試合時間: {:.1}秒", scenario.sim.duration_s);
        println!("  シード値: {}", scenario.sim.seed);
        println!("  ステップ上限: {}", scenario.max_steps());
        println!();
    }

    // シミュレーションエンジンの作成
    let strategy = Box::new(FormationStrategy::new(scenario.sim.seed));
    let mut simulation = SimulationEngine::new(&scenario, strategy, options.verbose_level)?;
    if let Some(path) = &options.events_path {
        let file = File::create(path)?;
        simulation = simulation.with_event_writer(Box::new(BufWriter::new(file)));
        info!("イベント出力先: {}", path);
    }

    // シミュレーション実行
    let summary = simulation.run()?;
    println!();
    summary.print();

    if let Some(path) = &options.final_state_path {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &simulation.world)?;
        info!("最終状態を出力: {}", path);
    }

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  pitchsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>     シナリオファイルを指定して実行");
    println!("  -d, --demo                組み込みのデモシナリオを実行");
    println!("  -i, --info                シナリオ情報のみ表示");
    println!("  -v, --verbose             詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --seed <N>            戦術AIの乱数シードを上書き");
    println!("      --events <FILE>       イベントをJSON Lines形式で出力");
    println!("      --final-state <FILE>  最終状態をJSONで出力");
    println!("      --log-level <LEVEL>   ログレベル (trace, debug, info, warn, error)");
    println!("      --log-output <OUTPUT> ログ出力先 (console, file, both)");
    println!("      --log-dir <DIR>       ログファイルのディレクトリ");
    println!("  -h, --help                このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/default_match.yaml   - 標準の5分間の試合");
    println!("  scenarios/short_match.yaml     - 短時間の確認用");
    println!("  scenarios/tall_pitch.yaml      - 縦長フィールド（南北ゴール）");
    println!();
    println!("例:");
    println!("  pitchsim -s scenarios/default_match.yaml");
    println!("  pitchsim -s scenarios/short_match.yaml -v --events events.jsonl");
    println!("  pitchsim -s scenarios/tall_pitch.yaml -i");
    println!("  pitchsim --demo --seed 7");
}
