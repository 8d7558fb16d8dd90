use clap::Parser;
use deepfake_detect::{cli, config, detector, display, error, history, media, workflow};
use deepfake_detect_common::{catalog, ModelType};
use cli::{Cli, Commands};
use config::Config;
use error::{DetectError, Result};
use history::{FileStore, HistoryLog};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 壊れた設定ファイルでも `config` サブコマンドで上書きできるようにする
    let config = match cli.command {
        Commands::Config { .. } => Config::load_or_default(),
        _ => Config::load()?,
    };
    debug!(endpoint = %config.endpoint, "設定読み込み");

    match cli.command {
        Commands::Analyze { image, model, json } => {
            println!("🔍 deepfake-detect - 画像判定\n");

            let model = match model.or(config.default_model) {
                Some(m) => m,
                None => prompt_model()?,
            };

            let file = media::ImageFile::open(&image)?;
            let detector = detector::GradioDetector::from_config(&config)?;
            let history = HistoryLog::new(FileStore::new(config.history_dir()?));
            let mut workflow = workflow::AnalysisWorkflow::new(detector, history);

            workflow.select_model(model)?;
            // 検証エラーはここで返る（状態は idle のまま）
            if let Err(e) = workflow.select_image(file) {
                eprintln!("❌ {}", e);
                return Err(e);
            }

            let progress = display::spawn_progress_bar(workflow.subscribe());
            let cancel = workflow.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-Cを受信");
                    cancel.cancel();
                }
            });

            let outcome = workflow.run().await.map(|r| r.clone());
            let image_url = workflow.image_url().map(str::to_string);
            drop(workflow);
            progress.await.ok();

            match outcome {
                Ok(result) if json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Ok(result) => {
                    println!("{}", display::format_result(&result, image_url.as_deref()));
                    println!("\n✅ 判定完了（履歴に保存しました）");
                }
                Err(DetectError::Cancelled) => {
                    println!("⏹ 解析を中止しました");
                }
                Err(e) => {
                    eprintln!("❌ 解析中にエラーが発生しました: {}", e);
                    return Err(e);
                }
            }
        }

        Commands::History { clear, show, json } => {
            let history = HistoryLog::new(FileStore::new(config.history_dir()?));

            if clear {
                history.clear();
                println!("✔ 履歴を削除しました");
                return Ok(());
            }

            if let Some(number) = show {
                let Some(item) = number.checked_sub(1).and_then(|i| history.get(i)) else {
                    println!("履歴 {} は存在しません（{}件）", number, history.len());
                    return Ok(());
                };

                // 判定は再実行せず保存済みの結果を表示
                let detector = detector::GradioDetector::from_config(&config)?;
                let mut workflow = workflow::AnalysisWorkflow::new(detector, history);
                workflow.view_history_item(&item)?;

                if let Some(result) = workflow.result() {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&item)?);
                    } else {
                        println!("モデル: {}\n", item.model_used.info().name);
                        println!("{}", display::format_result(result, workflow.image_url()));
                    }
                }
                return Ok(());
            }

            let items = history.items();
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("履歴はまだありません");
            } else {
                println!("最近の解析 ({}件):", items.len());
                for (i, item) in items.iter().enumerate() {
                    println!("{}", display::format_history_line(i, item));
                }
            }
        }

        Commands::Models => {
            for info in catalog() {
                println!("{}\n", display::format_model(info));
            }
        }

        Commands::Config { set_endpoint, set_token, set_default_model, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                changed = true;
                println!("✔ エンドポイントを設定しました");
            }

            if let Some(token) = set_token {
                config.api_token = Some(token);
                changed = true;
                println!("✔ APIトークンを設定しました");
            }

            if let Some(model) = set_default_model {
                config.default_model = Some(model);
                changed = true;
                println!("✔ 既定のモデルを設定しました");
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  エンドポイント: {}", config.endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  既定モデル: {}",
                    config.default_model.map(|m| m.to_string()).unwrap_or_else(|| "未設定".into())
                );
                println!("  履歴: {}", config.history_dir()?.display());
                println!(
                    "  APIトークン: {}",
                    if config.get_api_token().is_some() { "設定済み" } else { "未設定" }
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();

    if let Err(e) = result {
        eprintln!("ログ初期化に失敗: {}", e);
    }
}

/// モデルを対話的に選択
fn prompt_model() -> Result<ModelType> {
    let items: Vec<String> = catalog()
        .iter()
        .map(|m| format!("{} - Accuracy {:.1}%", m.name, m.metrics.accuracy * 100.0))
        .collect();

    let index = dialoguer::Select::new()
        .with_prompt("判定に使うモデルを選択してください")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| {
            warn!("モデル選択に失敗: {}", e);
            DetectError::NoModelSelected
        })?;

    Ok(ModelType::ALL[index])
}
