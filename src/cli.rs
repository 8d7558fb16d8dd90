use clap::{Parser, Subcommand};
use deepfake_detect_common::ModelType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deepfake-detect")]
#[command(about = "ディープフェイク画像判定クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を判定して履歴に保存
    Analyze {
        /// 画像ファイルのパス（5MBまで）
        #[arg(required = true)]
        image: PathBuf,

        /// 判定モデル (xception/vision-transformer)。省略時は設定値か対話選択
        #[arg(short, long)]
        model: Option<ModelType>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 解析履歴の表示/削除
    History {
        /// 履歴を全て削除
        #[arg(long)]
        clear: bool,

        /// 指定番号（1始まり）の結果を再表示
        #[arg(short, long)]
        show: Option<usize>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 利用可能なモデルを表示
    Models,

    /// 設定を表示/編集
    Config {
        /// 推論エンドポイント（GradioアプリのURL）を設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// APIトークンを設定（環境変数 HF_TOKEN が優先）
        #[arg(long)]
        set_token: Option<String>,

        /// 既定のモデルを設定
        #[arg(long)]
        set_default_model: Option<ModelType>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
