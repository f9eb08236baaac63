mod commands;

use chaos_build_container::{ContainerError, DEFAULT_ENGINE};
use chaos_build_core::{EnvironmentView, ResolveError};
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::resolve::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "chaos-build")]
#[command(about = "再現可能なビルド環境でイメージをビルドし、コマンドを実行する", long_about = None)]
struct Cli {
    /// コンテナエンジン (docker, podman)
    #[arg(long, global = true, env = "CHAOS_BUILD_ENGINE", default_value = DEFAULT_ENGINE)]
    engine: String,
    /// 実行せずにコマンドラインのみ表示
    #[arg(
        long,
        global = true,
        env = "CHAOS_BUILD_DRY_RUN",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// イメージをビルド（IMAGE_BUILD=1 以外は pull）
    BuildImage {
        /// イメージ名（例: chaos-mesh）
        name: String,
        /// ビルドコンテキストのディレクトリ
        context: PathBuf,
    },
    /// ビルド環境コンテナ内でコマンドを実行
    Run {
        /// 使用するイメージ名
        #[arg(long, default_value = "build-env")]
        image: String,
        /// 対話モード（-it）で実行
        #[arg(short, long)]
        interactive: bool,
        /// 追加で渡す環境変数（KEY または KEY=VALUE）
        #[arg(short = 'e', long = "env")]
        env: Vec<String>,
        /// 追加でマウントするボリューム（HOST:CONTAINER）
        #[arg(short = 'v', long = "volume")]
        volumes: Vec<String>,
        /// 実行するコマンド（-- 以降）。省略時は /bin/bash
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// イメージのタグ・参照・プラットフォームを表示
    Resolve {
        /// イメージ名
        name: String,
        /// 出力形式
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// バージョン情報を表示
    Version,
}

/// 各コマンドが共有する実行コンテキスト
pub struct Context {
    pub engine: String,
    pub dry_run: bool,
    pub env: EnvironmentView,
    pub workdir: PathBuf,
}

fn init_tracing() {
    // ログはstderrへ（stdoutはdry-runやresolveの出力に使う）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context {
        engine: cli.engine,
        dry_run: cli.dry_run,
        env: EnvironmentView::from_process(),
        workdir: std::env::current_dir()?,
    };
    tracing::debug!(
        "engine={} dry_run={} workdir={}",
        ctx.engine,
        ctx.dry_run,
        ctx.workdir.display()
    );

    match cli.command {
        Commands::BuildImage { name, context } => {
            commands::build_image::handle(&ctx, &name, &context)?;
        }
        Commands::Run {
            image,
            interactive,
            env,
            volumes,
            command,
        } => {
            commands::run::handle(&ctx, &image, interactive, env, volumes, command)?;
        }
        Commands::Resolve { name, format } => {
            commands::resolve::handle(&ctx, &name, format)?;
        }
        Commands::Version => {
            println!("chaos-build {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// エラーを表示し、終了コードを決定
fn report(err: &anyhow::Error) -> ExitCode {
    let (message, code) = if let Some(e) = err.downcast_ref::<ContainerError>() {
        (e.user_message(), e.exit_code())
    } else if let Some(e) = err.downcast_ref::<ResolveError>() {
        (e.user_message(), None)
    } else {
        (format!("{:#}", err), None)
    };

    eprintln!("{} {}", "Error:".red().bold(), message);

    let code = code
        .and_then(|c| u8::try_from(c).ok())
        .filter(|c| *c != 0)
        .unwrap_or(1);
    ExitCode::from(code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}
