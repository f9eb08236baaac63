//! コンテナエンジン（docker / podman）の呼び出し
//!
//! [`ImageBuilder`] はイメージのビルドまたは pull、[`ContainerRunner`] は
//! ビルド環境コンテナ内でのコマンド実行を組み立てます。実際のプロセス起動は
//! [`CommandExecutor`] に委譲します。

pub mod builder;
pub mod error;
pub mod executor;
pub mod runner;

pub use builder::{BuildAction, BuildPlan, ImageBuilder};
pub use error::{ContainerError, Result};
pub use executor::{CommandExecutor, Invocation, ProcessExecutor};
pub use runner::{ContainerRunner, RunOptions, RunPlan, current_user};

/// デフォルトのコンテナエンジン
pub const DEFAULT_ENGINE: &str = "docker";
