//! ビルド環境コンテナ内でのコマンド実行
//!
//! カレントディレクトリを同じパスでマウントし、ホストと同じ uid/gid で
//! コマンドを実行します。Go / yarn のビルドキャッシュはホスト側の
//! ディレクトリにマウントされます。

use crate::error::{ContainerError, Result};
use crate::executor::{CommandExecutor, Invocation, quote};
use chaos_build_core::{EnvironmentView, ImageName, PlatformInfo, compute_full_image_reference};
use std::path::PathBuf;

/// ビルドキャッシュのマウント定義: (環境変数, ホスト側サブディレクトリ, コンテナ側パス)
const CACHE_MOUNTS: &[(&str, &str, &str)] = &[
    ("GO_BUILD_CACHE", "chaos-mesh-gopath", "/tmp/go"),
    ("GO_BUILD_CACHE", "chaos-mesh-gobuild", "/tmp/go-build"),
    ("YARN_BUILD_CACHE", "chaos-mesh-yarncache", "/tmp/yarn-cache"),
];

const SHELL: &str = "/bin/bash";

/// `run` の指定内容
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub image: ImageName,
    /// `-it` を付与する
    pub interactive: bool,
    /// `KEY=VALUE` または `KEY`（値は環境から取得）
    pub extra_env: Vec<String>,
    /// `HOST:CONTAINER[:OPTIONS]`
    pub volumes: Vec<String>,
    /// 空の場合はシェルを起動
    pub command: Vec<String>,
}

impl RunOptions {
    pub fn new(image: ImageName) -> Self {
        Self {
            image,
            interactive: false,
            extra_env: Vec::new(),
            volumes: Vec::new(),
            command: Vec::new(),
        }
    }
}

/// 組み立て済みの run コマンドと、事前に作成すべきホストディレクトリ
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub invocation: Invocation,
    pub host_dirs: Vec<PathBuf>,
}

impl RunPlan {
    /// キャッシュ用ディレクトリを作成
    pub fn prepare_host_dirs(&self) -> Result<()> {
        for dir in &self.host_dirs {
            tracing::debug!("Creating cache directory: {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// 実行中ユーザーの (uid, gid)
#[cfg(unix)]
pub fn current_user() -> Option<(u32, u32)> {
    Some((
        nix::unistd::getuid().as_raw(),
        nix::unistd::getgid().as_raw(),
    ))
}

#[cfg(not(unix))]
pub fn current_user() -> Option<(u32, u32)> {
    None
}

/// ビルド環境コンテナでのコマンド実行を組み立てる
pub struct ContainerRunner {
    engine: String,
    workdir: PathBuf,
    user: Option<(u32, u32)>,
}

impl ContainerRunner {
    pub fn new(engine: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            workdir: workdir.into(),
            user: None,
        }
    }

    /// `--user uid:gid` を指定
    pub fn with_user(mut self, user: Option<(u32, u32)>) -> Self {
        self.user = user;
        self
    }

    pub fn plan(
        &self,
        options: &RunOptions,
        env: &EnvironmentView,
        platform: &PlatformInfo,
    ) -> Result<RunPlan> {
        let workdir = self.workdir.display().to_string();
        let mut invocation = Invocation::new(&self.engine);
        let mut host_dirs = Vec::new();

        invocation.args(["run", "--rm"]);
        if options.interactive {
            invocation.arg("-it");
        }
        invocation
            .opt("--platform", platform.docker_platform())
            .opt("--volume", format!("{}:{}", workdir, workdir))
            .opt("--workdir", &workdir);

        if let Some((uid, gid)) = self.user {
            invocation.opt("--user", format!("{}:{}", uid, gid));
        }

        for (key, value) in env.forwarded() {
            invocation.opt("--env", format!("{}={}", key, value));
        }

        for item in &options.extra_env {
            if let Some(pair) = extra_env_pair(item, env)? {
                invocation.opt("--env", pair);
            }
        }

        for volume in &options.volumes {
            validate_volume(volume)?;
            invocation.opt("--volume", volume);
        }

        for (key, subdir, target) in CACHE_MOUNTS {
            if let Some(cache_root) = env.get_non_empty(key) {
                let host_dir = PathBuf::from(cache_root).join(subdir);
                invocation.opt("--volume", format!("{}:{}", host_dir.display(), target));
                host_dirs.push(host_dir);
            }
        }

        invocation
            .opt("--env", "IN_DOCKER=1")
            .arg(compute_full_image_reference(&options.image, env))
            .arg(SHELL);

        if !options.command.is_empty() {
            let script = options
                .command
                .iter()
                .map(|arg| quote(arg))
                .collect::<Vec<_>>()
                .join(" ");
            invocation.opt("-c", script);
        }

        Ok(RunPlan {
            invocation,
            host_dirs,
        })
    }

    /// キャッシュディレクトリを作成してから実行
    pub fn execute<E>(&self, plan: &RunPlan, executor: &E) -> Result<()>
    where
        E: CommandExecutor + ?Sized,
    {
        plan.prepare_host_dirs()?;
        tracing::info!("Running in container: {}", plan.invocation);
        executor.run(&plan.invocation)
    }
}

fn extra_env_pair(item: &str, env: &EnvironmentView) -> Result<Option<String>> {
    if item.is_empty() || item.starts_with('=') {
        return Err(ContainerError::InvalidArgument(format!(
            "environment variable must be KEY or KEY=VALUE: {:?}",
            item
        )));
    }
    if item.contains('=') {
        return Ok(Some(item.to_string()));
    }
    match env.get(item) {
        Some(value) => Ok(Some(format!("{}={}", item, value))),
        None => {
            tracing::warn!("Environment variable {} is not set; not forwarding it", item);
            Ok(None)
        }
    }
}

fn validate_volume(volume: &str) -> Result<()> {
    match volume.split_once(':') {
        Some((host, container)) if !host.is_empty() && !container.is_empty() => Ok(()),
        _ => Err(ContainerError::InvalidArgument(format!(
            "volume must be HOST:CONTAINER: {:?}",
            volume
        ))),
    }
}
