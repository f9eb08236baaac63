//! ターゲットプラットフォームの検出

use crate::env::EnvironmentView;
use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};

/// ホストマシンのアーキテクチャ名を返す問い合わせ
pub trait HostArchitecture {
    /// `uname -m` 相当の値（例: `x86_64`, `aarch64`）
    fn machine(&self) -> Result<String>;
}

impl<F> HostArchitecture for F
where
    F: Fn() -> String,
{
    fn machine(&self) -> Result<String> {
        Ok(self())
    }
}

/// `uname(2)` によるホストアーキテクチャの取得
#[derive(Debug, Clone, Copy, Default)]
pub struct UnameHost;

impl HostArchitecture for UnameHost {
    #[cfg(unix)]
    fn machine(&self) -> Result<String> {
        let uts = nix::sys::utsname::uname().map_err(|e| ResolveError::HostQuery(e.to_string()))?;
        Ok(uts.machine().to_string_lossy().into_owned())
    }

    #[cfg(not(unix))]
    fn machine(&self) -> Result<String> {
        Ok(std::env::consts::ARCH.to_string())
    }
}

/// 検出されたターゲットプラットフォーム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub architecture: String,
    /// `TARGET_PLATFORM` で明示されたかどうか
    pub from_explicit_override: bool,
}

impl PlatformInfo {
    /// `docker --platform` に渡す形式（`linux/amd64`）
    pub fn docker_platform(&self) -> String {
        format!("linux/{}", self.architecture)
    }
}

fn map_machine(machine: &str) -> Option<&'static str> {
    match machine {
        "x86_64" | "amd64" => Some("amd64"),
        "arm64" | "aarch64" => Some("arm64"),
        _ => None,
    }
}

/// ターゲットプラットフォームを決定
///
/// 優先順位:
/// 1. `TARGET_PLATFORM`（空でなければそのまま採用）
/// 2. ホストアーキテクチャ（amd64 / arm64 へ正規化）
///
/// それ以外のアーキテクチャは対応するイメージが存在しないため
/// [`ResolveError::UnsupportedPlatform`] を返します。プロセスの終了は呼び出し側で行います。
pub fn detect_platform<H>(env: &EnvironmentView, host: &H) -> Result<PlatformInfo>
where
    H: HostArchitecture + ?Sized,
{
    if let Some(platform) = env.get_non_empty("TARGET_PLATFORM") {
        tracing::debug!("Target platform from TARGET_PLATFORM: {}", platform);
        return Ok(PlatformInfo {
            architecture: platform.to_string(),
            from_explicit_override: true,
        });
    }

    let machine = host.machine()?;
    match map_machine(&machine) {
        Some(architecture) => {
            tracing::debug!("Target platform from host ({}): {}", machine, architecture);
            Ok(PlatformInfo {
                architecture: architecture.to_string(),
                from_explicit_override: false,
            })
        }
        None => Err(ResolveError::UnsupportedPlatform { arch: machine }),
    }
}
