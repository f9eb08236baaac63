//! chaos-build のイメージ名・タグ・プラットフォーム解決
//!
//! 環境変数のスナップショット（[`EnvironmentView`]）とイメージの論理名
//! （[`ImageName`]）から、ビルド有無・タグ・完全なイメージ参照・
//! ターゲットプラットフォームを決定します。I/O は環境変数の読み取りと
//! ホストアーキテクチャの問い合わせのみです。

pub mod env;
pub mod error;
pub mod image;
pub mod platform;

pub use env::{EnvironmentView, FORWARDED_ENV_KEYS};
pub use error::{ResolveError, Result};
pub use image::{
    DEFAULT_PROJECT, DEFAULT_REGISTRY, DEFAULT_TAG, ImageName, ResolvedImage,
    compute_full_image_reference, compute_image_tag, image_project, image_registry,
    is_build_enabled, resolve_env_value, underscore_uppercase,
};
pub use platform::{HostArchitecture, PlatformInfo, UnameHost, detect_platform};
