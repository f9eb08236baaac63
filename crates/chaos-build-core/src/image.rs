//! イメージ名・タグ・参照の解決
//!
//! 各設定値は次の優先順位で解決されます:
//! 1. イメージ固有の変数 `IMAGE_<NAME>_<SUFFIX>`（空文字列は未設定扱い）
//! 2. 全イメージ共通の変数 `IMAGE_<SUFFIX>`
//!
//! `<NAME>` はイメージ名を大文字化し `-` を `_` に置換したものです
//! （`chaos-mesh` → `CHAOS_MESH`）。

use crate::env::EnvironmentView;
use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// タグ未指定時のデフォルト
pub const DEFAULT_TAG: &str = "latest";
/// レジストリ未指定時のデフォルト
pub const DEFAULT_REGISTRY: &str = "ghcr.io";
/// プロジェクト（名前空間）未指定時のデフォルト
pub const DEFAULT_PROJECT: &str = "chaos-mesh";

/// `chaos-mesh` → `CHAOS_MESH`
pub fn underscore_uppercase(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}

/// イメージの論理名（例: `chaos-mesh`）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageName {
    raw: String,
    normalized: String,
}

impl ImageName {
    /// 空または空白のみの名前は [`ResolveError::InvalidName`]
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ResolveError::InvalidName(raw));
        }
        let normalized = underscore_uppercase(&raw);
        Ok(Self { raw, normalized })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// 環境変数の名前空間に使う正規化名
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// `IMAGE_<NAME>_<suffix>`
    pub fn scoped_key(&self, suffix: &str) -> String {
        format!("IMAGE_{}_{}", self.normalized, suffix)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `IMAGE_<NAME>_<suffix>` → `IMAGE_<suffix>` の順に値を解決
///
/// イメージ固有の値が未設定または空の場合は共通変数の値をそのまま返します。
/// 共通変数も空文字列や未設定でありうるため、デフォルト値の適用は呼び出し側の責務です。
pub fn resolve_env_value(name: &ImageName, suffix: &str, env: &EnvironmentView) -> Option<String> {
    let scoped_key = name.scoped_key(suffix);
    if let Some(value) = env.get_non_empty(&scoped_key) {
        tracing::debug!("{} resolved from {}", suffix, scoped_key);
        return Some(value.to_string());
    }

    let general_key = format!("IMAGE_{}", suffix);
    env.get(&general_key).map(|value| {
        tracing::debug!("{} resolved from {}", suffix, general_key);
        value.to_string()
    })
}

fn resolve_or_default(name: &ImageName, suffix: &str, env: &EnvironmentView, default: &str) -> String {
    resolve_env_value(name, suffix, env)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// イメージタグ（未設定・空なら `latest`）
pub fn compute_image_tag(name: &ImageName, env: &EnvironmentView) -> String {
    resolve_or_default(name, "TAG", env, DEFAULT_TAG)
}

/// 解決された `BUILD` の値が厳密に `"1"` の場合のみ true
pub fn is_build_enabled(name: &ImageName, env: &EnvironmentView) -> bool {
    resolve_env_value(name, "BUILD", env).as_deref() == Some("1")
}

/// レジストリホスト（未設定・空なら `ghcr.io`）
pub fn image_registry(name: &ImageName, env: &EnvironmentView) -> String {
    resolve_or_default(name, "REGISTRY", env, DEFAULT_REGISTRY)
}

/// レジストリ内の名前空間（未設定・空なら `chaos-mesh`）
pub fn image_project(name: &ImageName, env: &EnvironmentView) -> String {
    resolve_or_default(name, "PROJECT", env, DEFAULT_PROJECT)
}

/// `<registry>/<project>/<name>:<tag>`
pub fn compute_full_image_reference(name: &ImageName, env: &EnvironmentView) -> String {
    format!(
        "{}/{}/{}:{}",
        image_registry(name, env),
        image_project(name, env),
        name,
        compute_image_tag(name, env)
    )
}

/// 1回の起動で解決されたイメージ情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImage {
    pub build_enabled: bool,
    pub tag: String,
    pub full_reference: String,
}

impl ResolvedImage {
    pub fn resolve(name: &ImageName, env: &EnvironmentView) -> Self {
        let resolved = Self {
            build_enabled: is_build_enabled(name, env),
            tag: compute_image_tag(name, env),
            full_reference: compute_full_image_reference(name, env),
        };
        tracing::debug!("Resolved image {}: {:?}", name, resolved);
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvironmentView {
        pairs.iter().copied().collect()
    }

    fn name(raw: &str) -> ImageName {
        ImageName::new(raw).unwrap()
    }

    #[test]
    fn test_underscore_uppercase() {
        assert_eq!(underscore_uppercase("chaos-mesh"), "CHAOS_MESH");
        assert_eq!(underscore_uppercase("chaos-dlv"), "CHAOS_DLV");
        assert_eq!(underscore_uppercase("build-env"), "BUILD_ENV");
    }

    #[test]
    fn test_image_name_rejects_blank() {
        assert!(matches!(
            ImageName::new(""),
            Err(ResolveError::InvalidName(_))
        ));
        assert!(matches!(
            ImageName::new("   "),
            Err(ResolveError::InvalidName(_))
        ));
    }

    #[test]
    fn test_image_name_scoped_key() {
        let n = name("chaos-daemon");
        assert_eq!(n.normalized(), "CHAOS_DAEMON");
        assert_eq!(n.scoped_key("TAG"), "IMAGE_CHAOS_DAEMON_TAG");
        assert_eq!(n.to_string(), "chaos-daemon");
    }

    #[test]
    fn test_tag_from_scoped_only() {
        let e = env(&[("IMAGE_CHAOS_MESH_TAG", "v2.6.0")]);
        assert_eq!(compute_image_tag(&name("chaos-mesh"), &e), "v2.6.0");
    }

    #[test]
    fn test_tag_from_general_only() {
        let e = env(&[("IMAGE_TAG", "nightly")]);
        assert_eq!(compute_image_tag(&name("chaos-mesh"), &e), "nightly");
        assert_eq!(compute_image_tag(&name("chaos-daemon"), &e), "nightly");
    }

    #[test]
    fn test_scoped_overrides_general() {
        let e = env(&[("IMAGE_TAG", "Y"), ("IMAGE_FOO_TAG", "X")]);
        assert_eq!(compute_image_tag(&name("foo"), &e), "X");
        assert_eq!(compute_image_tag(&name("bar"), &e), "Y");
    }

    #[test]
    fn test_empty_scoped_falls_back_to_general() {
        let e = env(&[("IMAGE_TAG", "Y"), ("IMAGE_FOO_TAG", "")]);
        assert_eq!(
            resolve_env_value(&name("foo"), "TAG", &e),
            Some("Y".to_string())
        );
    }

    #[test]
    fn test_resolve_env_value_returns_general_verbatim() {
        let e = env(&[("IMAGE_TAG", "")]);
        assert_eq!(
            resolve_env_value(&name("foo"), "TAG", &e),
            Some(String::new())
        );
        assert_eq!(resolve_env_value(&name("foo"), "TAG", &env(&[])), None);
    }

    #[test]
    fn test_tag_defaults_to_latest() {
        assert_eq!(compute_image_tag(&name("chaos-mesh"), &env(&[])), "latest");
        let e = env(&[("IMAGE_TAG", "")]);
        assert_eq!(compute_image_tag(&name("chaos-mesh"), &e), "latest");
    }

    #[test]
    fn test_build_enabled_only_for_literal_one() {
        let n = name("chaos-mesh");
        assert!(is_build_enabled(&n, &env(&[("IMAGE_BUILD", "1")])));
        assert!(is_build_enabled(&n, &env(&[("IMAGE_CHAOS_MESH_BUILD", "1")])));

        for value in ["0", "", "true", "yes", " 1"] {
            assert!(
                !is_build_enabled(&n, &env(&[("IMAGE_BUILD", value)])),
                "IMAGE_BUILD={:?} should not enable build",
                value
            );
        }
        assert!(!is_build_enabled(&n, &env(&[])));
    }

    #[test]
    fn test_build_scoped_zero_overrides_general_one() {
        let e = env(&[("IMAGE_BUILD", "1"), ("IMAGE_CHAOS_MESH_BUILD", "0")]);
        assert!(!is_build_enabled(&name("chaos-mesh"), &e));
        assert!(is_build_enabled(&name("chaos-daemon"), &e));
    }

    #[test]
    fn test_full_reference_default_prefix() {
        let e = env(&[("IMAGE_TAG", "v1")]);
        let reference = compute_full_image_reference(&name("chaos-mesh"), &e);
        assert_eq!(reference, "ghcr.io/chaos-mesh/chaos-mesh:v1");
        assert!(reference.ends_with("chaos-mesh:v1"));
    }

    #[test]
    fn test_full_reference_with_registry_overrides() {
        let e = env(&[
            ("IMAGE_REGISTRY", "localhost:5000"),
            ("IMAGE_CHAOS_DASHBOARD_PROJECT", "dev"),
        ]);
        assert_eq!(
            compute_full_image_reference(&name("chaos-dashboard"), &e),
            "localhost:5000/dev/chaos-dashboard:latest"
        );
        assert_eq!(
            compute_full_image_reference(&name("chaos-mesh"), &e),
            "localhost:5000/chaos-mesh/chaos-mesh:latest"
        );
    }

    #[test]
    fn test_resolved_image() {
        let e = env(&[("IMAGE_BUILD", "1"), ("IMAGE_CHAOS_MESH_TAG", "dev")]);
        let resolved = ResolvedImage::resolve(&name("chaos-mesh"), &e);
        assert_eq!(
            resolved,
            ResolvedImage {
                build_enabled: true,
                tag: "dev".to_string(),
                full_reference: "ghcr.io/chaos-mesh/chaos-mesh:dev".to_string(),
            }
        );
    }

    #[test]
    fn test_resolved_image_serializes() {
        let resolved = ResolvedImage::resolve(&name("chaos-mesh"), &env(&[]));
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["build_enabled"], false);
        assert_eq!(json["tag"], "latest");
    }
}
