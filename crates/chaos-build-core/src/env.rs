//! 環境変数のスナップショット

use std::collections::BTreeMap;

/// ビルド・実行時にコンテナへ引き渡す環境変数
///
/// `build-image` では `--build-arg`、`run` では `--env` として渡されます。
/// スナップショットに存在するものだけが対象です。
pub const FORWARDED_ENV_KEYS: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "http_proxy",
    "https_proxy",
    "no_proxy",
    "GOPROXY",
    "UI",
    "LDFLAGS",
    "CRATES_MIRROR",
    "TARGET_PLATFORM",
    "GO_BUILD_CACHE",
    "YARN_BUILD_CACHE",
    "GITHUB_TOKEN",
];

/// 起動時点の環境変数を保持する読み取り専用ビュー
///
/// プロセス環境を直接参照せず、このビューを各関数に渡すことで
/// 解決処理を純粋関数として扱えるようにしています。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentView {
    vars: BTreeMap<String, String>,
}

impl EnvironmentView {
    /// 空のビューを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のプロセス環境をスナップショット
    ///
    /// UTF-8 として解釈できないキー・値は読み飛ばします。
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                (Err(entry), _) | (_, Err(entry)) => {
                    tracing::debug!("Skipping non UTF-8 environment entry: {:?}", entry);
                    None
                }
            })
            .collect();
        Self { vars }
    }

    /// 値を取得（空文字列もそのまま返す）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// 空でない値のみ取得
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// [`FORWARDED_ENV_KEYS`] のうち設定されているものを `(key, value)` で列挙
    pub fn forwarded(&self) -> impl Iterator<Item = (&str, &str)> {
        FORWARDED_ENV_KEYS
            .iter()
            .filter_map(move |key| self.get(key).map(|value| (*key, value)))
    }
}

impl<K, V> FromIterator<(K, V)> for EnvironmentView
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_get_non_empty() {
        let env: EnvironmentView = [("IMAGE_TAG", "v1"), ("IMAGE_BUILD", "")]
            .into_iter()
            .collect();

        assert_eq!(env.get("IMAGE_TAG"), Some("v1"));
        assert_eq!(env.get("IMAGE_BUILD"), Some(""));
        assert_eq!(env.get_non_empty("IMAGE_BUILD"), None);
        assert_eq!(env.get("MISSING"), None);
        assert!(env.contains("IMAGE_BUILD"));
    }

    #[test]
    fn test_forwarded_keeps_list_order() {
        let env: EnvironmentView = [
            ("GOPROXY", "https://goproxy.io"),
            ("HTTP_PROXY", "http://proxy:3128"),
            ("UNRELATED", "x"),
        ]
        .into_iter()
        .collect();

        let forwarded: Vec<_> = env.forwarded().collect();
        assert_eq!(
            forwarded,
            vec![
                ("HTTP_PROXY", "http://proxy:3128"),
                ("GOPROXY", "https://goproxy.io"),
            ]
        );
    }

    #[test]
    fn test_from_process_snapshot() {
        temp_env::with_var("CHAOS_BUILD_SNAPSHOT_TEST", Some("snap"), || {
            let env = EnvironmentView::from_process();
            assert_eq!(env.get("CHAOS_BUILD_SNAPSHOT_TEST"), Some("snap"));
        });
    }
}
