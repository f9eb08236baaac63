use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid image name: {0:?}")]
    InvalidName(String),

    #[error("unsupported architecture '{arch}'; run on amd64 or arm64")]
    UnsupportedPlatform { arch: String },

    #[error("failed to query host architecture: {0}")]
    HostQuery(String),
}

impl ResolveError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            ResolveError::UnsupportedPlatform { arch } => {
                format!(
                    "unsupported architecture; run on amd64 or arm64 (host: {})\n\
                     \n\
                     ヒント:\n  \
                     • amd64 または arm64 のマシンで実行してください\n  \
                     • TARGET_PLATFORM=amd64 のように明示的に指定することもできます",
                    arch
                )
            }
            ResolveError::InvalidName(name) => {
                format!(
                    "イメージ名が不正です: {:?}\n\
                     \n\
                     空でないイメージ名（例: chaos-mesh）を指定してください。",
                    name
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
