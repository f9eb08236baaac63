use chaos_build_core::ResolveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "{program} を起動できません: {source}\n\nヒント:\n  • {program} がインストールされているか確認してください\n  • --engine または CHAOS_BUILD_ENGINE で別のエンジンを指定できます"
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed ({}): {command}", exit_label(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ContainerError {
    /// 子プロセスの終了コード（あれば）
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ContainerError::CommandFailed { code, .. } => *code,
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ContainerError::Resolve(e) => e.user_message(),
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;
