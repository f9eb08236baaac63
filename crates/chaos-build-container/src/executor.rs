use crate::error::{ContainerError, Result};
use std::fmt;
use std::process::Command;

/// 実行するコマンドライン（プログラムと引数）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `flag value` のペアを追加
    pub fn opt(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// シェル上で1引数として解釈されるようにクォート（必要な場合のみ）
pub(crate) fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// シェルに貼り付けられる形式で表示
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// コマンド実行のトレイト
pub trait CommandExecutor {
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

/// 子プロセスとして実行（標準入出力は継承）
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        tracing::debug!("Running: {}", invocation);

        let status = invocation
            .to_command()
            .status()
            .map_err(|source| ContainerError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ContainerError::CommandFailed {
                command: invocation.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}
