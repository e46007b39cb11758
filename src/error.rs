use std::fmt;

/// 应用程序错误类型
///
/// 只用于运行级别的致命错误（启动失败、会话失败）；
/// 职位和页面级别的失败由 `workflow::Flow` 表达，不走这里。
#[derive(Debug)]
pub enum AppError {
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Browser(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接调试端口失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动无头浏览器失败
    LaunchFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            BrowserError::LaunchFailed { source } => {
                write!(f, "无法启动无头浏览器: {}", source)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. } | BrowserError::LaunchFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 台账文件无法解析；原文件保持不动
    CorruptLedger {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::CorruptLedger { path, source } => {
                write!(f, "台账文件已损坏 ({}): {}，请修复或移走后重试", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::CorruptLedger { source, .. } | FileError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置值无效
    InvalidValue {
        var_name: String,
        value: String,
        expected: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue {
                var_name,
                value,
                expected,
            } => {
                write!(f, "配置 {} 的值 '{}' 无效，应为 {}", var_name, value, expected)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 便捷构造函数 ==========

impl AppError {
    pub fn browser_connection_failed(
        port: u16,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: source.into(),
        })
    }

    pub fn browser_launch_failed(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        AppError::Browser(BrowserError::LaunchFailed {
            source: source.into(),
        })
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        AppError::File(FileError::NotFound { path: path.into() })
    }

    pub fn corrupt_ledger(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::CorruptLedger {
            path: path.into(),
            source: Box::new(source),
        })
    }

    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    pub fn invalid_config(
        var_name: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            var_name: var_name.into(),
            value: value.into(),
            expected: expected.into(),
        })
    }

    /// 是否为台账损坏
    pub fn is_corrupt_ledger(&self) -> bool {
        matches!(self, AppError::File(FileError::CorruptLedger { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_chains_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::file_write_failed("applied.json", io);
        assert_eq!(
            err.to_string(),
            "文件错误: 写入文件失败 (applied.json): denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_corrupt_ledger_is_detectable() {
        let parse = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err = AppError::corrupt_ledger("applied.json", parse);
        assert!(err.is_corrupt_ledger());
        assert!(!AppError::file_not_found("x").is_corrupt_ledger());
    }
}
