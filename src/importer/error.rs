// ==========================================
// 电商商品批量上传系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 行级失败不升级为批次失败，只有前置条件与解析失败才是致命错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 落库错误消息长度上限（字符）
///
/// 超长消息截断为 497 个字符 + "..."，恰好 500
pub const MAX_STORED_ERROR_LEN: usize = 500;

/// 截断落库错误消息
pub fn truncate_error(message: &str) -> String {
    if message.chars().count() > MAX_STORED_ERROR_LEN {
        let head: String = message.chars().take(MAX_STORED_ERROR_LEN - 3).collect();
        format!("{}...", head)
    } else {
        message.to_string()
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入解析错误（整次上传致命）=====
    #[error("CSV 解析失败: {0}")]
    MalformedInput(String),

    #[error("上传行数超限: {actual} 行（上限 {limit} 行）")]
    RowLimitExceeded { limit: usize, actual: usize },

    // ===== 前置条件错误（整次落库致命）=====
    #[error("无可用商户，请先创建商户")]
    NoMerchantAvailable,

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    ConfigReadError(String),

    // ===== 数据库错误 =====
    #[error("数据库操作失败: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::MalformedInput(err.to_string())
    }
}

// 实现 From<RepositoryError>
// 商户缺失是业务前置条件失败，单独映射；其余归入数据库错误
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NoActiveMerchant => ImportError::NoMerchantAvailable,
            other => ImportError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
