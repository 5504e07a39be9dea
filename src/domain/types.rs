// ==========================================
// 电商商品批量上传系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
// 红线: 状态永远由成功/失败计数派生，调用方不得直接指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Pending,   // 尚未处理任何行
    Completed, // 全部成功
    Partial,   // 部分成功
    Failed,    // 全部失败
}

impl BatchStatus {
    /// 由成功/失败计数派生批次状态
    pub fn from_counts(success_count: usize, error_count: usize) -> Self {
        if success_count > 0 && error_count == 0 {
            BatchStatus::Completed
        } else if success_count > 0 && error_count > 0 {
            BatchStatus::Partial
        } else if error_count > 0 {
            BatchStatus::Failed
        } else {
            BatchStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "PENDING",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Partial => "PARTIAL",
            BatchStatus::Failed => "FAILED",
        }
    }

    /// 从数据库字符串解析（未知值回退为 PENDING）
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "COMPLETED" => BatchStatus::Completed,
            "PARTIAL" => BatchStatus::Partial,
            "FAILED" => BatchStatus::Failed,
            _ => BatchStatus::Pending,
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 审计条目状态 (Item Status)
// ==========================================
// ERROR: 校验/类目/建档任一环节失败
// CREATED: 商品创建成功
// UPDATED: 导入后经人工修正
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Error,
    Created,
    Updated,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Error => "ERROR",
            ItemStatus::Created => "CREATED",
            ItemStatus::Updated => "UPDATED",
        }
    }

    /// 从数据库字符串解析（未知值回退为 ERROR）
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "CREATED" => ItemStatus::Created,
            "UPDATED" => ItemStatus::Updated,
            _ => ItemStatus::Error,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 商户状态 (Merchant Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MerchantStatus {
    Active,
    Inactive,
}

impl MerchantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantStatus::Active => "ACTIVE",
            MerchantStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for MerchantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts_completed() {
        assert_eq!(BatchStatus::from_counts(3, 0), BatchStatus::Completed);
    }

    #[test]
    fn test_from_counts_partial() {
        assert_eq!(BatchStatus::from_counts(2, 1), BatchStatus::Partial);
    }

    #[test]
    fn test_from_counts_failed() {
        assert_eq!(BatchStatus::from_counts(0, 5), BatchStatus::Failed);
    }

    #[test]
    fn test_from_counts_pending() {
        assert_eq!(BatchStatus::from_counts(0, 0), BatchStatus::Pending);
    }

    #[test]
    fn test_batch_status_parse_roundtrip() {
        for status in [
            BatchStatus::Pending,
            BatchStatus::Completed,
            BatchStatus::Partial,
            BatchStatus::Failed,
        ] {
            assert_eq!(BatchStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_item_status_parse_unknown_falls_back_to_error() {
        assert_eq!(ItemStatus::parse("???"), ItemStatus::Error);
    }
}
