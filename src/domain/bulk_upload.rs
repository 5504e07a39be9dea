// ==========================================
// 电商商品批量上传系统 - 批量上传领域模型
// ==========================================
// 用途: 导入管道中间产物 + 批次/审计条目持久化实体
// ==========================================

use crate::domain::types::{BatchStatus, ItemStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ValidatedRow - 校验通过的行
// ==========================================
// 生命周期: 仅在导入流程内，校验后不再变更
// 注意: price 已按固定系数 90 换算为整数（业务换算规则，非分转换）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub title: String,
    pub slug: String,
    pub price: i64,
    pub category_id: String, // 可能是类目 ID，也可能是类目名（落库前解析）
    pub in_stock: i64,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub main_image: Option<String>,
}

// ==========================================
// RowError - 行校验失败
// ==========================================
// index 为源文件中的数据行位置（0 起，表头不计）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowError {
    pub index: usize,
    pub error: String,
}

// ==========================================
// UploadBatch - 导入批次
// ==========================================
// 对齐: bulk_upload_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadBatch {
    pub id: String,
    pub status: BatchStatus, // 派生状态，见 BatchStatus::from_counts
    pub created_at: DateTime<Utc>,
}

// ==========================================
// BulkUploadItem - 审计条目
// ==========================================
// 不变式: 每个源数据行恰好产生一条审计条目，无论成败
// 对齐: bulk_upload_item 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUploadItem {
    pub id: String,
    pub batch_id: String,
    pub product_id: Option<String>, // 弱引用：创建成功才有值
    pub title: String,
    pub slug: String,
    pub price: i64,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub main_image: Option<String>,
    pub category_id: String, // 成功行为已解析 ID，失败行保留原始提交值
    pub in_stock: i64,
    pub status: ItemStatus,
    pub error: Option<String>, // 截断后的失败原因
}

// ==========================================
// BatchOutcome - 批量落库结果
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub error_count: usize,
}

// ==========================================
// BatchSummary - 批次汇总统计
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: i64,
    pub errors: i64,
    pub created: i64,
    pub updated: i64,
}

// ==========================================
// DeleteCheck - 批次商品可删除性检查结果
// ==========================================
// 仅为前置检查，不执行删除；以数据而非错误返回
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCheck {
    pub can_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub blocked_product_ids: Vec<String>,
}

// ==========================================
// ItemUpdate - 审计条目修正请求
// ==========================================
// in_stock 在此处语义为 0/1 上下架标志，区别于导入时的库存数量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub item_id: String,
    pub price: f64, // 落库前四舍五入为整数
    pub in_stock: i64,
}

// ==========================================
// UploadReport - 单次导入的调用方报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub batch_id: String,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub status: BatchStatus,
    pub elapsed_ms: i64,
}
