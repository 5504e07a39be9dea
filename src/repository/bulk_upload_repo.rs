// ==========================================
// 电商商品批量上传系统 - 批量上传 Repository Trait
// ==========================================
// 职责: 定义批量上传相关数据访问接口（不包含校验规则）
// 红线: 行级失败在事务内转为 ERROR 审计条目，不让批次整体失败
// ==========================================

use crate::domain::bulk_upload::{
    BatchOutcome, BatchSummary, BulkUploadItem, DeleteCheck, ItemUpdate, RowError, UploadBatch,
    ValidatedRow,
};
use crate::domain::types::BatchStatus;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// BulkUploadRepository Trait
// ==========================================
// 实现者: BulkUploadRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait BulkUploadRepository: Send + Sync {
    // ===== 批次管理 =====

    /// 插入导入批次记录（初始状态 PENDING）
    async fn insert_batch(&self, batch: UploadBatch) -> RepositoryResult<()>;

    /// 回写派生批次状态
    ///
    /// 调用方必须传入 BatchStatus::from_counts 的计算结果
    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> RepositoryResult<()>;

    /// 查询单个批次
    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>>;

    /// 查询最近的导入批次（按创建时间倒序）
    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<UploadBatch>>;

    // ===== 批量落库（事务化）=====

    /// 在单个事务内为一个批次创建商品与审计条目
    ///
    /// # 流程
    /// 1. 解析商户（显式传入，否则取创建最早的 ACTIVE 商户；无则整体失败）
    /// 2. 解析类目，未命中的行转为 ERROR 审计条目
    /// 3. 批量建档商品（初始评分固定为 5）
    /// 4. 按 slug 回查商品主键并逐行配对
    /// 5. 商品批量建档整体失败时，回滚商品写入并将这些行降级为 ERROR 条目
    /// 6. 追加校验失败行的 ERROR 条目（消息带原始行号前缀）
    /// 7. 批量插入全部审计条目
    ///
    /// # 返回
    /// - Ok(BatchOutcome): 成功/失败计数（成功 = 类目解析且建档均成功）
    async fn create_batch_with_items(
        &self,
        batch_id: &str,
        valid_rows: Vec<ValidatedRow>,
        error_rows: Vec<RowError>,
        merchant_id: Option<&str>,
    ) -> RepositoryResult<BatchOutcome>;

    // ===== 审计条目查询 =====

    /// 查询批次的全部审计条目（按写入顺序）
    async fn get_items_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<BulkUploadItem>>;

    /// 批次汇总统计（总数/失败/已创建/已修正）
    async fn get_batch_summary(&self, batch_id: &str) -> RepositoryResult<BatchSummary>;

    // ===== 删除前置检查 =====

    /// 检查批次创建的商品是否可以安全删除
    ///
    /// 任一商品被订单行引用即不可删除；仅做检查，不执行删除
    async fn can_delete_products_for_batch(&self, batch_id: &str)
        -> RepositoryResult<DeleteCheck>;

    // ===== 导入后修正 =====

    /// 对批次内的审计条目应用价格/上下架修正
    ///
    /// - price 四舍五入为整数；in_stock 归一为 0/1
    /// - 关联商品存在时同步更新
    /// - 条目标记为 UPDATED 并清除错误信息
    /// - 不属于该批次的条目静默跳过
    ///
    /// # 返回
    /// - Ok(Vec<BulkUploadItem>): 实际更新后的条目
    async fn apply_item_updates(
        &self,
        batch_id: &str,
        updates: Vec<ItemUpdate>,
    ) -> RepositoryResult<Vec<BulkUploadItem>>;
}
