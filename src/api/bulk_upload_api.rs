// ==========================================
// 电商商品批量上传系统 - 批量上传 API
// ==========================================
// 职责: 封装管理端批量上传相关功能
// 消费方: 管理端上传接口（HTTP 路由层在本仓库范围之外）
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db;
use crate::domain::bulk_upload::{BulkUploadItem, ItemUpdate, UploadBatch};
use crate::domain::types::BatchStatus;
use crate::importer::BulkUploadService;
use crate::repository::{BulkUploadRepository, BulkUploadRepositoryImpl};

/// 上传响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadApiResponse {
    /// 批次 ID
    pub batch_id: String,
    /// 源文件数据行数（表头不计）
    pub total_rows: usize,
    /// 成功建档数量
    pub success_count: usize,
    /// 失败行数量
    pub error_count: usize,
    /// 派生批次状态
    pub status: BatchStatus,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 批次汇总响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummaryResponse {
    pub batch_id: String,
    pub status: BatchStatus,
    pub total: i64,
    pub errors: i64,
    pub created: i64,
    pub updated: i64,
}

/// 批次审计条目列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemListResponse {
    pub batch_id: String,
    pub items: Vec<BulkUploadItem>,
    pub total: usize,
}

/// 批次列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchListResponse {
    pub batches: Vec<UploadBatch>,
}

/// 删除前置检查响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCheckResponse {
    pub can_delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub blocked_product_ids: Vec<String>,
}

/// 条目修正响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemUpdateResponse {
    pub updated_count: usize,
    pub items: Vec<BulkUploadItem>,
}

/// 批量上传 API
pub struct BulkUploadApi {
    db_path: String,
}

impl BulkUploadApi {
    /// 创建新的 BulkUploadApi 实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 创建仓储实例
    fn create_repo(&self) -> ApiResult<BulkUploadRepositoryImpl> {
        BulkUploadRepositoryImpl::new(&self.db_path).map_err(ApiError::from)
    }

    /// 创建 BulkUploadService 实例（仓储与配置共享同一连接）
    fn create_service(
        &self,
    ) -> ApiResult<BulkUploadService<BulkUploadRepositoryImpl, ConfigManager>> {
        let conn = db::open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let repo = BulkUploadRepositoryImpl::from_connection(Arc::clone(&conn))?;
        let config = ConfigManager::from_connection(conn)
            .map_err(|e| ApiError::InternalError(format!("创建配置管理器失败: {}", e)))?;
        Ok(BulkUploadService::new(repo, config))
    }

    /// 上传并导入一份 CSV
    ///
    /// # 参数
    /// - buffer: 上传的原始字节缓冲
    /// - merchant_id: 商户 ID（可选）
    pub async fn upload_csv(
        &self,
        buffer: &[u8],
        merchant_id: Option<&str>,
    ) -> ApiResult<UploadApiResponse> {
        if buffer.is_empty() {
            return Err(ApiError::InvalidInput("上传内容为空".to_string()));
        }

        let service = self.create_service()?;
        let report = service.import_csv_buffer(buffer, merchant_id).await?;

        Ok(UploadApiResponse {
            batch_id: report.batch_id,
            total_rows: report.total_rows,
            success_count: report.success_count,
            error_count: report.error_count,
            status: report.status,
            elapsed_ms: report.elapsed_ms,
        })
    }

    /// 查询批次汇总统计
    pub async fn get_batch_summary(&self, batch_id: &str) -> ApiResult<BatchSummaryResponse> {
        let repo = self.create_repo()?;

        let batch = repo
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("批次不存在: {}", batch_id)))?;
        let summary = repo.get_batch_summary(batch_id).await?;

        Ok(BatchSummaryResponse {
            batch_id: batch.id,
            status: batch.status,
            total: summary.total,
            errors: summary.errors,
            created: summary.created,
            updated: summary.updated,
        })
    }

    /// 查询批次的审计条目列表（按写入顺序）
    pub async fn list_batch_items(&self, batch_id: &str) -> ApiResult<BatchItemListResponse> {
        let repo = self.create_repo()?;

        let batch = repo
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("批次不存在: {}", batch_id)))?;
        let items = repo.get_items_by_batch(&batch.id).await?;

        Ok(BatchItemListResponse {
            batch_id: batch.id,
            total: items.len(),
            items,
        })
    }

    /// 查询最近的导入批次
    ///
    /// # 参数
    /// - limit: 返回记录数（限制在 1-100 之间）
    pub async fn list_recent_batches(&self, limit: usize) -> ApiResult<BatchListResponse> {
        let repo = self.create_repo()?;

        let limit = limit.clamp(1, 100);
        let batches = repo.get_recent_batches(limit).await?;

        Ok(BatchListResponse { batches })
    }

    /// 检查批次创建的商品是否可以安全删除
    ///
    /// 仅为前置检查，不执行删除；被订单引用的商品 ID 随响应返回
    pub async fn check_batch_deletable(&self, batch_id: &str) -> ApiResult<DeleteCheckResponse> {
        let repo = self.create_repo()?;
        let check = repo.can_delete_products_for_batch(batch_id).await?;

        Ok(DeleteCheckResponse {
            can_delete: check.can_delete,
            reason: check.reason,
            blocked_product_ids: check.blocked_product_ids,
        })
    }

    /// 对批次内的审计条目应用价格/上下架修正
    ///
    /// # 参数
    /// - batch_id: 批次 ID
    /// - updates: 修正列表（不属于该批次的条目静默跳过）
    pub async fn update_batch_items(
        &self,
        batch_id: &str,
        updates: Vec<ItemUpdate>,
    ) -> ApiResult<ItemUpdateResponse> {
        if updates.is_empty() {
            return Err(ApiError::InvalidInput("修正列表不能为空".to_string()));
        }

        let repo = self.create_repo()?;
        let items = repo.apply_item_updates(batch_id, updates).await?;

        Ok(ItemUpdateResponse {
            updated_count: items.len(),
            items,
        })
    }
}
