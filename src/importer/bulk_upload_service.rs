// ==========================================
// 电商商品批量上传系统 - 批量上传服务
// ==========================================
// 职责: 整合导入流程，从上传缓冲到数据库
// 流程: 解析 → 限流 → 校验分流 → 建批次 → 事务落库 → 派生状态
// ==========================================

use crate::config::UploadConfigReader;
use crate::domain::bulk_upload::{RowError, UploadBatch, UploadReport, ValidatedRow};
use crate::domain::types::BatchStatus;
use crate::importer::csv_decoder::CsvDecoder;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_validator::validate_row;
use crate::repository::BulkUploadRepository;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// BulkUploadService - 批量上传服务
// ==========================================
pub struct BulkUploadService<R, C>
where
    R: BulkUploadRepository,
    C: UploadConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,
}

impl<R, C> BulkUploadService<R, C>
where
    R: BulkUploadRepository,
    C: UploadConfigReader,
{
    /// 创建新的 BulkUploadService 实例
    ///
    /// # 参数
    /// - repo: 批量上传数据仓储
    /// - config: 配置读取器
    pub fn new(repo: R, config: C) -> Self {
        Self { repo, config }
    }

    /// 从上传的 CSV 缓冲执行一次完整导入
    ///
    /// # 参数
    /// - buffer: 上传的原始字节缓冲
    /// - merchant_id: 商户 ID（缺省时取创建最早的 ACTIVE 商户）
    ///
    /// # 返回
    /// - Ok(UploadReport): 批次 ID、计数与派生状态
    /// - Err(ImportError): 解析失败/行数超限/商户缺失等致命错误
    pub async fn import_csv_buffer(
        &self,
        buffer: &[u8],
        merchant_id: Option<&str>,
    ) -> ImportResult<UploadReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        info!(batch_id = %batch_id, bytes = buffer.len(), "开始批量商品导入");

        // === 步骤 1: 解析 CSV ===
        debug!("步骤 1: 解析 CSV");
        let rows = CsvDecoder.decode(buffer)?;
        let total_rows = rows.len();
        info!(total_rows = total_rows, "CSV 解析完成");

        // === 步骤 2: 行数上限检查 ===
        let max_rows = self
            .config
            .max_upload_rows()
            .await
            .map_err(|e| ImportError::ConfigReadError(e.to_string()))?;
        if total_rows > max_rows {
            warn!(total_rows = total_rows, limit = max_rows, "上传行数超限，拒绝导入");
            return Err(ImportError::RowLimitExceeded {
                limit: max_rows,
                actual: total_rows,
            });
        }

        // === 步骤 3: 逐行校验并分流 ===
        debug!("步骤 3: 逐行校验");
        let mut valid_rows: Vec<ValidatedRow> = Vec::new();
        let mut error_rows: Vec<RowError> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            match validate_row(row, idx) {
                Ok(clean) => valid_rows.push(clean),
                Err(err) => {
                    warn!(row = idx, error = %err.error, "行校验失败");
                    error_rows.push(err);
                }
            }
        }
        info!(
            valid = valid_rows.len(),
            invalid = error_rows.len(),
            "行校验完成"
        );

        // === 步骤 4: 创建批次记录（PENDING）===
        debug!("步骤 4: 创建批次记录");
        self.repo
            .insert_batch(UploadBatch {
                id: batch_id.clone(),
                status: BatchStatus::Pending,
                created_at: Utc::now(),
            })
            .await?;

        // === 步骤 5: 事务内批量落库 ===
        debug!("步骤 5: 批量落库");
        let outcome = self
            .repo
            .create_batch_with_items(&batch_id, valid_rows, error_rows, merchant_id)
            .await?;

        // === 步骤 6: 回写派生状态 ===
        let status = BatchStatus::from_counts(outcome.success_count, outcome.error_count);
        self.repo.update_batch_status(&batch_id, status).await?;

        let elapsed = start_time.elapsed();
        info!(
            batch_id = %batch_id,
            total = total_rows,
            success = outcome.success_count,
            errors = outcome.error_count,
            status = %status,
            elapsed_ms = elapsed.as_millis() as i64,
            "批量商品导入完成"
        );

        Ok(UploadReport {
            batch_id,
            total_rows,
            success_count: outcome.success_count,
            error_count: outcome.error_count,
            status,
            elapsed_ms: elapsed.as_millis() as i64,
        })
    }
}
