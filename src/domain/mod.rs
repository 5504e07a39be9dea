// ==========================================
// 电商商品批量上传系统 - 领域层
// ==========================================
// 职责: 实体定义、状态枚举，不含任何数据访问逻辑
// ==========================================

pub mod bulk_upload;
pub mod catalog;
pub mod types;

pub use bulk_upload::{
    BatchOutcome, BatchSummary, BulkUploadItem, DeleteCheck, ItemUpdate, RowError, UploadBatch,
    UploadReport, ValidatedRow,
};
pub use catalog::{Category, NewProduct};
pub use types::{BatchStatus, ItemStatus, MerchantStatus};
