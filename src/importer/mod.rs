// ==========================================
// 电商商品批量上传系统 - 导入层
// ==========================================
// 职责: CSV 上传数据的解析、校验、类目解析与批量落库编排
// 流程: 解析 → 校验 → 分流 → 事务落库 → 派生状态
// ==========================================

// 模块声明
pub mod bulk_upload_service;
pub mod category_resolver;
pub mod csv_decoder;
pub mod error;
pub mod row_validator;

// 重导出核心类型
pub use bulk_upload_service::BulkUploadService;
pub use category_resolver::CategoryLookup;
pub use csv_decoder::CsvDecoder;
pub use error::{truncate_error, ImportError, ImportResult, MAX_STORED_ERROR_LEN};
pub use row_validator::{validate_row, PRICE_SCALE_DIVISOR};
