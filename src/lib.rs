// ==========================================
// 电商商品批量上传系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 商家后台批量商品导入与审计追踪
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - CSV 解析与批量落库
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchStatus, ItemStatus, MerchantStatus};

// 领域实体
pub use domain::{
    BatchOutcome, BatchSummary, BulkUploadItem, Category, DeleteCheck, ItemUpdate, NewProduct,
    RowError, UploadBatch, UploadReport, ValidatedRow,
};

// 导入层
pub use importer::{BulkUploadService, CsvDecoder, ImportError, ImportResult};

// 仓储层
pub use repository::{BulkUploadRepository, BulkUploadRepositoryImpl};

// API
pub use api::BulkUploadApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "电商商品批量上传系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
