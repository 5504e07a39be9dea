// ==========================================
// 电商商品批量上传系统 - 数据仓储层
// ==========================================
// 职责: 数据访问接口与 SQLite 实现
// 红线: Repository 只做数据 CRUD 与事务编排，校验规则归导入层
// ==========================================

pub mod bulk_upload_repo;
pub mod bulk_upload_repo_impl;
pub mod error;

pub use bulk_upload_repo::BulkUploadRepository;
pub use bulk_upload_repo_impl::BulkUploadRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
