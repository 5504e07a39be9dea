// ==========================================
// 电商商品批量上传系统 - 上传配置读取接口
// ==========================================
// 职责: 定义导入层依赖的配置读取能力（与存储实现解耦）
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 单次上传允许的最大数据行数（默认值）
pub const DEFAULT_MAX_UPLOAD_ROWS: usize = 5_000;

// ==========================================
// UploadConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）
#[async_trait]
pub trait UploadConfigReader: Send + Sync {
    /// 读取单次上传允许的最大数据行数
    ///
    /// 配置缺失或非法时返回默认值
    async fn max_upload_rows(&self) -> Result<usize, Box<dyn Error>>;
}
