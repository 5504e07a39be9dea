// ==========================================
// 电商商品批量上传系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::upload_config_trait::{UploadConfigReader, DEFAULT_MAX_UPLOAD_ROWS};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 行数上限配置键（global scope）
const KEY_MAX_UPLOAD_ROWS: &str = "max_upload_rows";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（INSERT OR REPLACE）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl UploadConfigReader for ConfigManager {
    async fn max_upload_rows(&self) -> Result<usize, Box<dyn Error>> {
        let value = self
            .get_config_value(KEY_MAX_UPLOAD_ROWS)?
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_ROWS);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use tempfile::NamedTempFile;

    fn create_config_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        {
            let conn = Connection::open(&db_path).unwrap();
            init_schema(&conn).unwrap();
        }
        let config = ConfigManager::new(&db_path).unwrap();
        (temp_file, config)
    }

    #[tokio::test]
    async fn test_max_upload_rows_default() {
        let (_temp, config) = create_config_manager();
        assert_eq!(config.max_upload_rows().await.unwrap(), DEFAULT_MAX_UPLOAD_ROWS);
    }

    #[tokio::test]
    async fn test_max_upload_rows_from_config_kv() {
        let (_temp, config) = create_config_manager();
        config.set_global_config_value("max_upload_rows", "100").unwrap();
        assert_eq!(config.max_upload_rows().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_max_upload_rows_invalid_value_falls_back() {
        let (_temp, config) = create_config_manager();
        config.set_global_config_value("max_upload_rows", "abc").unwrap();
        assert_eq!(config.max_upload_rows().await.unwrap(), DEFAULT_MAX_UPLOAD_ROWS);

        config.set_global_config_value("max_upload_rows", "0").unwrap();
        assert_eq!(config.max_upload_rows().await.unwrap(), DEFAULT_MAX_UPLOAD_ROWS);
    }
}
