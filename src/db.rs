// ==========================================
// 电商商品批量上传系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免部分模块外键开启/部分不开启
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，库/CLI/测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要每个连接单独开启
/// - busy_timeout 需要每个连接单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 包含：目录侧既有表（category/merchant/product/customer_order_product）、
/// 批量上传表（bulk_upload_batch/bulk_upload_item）与配置表（config_kv）。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS category (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS merchant (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            price INTEGER NOT NULL,
            rating INTEGER NOT NULL,
            description TEXT NOT NULL,
            manufacturer TEXT NOT NULL,
            main_image TEXT NOT NULL,
            category_id TEXT NOT NULL REFERENCES category(id),
            merchant_id TEXT NOT NULL REFERENCES merchant(id),
            in_stock INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS customer_order_product (
            id TEXT PRIMARY KEY,
            customer_order_id TEXT NOT NULL,
            product_id TEXT NOT NULL REFERENCES product(id)
        );

        CREATE TABLE IF NOT EXISTS bulk_upload_batch (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        -- product_id 为弱引用：商品删除后审计条目保留
        CREATE TABLE IF NOT EXISTS bulk_upload_item (
            id TEXT PRIMARY KEY,
            batch_id TEXT NOT NULL REFERENCES bulk_upload_batch(id),
            product_id TEXT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            price INTEGER NOT NULL,
            manufacturer TEXT,
            description TEXT,
            main_image TEXT,
            category_id TEXT NOT NULL,
            in_stock INTEGER NOT NULL,
            status TEXT NOT NULL,
            error TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_bulk_upload_item_batch
            ON bulk_upload_item(batch_id);
        CREATE INDEX IF NOT EXISTS idx_customer_order_product_product
            ON customer_order_product(product_id);
        "#,
    )
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 STOREFRONT_BULK_UPLOAD_DB_PATH
/// 2. 用户数据目录/storefront-bulk-upload/storefront.db
/// 3. 回退: ./storefront.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("STOREFRONT_BULK_UPLOAD_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./storefront.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("storefront-bulk-upload");
        // 确保目录存在；创建失败时保持回退路径
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("storefront.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        // 再次执行不应报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='bulk_upload_item'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
    }
}
