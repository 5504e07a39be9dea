// ==========================================
// 电商商品批量上传系统 - 批量上传 Repository 实现
// ==========================================
// 存储: SQLite（rusqlite），单连接 + 互斥锁
// 事务: create_batch_with_items 全程单事务；
//       商品批量写入包在 savepoint 内，失败只回滚商品，审计条目仍提交
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::bulk_upload::{
    BatchOutcome, BatchSummary, BulkUploadItem, DeleteCheck, ItemUpdate, RowError, UploadBatch,
    ValidatedRow,
};
use crate::domain::catalog::{Category, NewProduct};
use crate::domain::types::{BatchStatus, ItemStatus, MerchantStatus};
use crate::importer::category_resolver::CategoryLookup;
use crate::importer::error::truncate_error;
use crate::repository::bulk_upload_repo::BulkUploadRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

/// 商品建档时的初始评分
const INITIAL_PRODUCT_RATING: i64 = 5;

// ==========================================
// BulkUploadRepositoryImpl
// ==========================================
pub struct BulkUploadRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl BulkUploadRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)
                .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        }

        Ok(Self { conn })
    }

    fn lock_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 事务内辅助函数 =====
    // 参数取 &Connection，Transaction 与 Savepoint 均可传入

    /// 查询创建最早的 ACTIVE 商户
    fn find_default_merchant_tx(conn: &Connection) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            "SELECT id FROM merchant WHERE status = ?1 ORDER BY created_at ASC LIMIT 1",
            params![MerchantStatus::Active.as_str()],
            |row| row.get(0),
        )
        .optional()
    }

    /// 按 ID 或名称（大小写不敏感）一次性查询候选类目
    fn find_categories_tx(conn: &Connection, values: &[String]) -> rusqlite::Result<Vec<Category>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "SELECT id, name FROM category WHERE id IN ({0}) OR LOWER(name) IN ({1})",
            placeholders, placeholders
        );

        let lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter().chain(lowered.iter())), |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect()
    }

    /// 批量插入商品（主键在此生成）
    fn insert_products_tx(conn: &Connection, products: &[NewProduct]) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO product (
                id, slug, title, price, rating, description,
                manufacturer, main_image, category_id, merchant_id, in_stock
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )?;

        let mut count = 0;
        for product in products {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                product.slug,
                product.title,
                product.price,
                product.rating,
                product.description,
                product.manufacturer,
                product.main_image,
                product.category_id,
                product.merchant_id,
                product.in_stock,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    /// 按 slug 回查商品主键（slug -> id）
    ///
    /// 批量插入不返回逐行主键，落库后按 slug 回查配对；
    /// 同批次出现重复 slug 时无法区分，由 slug 唯一约束兜底
    fn find_products_by_slugs_tx(
        conn: &Connection,
        slugs: &[String],
    ) -> rusqlite::Result<HashMap<String, String>> {
        if slugs.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; slugs.len()].join(", ");
        let sql = format!(
            "SELECT id, slug FROM product WHERE slug IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(slugs.iter()), |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(0)?))
        })?;

        rows.collect()
    }

    /// 批量插入审计条目
    fn insert_items_tx(conn: &Connection, items: &[BulkUploadItem]) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare(
            r#"
            INSERT INTO bulk_upload_item (
                id, batch_id, product_id, title, slug, price,
                manufacturer, description, main_image, category_id,
                in_stock, status, error
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )?;

        let mut count = 0;
        for item in items {
            stmt.execute(params![
                item.id,
                item.batch_id,
                item.product_id,
                item.title,
                item.slug,
                item.price,
                item.manufacturer,
                item.description,
                item.main_image,
                item.category_id,
                item.in_stock,
                item.status.as_str(),
                item.error,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn count_items_tx(
        conn: &Connection,
        batch_id: &str,
        status: Option<ItemStatus>,
    ) -> rusqlite::Result<i64> {
        match status {
            Some(status) => conn.query_row(
                "SELECT COUNT(*) FROM bulk_upload_item WHERE batch_id = ?1 AND status = ?2",
                params![batch_id, status.as_str()],
                |row| row.get(0),
            ),
            None => conn.query_row(
                "SELECT COUNT(*) FROM bulk_upload_item WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            ),
        }
    }

    fn get_item_tx(conn: &Connection, item_id: &str) -> rusqlite::Result<Option<BulkUploadItem>> {
        conn.query_row(
            r#"
            SELECT id, batch_id, product_id, title, slug, price,
                   manufacturer, description, main_image, category_id,
                   in_stock, status, error
            FROM bulk_upload_item WHERE id = ?1
            "#,
            params![item_id],
            Self::map_item_row,
        )
        .optional()
    }

    fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BulkUploadItem> {
        let status: String = row.get(11)?;
        Ok(BulkUploadItem {
            id: row.get(0)?,
            batch_id: row.get(1)?,
            product_id: row.get(2)?,
            title: row.get(3)?,
            slug: row.get(4)?,
            price: row.get(5)?,
            manufacturer: row.get(6)?,
            description: row.get(7)?,
            main_image: row.get(8)?,
            category_id: row.get(9)?,
            in_stock: row.get(10)?,
            status: ItemStatus::parse(&status),
            error: row.get(12)?,
        })
    }

    /// 由校验通过的行构造审计条目
    fn item_from_row(
        batch_id: &str,
        row: &ValidatedRow,
        category_id: String,
        product_id: Option<String>,
        status: ItemStatus,
        error: Option<String>,
    ) -> BulkUploadItem {
        BulkUploadItem {
            id: Uuid::new_v4().to_string(),
            batch_id: batch_id.to_string(),
            product_id,
            title: row.title.clone(),
            slug: row.slug.clone(),
            price: row.price,
            manufacturer: row.manufacturer.clone(),
            description: row.description.clone(),
            main_image: row.main_image.clone(),
            category_id,
            in_stock: row.in_stock,
            status,
            error,
        }
    }
}

#[async_trait]
impl BulkUploadRepository for BulkUploadRepositoryImpl {
    async fn insert_batch(&self, batch: UploadBatch) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO bulk_upload_batch (id, status, created_at) VALUES (?1, ?2, ?3)",
            params![batch.id, batch.status.as_str(), batch.created_at],
        )?;
        Ok(())
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> RepositoryResult<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE bulk_upload_batch SET status = ?1 WHERE id = ?2",
            params![status.as_str(), batch_id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "bulk_upload_batch".to_string(),
                id: batch_id.to_string(),
            });
        }
        Ok(())
    }

    async fn get_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>> {
        let conn = self.lock_conn()?;
        let batch = conn
            .query_row(
                "SELECT id, status, created_at FROM bulk_upload_batch WHERE id = ?1",
                params![batch_id],
                |row| {
                    let status: String = row.get(1)?;
                    Ok(UploadBatch {
                        id: row.get(0)?,
                        status: BatchStatus::parse(&status),
                        created_at: row.get::<_, DateTime<Utc>>(2)?,
                    })
                },
            )
            .optional()?;
        Ok(batch)
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<UploadBatch>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, status, created_at FROM bulk_upload_batch
             ORDER BY created_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let status: String = row.get(1)?;
            Ok(UploadBatch {
                id: row.get(0)?,
                status: BatchStatus::parse(&status),
                created_at: row.get::<_, DateTime<Utc>>(2)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn create_batch_with_items(
        &self,
        batch_id: &str,
        valid_rows: Vec<ValidatedRow>,
        error_rows: Vec<RowError>,
        merchant_id: Option<&str>,
    ) -> RepositoryResult<BatchOutcome> {
        let mut conn = self.lock_conn()?;
        let mut tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // === 步骤 1: 解析商户 ===
        let merchant_id = match merchant_id {
            Some(id) => id.to_string(),
            None => Self::find_default_merchant_tx(&tx)?
                .ok_or(RepositoryError::NoActiveMerchant)?,
        };

        // === 步骤 2: 解析类目（去重后一次查询，构建双键查找表）===
        let mut distinct_refs: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for row in &valid_rows {
            if seen.insert(row.category_id.clone()) {
                distinct_refs.push(row.category_id.clone());
            }
        }
        let categories = Self::find_categories_tx(&tx, &distinct_refs)?;
        let lookup = CategoryLookup::new(&categories);

        let mut items: Vec<BulkUploadItem> = Vec::new();
        let mut success = 0usize;
        let mut failed = 0usize;

        // 类目未命中的行立刻转为 ERROR 条目，其余进入建档队列
        let mut resolved_rows: Vec<(ValidatedRow, String)> = Vec::new();
        for row in valid_rows {
            match lookup.resolve(&row.category_id) {
                Some(resolved) => {
                    let resolved = resolved.to_string();
                    resolved_rows.push((row, resolved));
                }
                None => {
                    let message =
                        truncate_error(&format!("Category not found: {}", row.category_id));
                    let raw_category = row.category_id.clone();
                    items.push(Self::item_from_row(
                        batch_id,
                        &row,
                        raw_category,
                        None,
                        ItemStatus::Error,
                        Some(message),
                    ));
                    failed += 1;
                }
            }
        }

        // === 步骤 3/4/5: 商品批量建档 + slug 回查配对 ===
        if !resolved_rows.is_empty() {
            let products: Vec<NewProduct> = resolved_rows
                .iter()
                .map(|(row, resolved)| NewProduct {
                    title: row.title.clone(),
                    slug: row.slug.clone(),
                    price: row.price,
                    rating: INITIAL_PRODUCT_RATING,
                    description: row.description.clone().unwrap_or_default(),
                    manufacturer: row.manufacturer.clone().unwrap_or_default(),
                    main_image: row.main_image.clone().unwrap_or_default(),
                    category_id: resolved.clone(),
                    merchant_id: merchant_id.clone(),
                    in_stock: row.in_stock,
                })
                .collect();

            // 商品写入包在 savepoint 内：整体失败只回滚商品写入
            let insert_result = {
                let sp = tx
                    .savepoint()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                match Self::insert_products_tx(&sp, &products) {
                    Ok(count) => sp.commit().map(|_| count),
                    Err(e) => Err(e),
                }
            };

            match insert_result {
                Ok(_) => {
                    let slugs: Vec<String> = resolved_rows
                        .iter()
                        .map(|(row, _)| row.slug.clone())
                        .collect();
                    let created_by_slug = Self::find_products_by_slugs_tx(&tx, &slugs)?;

                    for (row, resolved) in &resolved_rows {
                        let product_id = created_by_slug.get(&row.slug).cloned();
                        let (status, error) = match product_id {
                            Some(_) => (ItemStatus::Created, None),
                            None => (
                                ItemStatus::Error,
                                Some(truncate_error("Product creation failed")),
                            ),
                        };
                        if status == ItemStatus::Created {
                            success += 1;
                        } else {
                            failed += 1;
                        }
                        items.push(Self::item_from_row(
                            batch_id,
                            row,
                            resolved.clone(),
                            product_id,
                            status,
                            error,
                        ));
                    }
                }
                Err(e) => {
                    // 批量建档整体失败：降级为行级错误记录，保留审计痕迹
                    warn!(
                        batch_id = %batch_id,
                        error = %e,
                        "商品批量建档失败，降级为行级错误记录"
                    );
                    let message = truncate_error(&e.to_string());
                    for (row, resolved) in &resolved_rows {
                        items.push(Self::item_from_row(
                            batch_id,
                            row,
                            resolved.clone(),
                            None,
                            ItemStatus::Error,
                            Some(message.clone()),
                        ));
                        failed += 1;
                    }
                }
            }
        }

        // === 步骤 6: 追加校验失败行（消息带原始行号前缀）===
        for err in &error_rows {
            items.push(BulkUploadItem {
                id: Uuid::new_v4().to_string(),
                batch_id: batch_id.to_string(),
                product_id: None,
                title: String::new(),
                slug: String::new(),
                price: 0,
                manufacturer: None,
                description: None,
                main_image: None,
                category_id: String::new(),
                in_stock: 0,
                status: ItemStatus::Error,
                error: Some(truncate_error(&format!("Row {}: {}", err.index, err.error))),
            });
            failed += 1;
        }

        // === 步骤 7: 批量插入审计条目 ===
        if !items.is_empty() {
            Self::insert_items_tx(&tx, &items)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(BatchOutcome {
            success_count: success,
            error_count: failed,
        })
    }

    async fn get_items_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<BulkUploadItem>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, batch_id, product_id, title, slug, price,
                   manufacturer, description, main_image, category_id,
                   in_stock, status, error
            FROM bulk_upload_item WHERE batch_id = ?1 ORDER BY rowid
            "#,
        )?;
        let rows = stmt.query_map(params![batch_id], Self::map_item_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_batch_summary(&self, batch_id: &str) -> RepositoryResult<BatchSummary> {
        let conn = self.lock_conn()?;
        let total = Self::count_items_tx(&conn, batch_id, None)?;
        let errors = Self::count_items_tx(&conn, batch_id, Some(ItemStatus::Error))?;
        let created = Self::count_items_tx(&conn, batch_id, Some(ItemStatus::Created))?;
        let updated = Self::count_items_tx(&conn, batch_id, Some(ItemStatus::Updated))?;

        Ok(BatchSummary {
            total,
            errors,
            created,
            updated,
        })
    }

    async fn can_delete_products_for_batch(
        &self,
        batch_id: &str,
    ) -> RepositoryResult<DeleteCheck> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT product_id FROM bulk_upload_item
             WHERE batch_id = ?1 AND product_id IS NOT NULL",
        )?;
        let product_ids: Vec<String> = stmt
            .query_map(params![batch_id], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        if product_ids.is_empty() {
            return Ok(DeleteCheck {
                can_delete: true,
                reason: None,
                blocked_product_ids: Vec::new(),
            });
        }

        let placeholders = vec!["?"; product_ids.len()].join(", ");
        let sql = format!(
            "SELECT product_id FROM customer_order_product WHERE product_id IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let referenced: HashSet<String> = stmt
            .query_map(params_from_iter(product_ids.iter()), |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let blocked: Vec<String> = product_ids
            .into_iter()
            .filter(|id| referenced.contains(id))
            .collect();

        if blocked.is_empty() {
            Ok(DeleteCheck {
                can_delete: true,
                reason: None,
                blocked_product_ids: Vec::new(),
            })
        } else {
            Ok(DeleteCheck {
                can_delete: false,
                reason: Some("Some products are in orders".to_string()),
                blocked_product_ids: blocked,
            })
        }
    }

    async fn apply_item_updates(
        &self,
        batch_id: &str,
        updates: Vec<ItemUpdate>,
    ) -> RepositoryResult<Vec<BulkUploadItem>> {
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 只认归属于该批次的条目，其余静默跳过
        let ids: Vec<String> = updates.iter().map(|u| u.item_id.clone()).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, product_id FROM bulk_upload_item
             WHERE batch_id = ? AND id IN ({})",
            placeholders
        );

        let mut current: HashMap<String, Option<String>> = HashMap::new();
        {
            let mut stmt = tx.prepare(&sql)?;
            let mut bind: Vec<String> = Vec::with_capacity(ids.len() + 1);
            bind.push(batch_id.to_string());
            bind.extend(ids.iter().cloned());
            let rows = stmt.query_map(params_from_iter(bind.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            for row in rows {
                let (id, product_id) = row?;
                current.insert(id, product_id);
            }
        }

        let mut result = Vec::new();
        for upd in &updates {
            let product_id = match current.get(&upd.item_id) {
                Some(product_id) => product_id.clone(),
                None => continue,
            };

            let price = upd.price.round() as i64;
            let in_stock: i64 = if upd.in_stock == 1 { 1 } else { 0 };

            // 关联商品存在时同步修正
            if let Some(pid) = &product_id {
                tx.execute(
                    "UPDATE product SET price = ?1, in_stock = ?2 WHERE id = ?3",
                    params![price, in_stock, pid],
                )?;
            }

            tx.execute(
                "UPDATE bulk_upload_item
                 SET price = ?1, in_stock = ?2, status = ?3, error = NULL
                 WHERE id = ?4",
                params![price, in_stock, ItemStatus::Updated.as_str(), upd.item_id],
            )?;

            if let Some(item) = Self::get_item_tx(&tx, &upd.item_id)? {
                result.push(item);
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(result)
    }
}
