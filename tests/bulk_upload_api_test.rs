// ==========================================
// 批量上传 API 集成测试
// ==========================================
// 测试目标: API 层封装（DTO、输入校验、错误映射）
// ==========================================


use storefront_bulk_upload::api::{ApiError, BulkUploadApi};
use storefront_bulk_upload::domain::bulk_upload::ItemUpdate;
use storefront_bulk_upload::domain::types::BatchStatus;
use storefront_bulk_upload::logging;
use test_helpers::{create_test_db, seed_catalog};

const CSV: &str = "\
title,slug,price,categoryId,inStock
Laptop A,laptop-a,900,cat-laptops,3
Phone B,phone-b,450,doesnotexist,1
";

#[tokio::test]
async fn test_upload_and_summary_flow() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = rusqlite::Connection::open(&db_path).expect("Failed to open db");
    seed_catalog(&conn).expect("Failed to seed catalog");

    let api = BulkUploadApi::new(db_path.clone());

    let response = api
        .upload_csv(CSV.as_bytes(), None)
        .await
        .expect("Upload should succeed");
    assert_eq!(response.total_rows, 2);
    assert_eq!(response.success_count, 1);
    assert_eq!(response.error_count, 1);
    assert_eq!(response.status, BatchStatus::Partial);

    let summary = api
        .get_batch_summary(&response.batch_id)
        .await
        .expect("Summary should succeed");
    assert_eq!(summary.status, BatchStatus::Partial);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.created, 1);

    let items = api
        .list_batch_items(&response.batch_id)
        .await
        .expect("Item list should succeed");
    assert_eq!(items.total, 2);

    let batches = api.list_recent_batches(10).await.unwrap();
    assert_eq!(batches.batches.len(), 1);
    assert_eq!(batches.batches[0].id, response.batch_id);

    let check = api
        .check_batch_deletable(&response.batch_id)
        .await
        .expect("Delete check should succeed");
    assert!(check.can_delete);
}

#[tokio::test]
async fn test_upload_empty_buffer_rejected() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = BulkUploadApi::new(db_path);

    let result = api.upload_csv(&[], None).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_summary_of_unknown_batch_is_not_found() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let api = BulkUploadApi::new(db_path);

    let result = api.get_batch_summary("no-such-batch").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_update_batch_items_via_api() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = rusqlite::Connection::open(&db_path).expect("Failed to open db");
    seed_catalog(&conn).expect("Failed to seed catalog");

    let api = BulkUploadApi::new(db_path);

    let response = api.upload_csv(CSV.as_bytes(), None).await.unwrap();
    let items = api.list_batch_items(&response.batch_id).await.unwrap();
    let created = items
        .items
        .iter()
        .find(|item| item.product_id.is_some())
        .expect("Should have a created item");

    // 空修正列表直接拒绝
    let result = api.update_batch_items(&response.batch_id, Vec::new()).await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let updated = api
        .update_batch_items(
            &response.batch_id,
            vec![ItemUpdate {
                item_id: created.id.clone(),
                price: 12.4,
                in_stock: 1,
            }],
        )
        .await
        .unwrap();
    assert_eq!(updated.updated_count, 1);
    assert_eq!(updated.items[0].price, 12);
    assert_eq!(updated.items[0].in_stock, 1);
}

#[tokio::test]
async fn test_upload_without_merchant_maps_to_business_rule_error() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = rusqlite::Connection::open(&db_path).expect("Failed to open db");
    test_helpers::insert_category(&conn, "cat-laptops", "Laptops").unwrap();

    let api = BulkUploadApi::new(db_path);

    let result = api.upload_csv(CSV.as_bytes(), None).await;
    assert!(matches!(result, Err(ApiError::BusinessRuleViolation(_))));
}
