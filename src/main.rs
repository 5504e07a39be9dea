// ==========================================
// 电商商品批量上传系统 - 运维 CLI 入口
// ==========================================
// 用途: 从磁盘导入一份 CSV 商品文件并打印导入报告
// 用法: storefront-bulk-upload <csv文件> [--db <路径>] [--merchant <商户ID>] [--json]
// ==========================================

use std::error::Error;
use std::process;

use storefront_bulk_upload::config::ConfigManager;
use storefront_bulk_upload::importer::BulkUploadService;
use storefront_bulk_upload::repository::BulkUploadRepositoryImpl;
use storefront_bulk_upload::{db, logging};

fn print_usage() {
    eprintln!("用法: storefront-bulk-upload <csv文件> [--db <路径>] [--merchant <商户ID>] [--json]");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", storefront_bulk_upload::APP_NAME);
    tracing::info!("系统版本: {}", storefront_bulk_upload::VERSION);
    tracing::info!("==================================================");

    // 解析命令行参数
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut csv_path: Option<String> = None;
    let mut db_path: Option<String> = None;
    let mut merchant_id: Option<String> = None;
    let mut json_output = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                i += 1;
                db_path = args.get(i).cloned();
            }
            "--merchant" => {
                i += 1;
                merchant_id = args.get(i).cloned();
            }
            "--json" => {
                json_output = true;
            }
            other if csv_path.is_none() => {
                csv_path = Some(other.to_string());
            }
            other => {
                eprintln!("未知参数: {}", other);
                print_usage();
                process::exit(2);
            }
        }
        i += 1;
    }

    let csv_path = match csv_path {
        Some(path) => path,
        None => {
            print_usage();
            process::exit(2);
        }
    };

    let db_path = db_path.unwrap_or_else(db::get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    // 初始化数据库（建表幂等）
    {
        let conn = db::open_sqlite_connection(&db_path)?;
        db::init_schema(&conn)?;
    }

    // 读取上传文件
    let buffer = std::fs::read(&csv_path)?;
    tracing::info!(file = %csv_path, bytes = buffer.len(), "已读取上传文件");

    // 创建服务并执行导入
    let repo = BulkUploadRepositoryImpl::new(&db_path)?;
    let config = ConfigManager::new(&db_path)?;
    let service = BulkUploadService::new(repo, config);

    match service
        .import_csv_buffer(&buffer, merchant_id.as_deref())
        .await
    {
        Ok(report) => {
            if json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("批次 ID:   {}", report.batch_id);
                println!("数据行数:  {}", report.total_rows);
                println!("成功建档:  {}", report.success_count);
                println!("失败行数:  {}", report.error_count);
                println!("批次状态:  {}", report.status);
                println!("耗时(ms):  {}", report.elapsed_ms);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "导入失败");
            eprintln!("导入失败: {}", e);
            process::exit(1);
        }
    }
}
