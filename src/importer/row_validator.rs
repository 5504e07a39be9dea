// ==========================================
// 电商商品批量上传系统 - 行校验器
// ==========================================
// 职责: 按商品 schema 约束逐行校验并做类型归一
// 红线: 纯函数，无 I/O；所有违规合并为一条错误消息，不短路
// ==========================================

use crate::domain::bulk_upload::{RowError, ValidatedRow};
use std::collections::HashMap;

/// 价格换算系数：上传价格按固定系数折算为整数落库
///
/// 业务换算规则（非分转换），所有导入路径必须一致
pub const PRICE_SCALE_DIVISOR: f64 = 90.0;

/// 数值字段解析
///
/// 对齐上游提交语义: 空串归零，非数值文本视为非法（NaN）
fn parse_numeric(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// 可选文本字段: 去空白后为空则视为未提交
fn optional_field(row: &HashMap<String, String>, key: &str) -> Option<String> {
    row.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// 校验单行并归一类型
///
/// # 参数
/// - row: 解码后的字段映射
/// - index: 数据行位置（0 起，表头不计）
///
/// # 返回
/// - Ok(ValidatedRow): 已归一的干净记录
/// - Err(RowError): 合并后的违规消息 + 原始行位置
pub fn validate_row(row: &HashMap<String, String>, index: usize) -> Result<ValidatedRow, RowError> {
    let mut errs: Vec<&str> = Vec::new();

    let title = row.get("title").map(|v| v.trim()).unwrap_or("");
    let slug = row.get("slug").map(|v| v.trim()).unwrap_or("");
    let category_id = row.get("categoryId").map(|v| v.trim()).unwrap_or("");

    // price 缺列视为非法；inStock 缺列默认 0
    let price = match row.get("price") {
        Some(v) => parse_numeric(v),
        None => f64::NAN,
    };
    let in_stock = match row.get("inStock") {
        Some(v) => parse_numeric(v),
        None => 0.0,
    };

    if title.is_empty() {
        errs.push("title is required");
    }
    if slug.is_empty() {
        errs.push("slug is required");
    }
    if !price.is_finite() || price < 0.0 {
        errs.push("price must be a non-negative number");
    }
    if category_id.is_empty() {
        errs.push("categoryId is required");
    }
    if !in_stock.is_finite() || in_stock < 0.0 {
        errs.push("inStock must be a non-negative number");
    }

    if !errs.is_empty() {
        return Err(RowError {
            index,
            error: errs.join(", "),
        });
    }

    Ok(ValidatedRow {
        title: title.to_string(),
        slug: slug.to_string(),
        price: (price / PRICE_SCALE_DIVISOR).floor() as i64,
        category_id: category_id.to_string(),
        in_stock: in_stock.floor() as i64,
        manufacturer: optional_field(row, "manufacturer"),
        description: optional_field(row, "description"),
        main_image: optional_field(row, "mainImage"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_row() -> HashMap<String, String> {
        let mut row = HashMap::new();
        row.insert("title".to_string(), "Laptop Pro 15".to_string());
        row.insert("slug".to_string(), "laptop-pro-15".to_string());
        row.insert("price".to_string(), "900".to_string());
        row.insert("categoryId".to_string(), "cat-laptops".to_string());
        row.insert("inStock".to_string(), "5".to_string());
        row
    }

    #[test]
    fn test_valid_row_price_scaling() {
        let row = base_row();
        let clean = validate_row(&row, 0).unwrap();

        // 900 / 90 = 10
        assert_eq!(clean.price, 10);
        assert_eq!(clean.in_stock, 5);
        assert_eq!(clean.title, "Laptop Pro 15");
    }

    #[test]
    fn test_price_scaling_floors() {
        let mut row = base_row();
        row.insert("price".to_string(), "100".to_string());
        let clean = validate_row(&row, 0).unwrap();
        // floor(100 / 90) = 1
        assert_eq!(clean.price, 1);

        row.insert("price".to_string(), "89.99".to_string());
        let clean = validate_row(&row, 0).unwrap();
        assert_eq!(clean.price, 0);
    }

    #[test]
    fn test_missing_title() {
        let mut row = base_row();
        row.insert("title".to_string(), "  ".to_string());
        let err = validate_row(&row, 3).unwrap_err();

        assert_eq!(err.index, 3);
        assert_eq!(err.error, "title is required");
    }

    #[test]
    fn test_multiple_violations_joined_in_rule_order() {
        let mut row = base_row();
        row.insert("title".to_string(), "".to_string());
        row.insert("slug".to_string(), "".to_string());
        row.insert("price".to_string(), "abc".to_string());
        let err = validate_row(&row, 0).unwrap_err();

        assert_eq!(
            err.error,
            "title is required, slug is required, price must be a non-negative number"
        );
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut row = base_row();
        row.insert("price".to_string(), "-1".to_string());
        let err = validate_row(&row, 0).unwrap_err();
        assert!(err.error.contains("price must be a non-negative number"));
    }

    #[test]
    fn test_empty_price_coerces_to_zero() {
        let mut row = base_row();
        row.insert("price".to_string(), "".to_string());
        let clean = validate_row(&row, 0).unwrap();
        assert_eq!(clean.price, 0);
    }

    #[test]
    fn test_missing_price_column_rejected() {
        let mut row = base_row();
        row.remove("price");
        let err = validate_row(&row, 0).unwrap_err();
        assert!(err.error.contains("price must be a non-negative number"));
    }

    #[test]
    fn test_in_stock_defaults_to_zero() {
        let mut row = base_row();
        row.remove("inStock");
        let clean = validate_row(&row, 0).unwrap();
        assert_eq!(clean.in_stock, 0);
    }

    #[test]
    fn test_in_stock_non_numeric_rejected() {
        let mut row = base_row();
        row.insert("inStock".to_string(), "many".to_string());
        let err = validate_row(&row, 0).unwrap_err();
        assert!(err.error.contains("inStock must be a non-negative number"));
    }

    #[test]
    fn test_in_stock_floored() {
        let mut row = base_row();
        row.insert("inStock".to_string(), "7.9".to_string());
        let clean = validate_row(&row, 0).unwrap();
        assert_eq!(clean.in_stock, 7);
    }

    #[test]
    fn test_optional_fields_empty_become_none() {
        let mut row = base_row();
        row.insert("manufacturer".to_string(), "".to_string());
        row.insert("description".to_string(), "  ".to_string());
        let clean = validate_row(&row, 0).unwrap();

        assert_eq!(clean.manufacturer, None);
        assert_eq!(clean.description, None);
        assert_eq!(clean.main_image, None);
    }

    #[test]
    fn test_optional_fields_trimmed() {
        let mut row = base_row();
        row.insert("manufacturer".to_string(), " Acme ".to_string());
        row.insert("mainImage".to_string(), "https://img/x.png".to_string());
        let clean = validate_row(&row, 0).unwrap();

        assert_eq!(clean.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(clean.main_image.as_deref(), Some("https://img/x.png"));
    }
}
