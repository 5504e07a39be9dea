// ==========================================
// 电商商品批量上传系统 - 目录侧实体
// ==========================================
// 用途: 导入管道只读引用类目/商户，写入商品
// 红线: 类目与商户归目录模块所有，此处不做任何变更
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Category - 商品类目（只读引用）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

// ==========================================
// NewProduct - 商品建档载荷
// ==========================================
// 用途: 批量写入器的插入载荷，主键由仓储层生成
// 对齐: product 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub slug: String,          // 全局唯一（数据库约束兜底）
    pub price: i64,            // 已换算的整数价格
    pub rating: i64,           // 初始评分，导入固定为 5
    pub description: String,   // 可选字段落库为空串
    pub manufacturer: String,
    pub main_image: String,
    pub category_id: String,   // 已解析的类目 ID
    pub merchant_id: String,
    pub in_stock: i64,
}
