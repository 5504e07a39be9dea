// ==========================================
// 电商商品批量上传系统 - CSV 解码器
// ==========================================
// 输入: 上传的原始字节缓冲
// 输出: 按表头取键的有序字段映射序列（与源数据行序一致）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::ReaderBuilder;
use std::collections::HashMap;

// ==========================================
// CsvDecoder 实现
// ==========================================
pub struct CsvDecoder;

impl CsvDecoder {
    /// 将字节缓冲解码为字段映射序列
    ///
    /// - 去除开头的 UTF-8 BOM
    /// - 第一行作为表头，字段与表头均去除首尾空白
    /// - 空行跳过；列数不一致视为格式错误
    pub fn decode(&self, buffer: &[u8]) -> ImportResult<Vec<HashMap<String, String>>> {
        let text = String::from_utf8_lossy(buffer);

        // 去除 BOM（UTF-8 BOM 为 EF BB BF，解码后为 U+FEFF）
        let text: &str = match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped,
            None => &text,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ImportError::MalformedInput(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有数据行
        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.to_string());
                }
            }

            records.push(row_map);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_buffer() {
        let csv = "title,slug,price\nLaptop,laptop,900\nPhone,phone,450\n";
        let decoder = CsvDecoder;
        let records = decoder.decode(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("title"), Some(&"Laptop".to_string()));
        assert_eq!(records[1].get("price"), Some(&"450".to_string()));
    }

    #[test]
    fn test_decode_strips_bom() {
        let csv = "\u{feff}title,slug\nLaptop,laptop\n";
        let decoder = CsvDecoder;
        let records = decoder.decode(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("title"), Some(&"Laptop".to_string()));
    }

    #[test]
    fn test_decode_trims_fields_and_headers() {
        let csv = " title , slug \n  Laptop  ,  laptop-1  \n";
        let decoder = CsvDecoder;
        let records = decoder.decode(csv.as_bytes()).unwrap();

        assert_eq!(records[0].get("title"), Some(&"Laptop".to_string()));
        assert_eq!(records[0].get("slug"), Some(&"laptop-1".to_string()));
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let csv = "title,slug\nLaptop,laptop\n\nPhone,phone\n";
        let decoder = CsvDecoder;
        let records = decoder.decode(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_decode_inconsistent_columns_is_malformed() {
        let csv = "title,slug,price\nLaptop,laptop\n";
        let decoder = CsvDecoder;
        let result = decoder.decode(csv.as_bytes());

        assert!(matches!(result, Err(ImportError::MalformedInput(_))));
    }

    #[test]
    fn test_decode_unbalanced_quote_is_malformed() {
        let csv = "title,slug\n\"Laptop,laptop\nPhone\",phone,extra\n";
        let decoder = CsvDecoder;
        let result = decoder.decode(csv.as_bytes());

        assert!(matches!(result, Err(ImportError::MalformedInput(_))));
    }

    #[test]
    fn test_decode_row_count_matches_data_lines() {
        let mut csv = String::from("title,slug\n");
        for i in 0..25 {
            csv.push_str(&format!("Product {i},product-{i}\n"));
        }
        let decoder = CsvDecoder;
        let records = decoder.decode(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 25);
    }
}
