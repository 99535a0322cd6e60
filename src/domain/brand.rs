use serde::Deserialize;

use super::{lenient, Cell, CellKind, Column, Dataset, Record};

/// A brand from the partner catalog
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id", default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category_code: Option<String>,
    /// Id of the referenced CPG, flattened from its `$ref`/`$id` wrapper
    #[serde(default, deserialize_with = "lenient::text")]
    pub cpg: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub top_brand: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brand_code: Option<String>,
}

const BRAND_COLUMNS: &[Column] = &[
    Column::new("_id", CellKind::Text),
    Column::new("barcode", CellKind::Text),
    Column::new("category", CellKind::Text),
    Column::new("categoryCode", CellKind::Text),
    Column::new("cpg", CellKind::Text),
    Column::new("name", CellKind::Text),
    Column::new("topBrand", CellKind::Flag),
    Column::new("brandCode", CellKind::Text),
];

impl Record for Brand {
    const DATASET: Dataset = Dataset::Brands;

    fn columns() -> &'static [Column] {
        BRAND_COLUMNS
    }

    fn cell(&self, column: &str) -> Option<Cell> {
        match column {
            "_id" => self.id.clone().map(Cell::Text),
            "barcode" => self.barcode.clone().map(Cell::Text),
            "category" => self.category.clone().map(Cell::Text),
            "categoryCode" => self.category_code.clone().map(Cell::Text),
            "cpg" => self.cpg.clone().map(Cell::Text),
            "name" => self.name.clone().map(Cell::Text),
            "topBrand" => self.top_brand.map(Cell::Flag),
            "brandCode" => self.brand_code.clone().map(Cell::Text),
            _ => None,
        }
    }

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_column_is_addressable() {
        let brand: Brand = serde_json::from_value(json!({
            "_id": "601ac115be37ce2ead437551",
            "barcode": "511111019862",
            "category": "Baking",
            "categoryCode": "BAKING",
            "cpg": "601ac114be37ce2ead437550",
            "name": "test brand @1612366101024",
            "topBrand": false,
            "brandCode": "TEST BRANDCODE @1612366101024"
        }))
        .unwrap();

        for column in Brand::columns() {
            let cell = brand.cell(column.name);
            assert_eq!(cell.map(|c| c.kind()), Some(column.kind), "{}", column.name);
        }
        assert_eq!(Brand::columns().len(), 8);
        assert!(brand.cell("unknown").is_none());
    }

    #[test]
    fn test_numeric_barcode_is_read_as_text() {
        let brand: Brand = serde_json::from_value(json!({ "barcode": 511111019862_i64 })).unwrap();
        assert_eq!(brand.cell("barcode"), Some(Cell::Text("511111019862".to_string())));
    }
}
