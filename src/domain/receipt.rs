use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{lenient, Cell, CellKind, Column, Dataset, Record};

/// A scanned receipt, as exported after normalization
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "_id", default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub bonus_points_earned: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub bonus_points_earned_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub create_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub date_scanned: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub finished_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub modify_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub points_awarded_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub points_earned: Option<f64>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub purchase_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub purchased_item_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::items")]
    pub rewards_receipt_item_list: Option<Vec<ReceiptItem>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub rewards_receipt_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_spent: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_id: Option<String>,
}

/// One line item of a receipt
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    #[serde(default, deserialize_with = "lenient::text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub brand_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub final_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub item_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub partner_item_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub quantity_purchased: Option<i64>,
}

const RECEIPT_COLUMNS: &[Column] = &[
    Column::new("_id", CellKind::Text),
    Column::new("bonusPointsEarned", CellKind::Integer),
    Column::new("bonusPointsEarnedReason", CellKind::Text),
    Column::new("createDate", CellKind::Timestamp),
    Column::new("dateScanned", CellKind::Timestamp),
    Column::new("finishedDate", CellKind::Timestamp),
    Column::new("modifyDate", CellKind::Timestamp),
    Column::new("pointsAwardedDate", CellKind::Timestamp),
    Column::new("pointsEarned", CellKind::Decimal),
    Column::new("purchaseDate", CellKind::Timestamp),
    Column::new("purchasedItemCount", CellKind::Integer),
    Column::new("rewardsReceiptItemList", CellKind::List),
    Column::new("rewardsReceiptStatus", CellKind::Text),
    Column::new("totalSpent", CellKind::Decimal),
    Column::new("userId", CellKind::Text),
];

impl Record for Receipt {
    const DATASET: Dataset = Dataset::Receipts;

    fn columns() -> &'static [Column] {
        RECEIPT_COLUMNS
    }

    fn cell(&self, column: &str) -> Option<Cell> {
        match column {
            "_id" => self.id.clone().map(Cell::Text),
            "bonusPointsEarned" => self.bonus_points_earned.map(Cell::Integer),
            "bonusPointsEarnedReason" => self.bonus_points_earned_reason.clone().map(Cell::Text),
            "createDate" => self.create_date.map(Cell::Timestamp),
            "dateScanned" => self.date_scanned.map(Cell::Timestamp),
            "finishedDate" => self.finished_date.map(Cell::Timestamp),
            "modifyDate" => self.modify_date.map(Cell::Timestamp),
            "pointsAwardedDate" => self.points_awarded_date.map(Cell::Timestamp),
            "pointsEarned" => self.points_earned.map(Cell::Decimal),
            "purchaseDate" => self.purchase_date.map(Cell::Timestamp),
            "purchasedItemCount" => self.purchased_item_count.map(Cell::Integer),
            "rewardsReceiptItemList" => self
                .rewards_receipt_item_list
                .as_ref()
                .map(|items| Cell::List(items.len())),
            "rewardsReceiptStatus" => self.rewards_receipt_status.clone().map(Cell::Text),
            "totalSpent" => self.total_spent.map(Cell::Decimal),
            "userId" => self.user_id.clone().map(Cell::Text),
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
    fn test_receipt_reads_normalized_export_fields() {
        let receipt: Receipt = serde_json::from_value(json!({
            "_id": "5ff1e1eb0a720f0523000575",
            "userId": "5ff1e1eacfcf6c399c274ae6",
            "totalSpent": "26.00",
            "purchasedItemCount": 5,
            "purchaseDate": "2021-01-03 00:00:00",
            "rewardsReceiptStatus": "FINISHED",
            "rewardsReceiptItemList": [
                {"barcode": "4011", "finalPrice": "26.00", "quantityPurchased": 5}
            ]
        }))
        .unwrap();

        assert_eq!(receipt.record_id(), Some("5ff1e1eb0a720f0523000575"));
        assert_eq!(receipt.total_spent, Some(26.0));
        assert_eq!(receipt.cell("rewardsReceiptItemList"), Some(Cell::List(1)));
        assert!(receipt.cell("finishedDate").is_none());
        assert!(matches!(receipt.cell("purchaseDate"), Some(Cell::Timestamp(_))));
    }

    #[test]
    fn test_every_column_is_addressable() {
        let receipt: Receipt = serde_json::from_value(json!({
            "_id": "r1",
            "bonusPointsEarned": 500,
            "bonusPointsEarnedReason": "Receipt number 1 completed",
            "createDate": "2021-01-03 15:25:31",
            "dateScanned": "2021-01-03 15:25:31",
            "finishedDate": "2021-01-03 15:25:31",
            "modifyDate": "2021-01-03 15:25:36",
            "pointsAwardedDate": "2021-01-03 15:25:31",
            "pointsEarned": "500.0",
            "purchaseDate": "2021-01-03 00:00:00",
            "purchasedItemCount": 5,
            "rewardsReceiptItemList": [],
            "rewardsReceiptStatus": "FINISHED",
            "totalSpent": "26.00",
            "userId": "u1"
        }))
        .unwrap();

        for column in Receipt::columns() {
            let cell = receipt.cell(column.name);
            assert_eq!(cell.map(|c| c.kind()), Some(column.kind), "{}", column.name);
        }
        assert_eq!(Receipt::columns().len(), 15);

        let empty = Receipt::default();
        assert!(Receipt::columns().iter().all(|c| empty.cell(c.name).is_none()));
    }
}
