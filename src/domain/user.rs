use chrono::NaiveDateTime;
use serde::Deserialize;

use super::{lenient, Cell, CellKind, Column, Dataset, Record};

/// A registered user account
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub last_login: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub sign_up_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub state: Option<String>,
}

const USER_COLUMNS: &[Column] = &[
    Column::new("_id", CellKind::Text),
    Column::new("active", CellKind::Flag),
    Column::new("createdDate", CellKind::Timestamp),
    Column::new("lastLogin", CellKind::Timestamp),
    Column::new("role", CellKind::Text),
    Column::new("signUpSource", CellKind::Text),
    Column::new("state", CellKind::Text),
];

impl Record for User {
    const DATASET: Dataset = Dataset::Users;

    fn columns() -> &'static [Column] {
        USER_COLUMNS
    }

    fn cell(&self, column: &str) -> Option<Cell> {
        match column {
            "_id" => self.id.clone().map(Cell::Text),
            "active" => self.active.map(Cell::Flag),
            "createdDate" => self.created_date.map(Cell::Timestamp),
            "lastLogin" => self.last_login.map(Cell::Timestamp),
            "role" => self.role.clone().map(Cell::Text),
            "signUpSource" => self.sign_up_source.clone().map(Cell::Text),
            "state" => self.state.clone().map(Cell::Text),
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
        let user: User = serde_json::from_value(json!({
            "_id": "5ff1e194b6a9d73a3a9f1052",
            "active": true,
            "createdDate": "2021-01-03 15:24:04",
            "lastLogin": "2021-01-03 15:25:37",
            "role": "consumer",
            "signUpSource": "Email",
            "state": "WI"
        }))
        .unwrap();

        for column in User::columns() {
            let cell = user.cell(column.name);
            assert_eq!(cell.map(|c| c.kind()), Some(column.kind), "{}", column.name);
        }
        assert_eq!(User::columns().len(), 7);
        assert_eq!(user.record_id(), Some("5ff1e194b6a9d73a3a9f1052"));
    }
}
