/// Dataset names used in config sections, logs and report headers
pub const RECEIPTS_DATASET: &str = "receipts";
pub const BRANDS_DATASET: &str = "brands";
pub const USERS_DATASET: &str = "users";

// Default export file names (relative to the data directory)
pub const RECEIPTS_FILE: &str = "receipts.json";
pub const BRANDS_FILE: &str = "brands.json";
pub const USERS_FILE: &str = "users.json";

/// The users export ships with one malformed leading line
pub const USERS_DEFAULT_SKIP_LINES: usize = 1;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "quality.toml";

/// Rendering of normalized `$date` values
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Export wrapper keys
pub const OID_KEY: &str = "$oid";
pub const DATE_KEY: &str = "$date";
pub const REF_KEY: &str = "$ref";
pub const REF_ID_KEY: &str = "$id";

// Column names referenced by the default check plan
pub const ID_COLUMN: &str = "_id";
pub const USER_ID_COLUMN: &str = "userId";
pub const TOTAL_SPENT_COLUMN: &str = "totalSpent";
pub const PURCHASED_ITEM_COUNT_COLUMN: &str = "purchasedItemCount";
pub const PURCHASE_DATE_COLUMN: &str = "purchaseDate";
pub const RECEIPT_STATUS_COLUMN: &str = "rewardsReceiptStatus";
pub const STATE_COLUMN: &str = "state";
pub const ROLE_COLUMN: &str = "role";

/// Expected role for every user record
pub const CONSUMER_ROLE: &str = "consumer";

/// Receipt statuses accepted by the rewards program
pub const RECEIPT_STATUSES: &[&str] = &["FINISHED", "SUBMITTED", "REJECTED", "FLAGGED", "PENDING"];

/// US state, district and territory postal codes
pub const US_STATE_CODES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "PR", "VI", "GU", "AS", "MP",
];

/// Number of record ids quoted per finding unless configured otherwise
pub const DEFAULT_SAMPLE_SIZE: usize = 5;
