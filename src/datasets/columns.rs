//! Reserved column names shared by every benchmark dataset

pub const EVENT_ID: &str = "EVENT_ID";
pub const ENTITY_ID: &str = "ENTITY_ID";
pub const ENTITY_TYPE: &str = "ENTITY_TYPE";
pub const EVENT_TIMESTAMP: &str = "EVENT_TIMESTAMP";
pub const LABEL_TIMESTAMP: &str = "LABEL_TIMESTAMP";
pub const EVENT_LABEL: &str = "EVENT_LABEL";

pub const RESERVED_COLUMNS: [&str; 6] = [
    EVENT_ID,
    ENTITY_ID,
    ENTITY_TYPE,
    EVENT_TIMESTAMP,
    LABEL_TIMESTAMP,
    EVENT_LABEL,
];

/// Columns withheld from the test table
pub const TEST_WITHHELD: [&str; 2] = [EVENT_LABEL, LABEL_TIMESTAMP];

/// RFC 3339, UTC, second precision
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Reserved columns that always hold text, whatever the source column looked like
pub const RESERVED_TEXT_COLUMNS: [&str; 5] = [
    EVENT_ID,
    ENTITY_ID,
    ENTITY_TYPE,
    EVENT_TIMESTAMP,
    LABEL_TIMESTAMP,
];
