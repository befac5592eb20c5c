// src/config/consts.rs

// Net config
pub const DEFAULT_SERVER_URL: &str = "https://eu.kobotoolbox.org";
pub const API_PREFIX: &str = "/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

pub const SERVER_ENV: &str = "KOBO_SERVER_URL";
pub const TOKEN_ENV: &str = "KOBO_API_TOKEN";

// Asset filtering
pub const SURVEY_ASSET_TYPE: &str = "survey";

// Schema extraction
pub const UNKNOWN_TYPE: &str = "unknown";
pub const DEFAULT_LANG: &str = "default";

// Search
pub const DEFAULT_THRESHOLD: u8 = 80;

// Export
pub const DEFAULT_METADATA_FILE: &str = "projects_metadata.xlsx";
pub const DEFAULT_XLSFORMS_FILE: &str = "xlsforms.zip";
pub const DEFAULT_SUBMISSIONS_FILE: &str = "submissions_json.zip";
pub const DEFAULT_WORKBOOK_FILE: &str = "submissions.xlsx";

// Excel caps sheet names at 31 chars.
pub const SHEET_NAME_MAX: usize = 31;
