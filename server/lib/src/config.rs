//! Server-level configuration the write path consults.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

fn default_check_schema() -> bool {
    true
}

fn default_server_error_result_code() -> ResultCode {
    ResultCode::Other
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Gate candidate entries through the schema on write.
    #[serde(default = "default_check_schema")]
    pub check_schema: bool,
    /// The server wide writability mode; backends additionally carry their
    /// own.
    #[serde(default)]
    pub writability_mode: WritabilityMode,
    /// The result code reported for internal processing failures such as an
    /// unacquirable DN lock.
    #[serde(default = "default_server_error_result_code")]
    pub server_error_result_code: ResultCode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            check_schema: true,
            writability_mode: WritabilityMode::Enabled,
            server_error_result_code: ResultCode::Other,
        }
    }
}
