//! Configuration merging utilities
//!
//! This module provides functions to merge configuration from files
//! with command-line arguments, where CLI arguments take precedence.

use super::args::ServeArgs;
use super::defaults::*;
use super::file::ConfigFile;

/// Merge configuration file values with CLI arguments.
/// CLI arguments take precedence over config file values.
/// Only applies config file values where CLI uses defaults.
pub fn merge_config_with_args(mut args: ServeArgs, config: &ConfigFile) -> ServeArgs {
    macro_rules! apply_if_default {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(val) = $config_val {
                if args.$field == $default {
                    args.$field = val;
                }
            }
        };
    }

    macro_rules! apply_if_default_string {
        ($field:ident, $config_val:expr, $default:expr) => {
            if let Some(ref val) = $config_val {
                if args.$field == $default {
                    args.$field = val.clone();
                }
            }
        };
    }

    // Server section
    apply_if_default_string!(http_addr, config.server.http_addr, DEFAULT_HTTP_ADDR);
    apply_if_default_string!(log_level, config.server.log_level, DEFAULT_LOG_LEVEL);
    apply_if_default!(hash_urls, config.server.hash_urls, DEFAULT_HASH_URLS);

    // Query section
    apply_if_default!(page_size, config.query.page_size, DEFAULT_PAGE_SIZE);
    apply_if_default!(
        max_returned_rows,
        config.query.max_returned_rows,
        DEFAULT_MAX_RETURNED_ROWS
    );
    apply_if_default!(
        sql_time_limit_ms,
        config.query.sql_time_limit_ms,
        DEFAULT_SQL_TIME_LIMIT_MS
    );

    args
}
