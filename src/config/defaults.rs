/// Default configuration constants used across the system.

/// Default config file location.
pub const DEFAULT_CONFIG_FILE: &str = "./config.yaml";

/// Default number of keys synced concurrently per batch.
pub const DEFAULT_BATCH_SIZE: i64 = 100;

/// Default source Vault address.
pub const DEFAULT_SOURCE_ADDR: &str = "http://localhost:8200";

/// Default destination Vault address.
pub const DEFAULT_TARGET_ADDR: &str = "http://localhost:8201";

/// Default KV v2 mount.
pub const DEFAULT_MOUNT: &str = "secret";

/// Default source secret path.
pub const DEFAULT_SECRET_PATH: &str = "path/to/my/secret";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment override for `batchSize`.
pub const ENV_BATCH_SIZE: &str = "HVM_BATCH_SIZE";

/// Environment override for the source token.
pub const ENV_SRC_TOKEN: &str = "HVM_SRC_TOKEN";

/// Environment override for the destination token.
pub const ENV_DEST_TOKEN: &str = "HVM_DEST_TOKEN";
