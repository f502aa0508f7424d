//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements       | Connects to                 |
//! |-----------------|------------------|-----------------------------|
//! | `nvs`           | KvStorePort      | NVS default partition       |
//! | `wifi`          | NetworkPort      | ESP-IDF WiFi STA            |
//! | `http_source`   | ImageSource      | ESP-IDF HTTP(S) client      |
//! | `ota_partition` | PartitionWriter  | Inactive OTA app slot       |
//! | `system`        | SystemPort       | esp_restart                 |
//! | `log_sink`      | EventSink        | Serial log output           |
//!
//! Each adapter carries a simulation variant for non-`espidf` targets.

pub mod http_source;
pub mod log_sink;
pub mod nvs;
pub mod ota_partition;
pub mod system;
pub mod wifi;
