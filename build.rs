fn main() {
    // Compiled-in credentials and firmware URL (see src/config.rs).
    for var in ["OTA_WIFI_SSID", "OTA_WIFI_PASS", "OTA_FIRMWARE_URL"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
