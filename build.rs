fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOILGUARD_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SOILGUARD_WIFI_PASSWORD");

    // Only the firmware build needs the ESP-IDF environment; host tests
    // compile without the `espidf` feature and skip it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
