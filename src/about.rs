pub fn about() -> Vec<String> {
    vec![
        "Control panel for the FEMTO LUCI-10 USB interface.".to_string(),
        "All hardware access goes through the vendor driver library.".to_string(),
        "\n".to_string(),
        format!("Version {}", env!("CARGO_PKG_VERSION")),
        "This program comes with ABSOLUTELY NO WARRANTY.".to_string(),
    ]
}
