use super::*;

#[test]
fn test_format_number_comma() {
    let options = NumberFormatOptions {
        use_comma: true,
        ..NumberFormatOptions::default()
    };

    assert_eq!(format_number(1000u64, &options), "1,000");
    assert_eq!(format_number(1000000u64, &options), "1,000,000");
    assert_eq!(format_number(123u64, &options), "123");
}

#[test]
fn test_format_number_comma_locale() {
    let options = NumberFormatOptions {
        use_comma: true,
        locale: "de".to_string(),
        ..NumberFormatOptions::default()
    };

    assert_eq!(format_number(1234567u64, &options), "1.234.567");
}

#[test]
fn test_format_number_human() {
    let options = NumberFormatOptions {
        use_human: true,
        decimal_places: 1,
        ..NumberFormatOptions::default()
    };

    assert_eq!(format_number(100u64, &options), "100");
    assert_eq!(format_number(1500u64, &options), "1.5k");
    assert_eq!(format_number(1_500_000u64, &options), "1.5m");
    assert_eq!(format_number(1_500_000_000u64, &options), "1.5b");
    assert_eq!(format_number(1_500_000_000_000u64, &options), "1.5t");
}

#[test]
fn test_format_number_plain() {
    let options = NumberFormatOptions::default();
    assert_eq!(format_number(1000u64, &options), "1000");
    assert_eq!(format_number(7u32, &options), "7");
}

#[test]
fn test_warn_once_deduplicates() {
    assert!(warn_once("duplicate warning"));
    assert!(!warn_once("duplicate warning"));
    assert!(warn_once(String::from("another warning")));

    let warned = WARNED_MESSAGES.get().unwrap().lock().unwrap();
    assert!(warned.contains("duplicate warning"));
    assert!(warned.contains("another warning"));
}

#[test]
fn test_get_local_timezone_is_non_empty() {
    assert!(!get_local_timezone().is_empty());
}
