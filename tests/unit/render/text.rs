use super::*;

#[test]
fn thousands_are_grouped() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1000), "1,000");
    assert_eq!(group_thousands(1234567), "1,234,567");
    assert_eq!(group_thousands(100000), "100,000");
}

#[test]
fn prefixes_count_characters_not_bytes() {
    assert_eq!(char_prefix("héllo", 2), "hé");
    assert_eq!(char_prefix("héllo", 0), "");
    assert_eq!(char_prefix("héllo", 50), "héllo");
}

#[test]
fn disabled_font_source_loads_nothing() {
    assert!(load_font(&FontSource::Disabled).unwrap().is_none());
}

#[test]
fn missing_font_file_is_an_error() {
    let src = FontSource::File(std::path::PathBuf::from("target/definitely/not/a/font.ttf"));
    assert!(load_font(&src).is_err());
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let bytes = FontBytes::new(vec![0u8; 16], 0);
    assert!(TextPainter::new(&bytes).is_err());
}

#[test]
fn font_bytes_report_their_size() {
    assert_eq!(FontBytes::new(vec![1, 2, 3], 0).byte_len(), 3);
}

#[test]
fn layout_family_matches_the_drawn_collection_face() {
    let families = [("Regular", vec![0, 2]), ("Condensed", vec![1]), ("Mono", vec![3])];
    assert_eq!(family_for_face(&families, 1), Some("Condensed"));
    assert_eq!(family_for_face(&families, 2), Some("Regular"));
    assert_eq!(family_for_face(&families, 3), Some("Mono"));
    // A face index the collection does not list falls back to its first family.
    assert_eq!(family_for_face(&families, 9), Some("Regular"));
    assert_eq!(family_for_face::<&str>(&[], 0), None);
}
