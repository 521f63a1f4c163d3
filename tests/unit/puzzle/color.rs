use super::*;

#[test]
fn short_form_duplicates_nibbles() {
    assert_eq!(parse_hex("#fff").unwrap(), Rgb8::WHITE);
    assert_eq!(parse_hex("#1a9").unwrap(), Rgb8::new(0x11, 0xaa, 0x99));
}

#[test]
fn long_form_is_case_insensitive() {
    assert_eq!(parse_hex("#FF3366").unwrap(), Rgb8::new(0xff, 0x33, 0x66));
    assert_eq!(parse_hex("#ff3366").unwrap(), Rgb8::new(0xff, 0x33, 0x66));
}

#[test]
fn rejects_bad_lengths_and_digits() {
    assert!(parse_hex("#ffff").is_err());
    assert!(parse_hex("#12345").is_err());
    assert!(parse_hex("#zzzzzz").is_err());
    assert!(parse_hex("").is_err());
}

#[test]
fn palette_errors_name_the_entry() {
    let err = parse_palette(&["#000".to_owned(), "nope".to_owned()]).unwrap_err();
    assert!(err.to_string().contains("palette[1]"));
}
