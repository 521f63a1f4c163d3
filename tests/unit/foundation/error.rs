use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VertexError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        VertexError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        VertexError::encode(Some(1), "x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        VertexError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn encoder_status_is_only_reported_for_encode_errors() {
    assert_eq!(VertexError::encode(Some(3), "boom").encoder_status(), Some(3));
    assert_eq!(VertexError::encode(None, "spawn").encoder_status(), None);
    assert_eq!(VertexError::validation("x").encoder_status(), None);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VertexError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: VertexError = e.into();
    assert!(matches!(err, VertexError::Serde(_)));
}
