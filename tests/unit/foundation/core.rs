use super::*;

#[test]
fn frame_file_names_are_zero_padded() {
    assert_eq!(FrameNo(0).file_name(), "frame_00000000.png");
    assert_eq!(FrameNo(1234).file_name(), "frame_00001234.png");
    assert_eq!(FrameNo(7).offset(3), FrameNo(10));
}

#[test]
fn fade_to_white_endpoints() {
    let c = Rgb8::new(10, 100, 200);
    assert_eq!(c.fade_to_white(0.0), c);
    assert_eq!(c.fade_to_white(1.0), Rgb8::WHITE);
    assert_eq!(c.fade_to_white(5.0), Rgb8::WHITE);
}

#[test]
fn fade_to_white_truncates_like_integer_cast() {
    let c = Rgb8::new(0, 0, 0).fade_to_white(0.5);
    assert_eq!(c, Rgb8::new(127, 127, 127));
}

#[test]
fn frame_numbers_start_at_zero() {
    assert_eq!(FrameNo::default(), FrameNo(0));
    assert_eq!(FrameNo::default().file_name(), "frame_00000000.png");
}
