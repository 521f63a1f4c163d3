use super::*;

fn opts(profile: EncodeProfile) -> EncodeOpts {
    EncodeOpts {
        binary: PathBuf::from("ffmpeg"),
        fps: 60,
        profile,
        out_path: PathBuf::from("output/vertex_all.mp4"),
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

#[test]
fn default_profile_args() {
    let args = strings(&encoder_args(Path::new("frames"), &opts(EncodeProfile::Default)));
    let frames = Path::new("frames").join("frame_%08d.png");
    assert_eq!(
        args,
        vec![
            "-y".to_owned(),
            "-hide_banner".to_owned(),
            "-framerate".to_owned(),
            "60".to_owned(),
            "-i".to_owned(),
            frames.to_string_lossy().into_owned(),
            "output/vertex_all.mp4".to_owned(),
        ]
    );
}

#[test]
fn nvenc_profile_adds_hardware_flags_before_output() {
    let args = strings(&encoder_args(Path::new("frames"), &opts(EncodeProfile::Nvenc)));
    let at = args.iter().position(|a| a == "h264_nvenc").unwrap();
    assert_eq!(args[at - 1], "-c:v");
    assert!(args.contains(&"yuv444p".to_owned()));
    assert!(args.contains(&"high444p".to_owned()));
    assert_eq!(args.last().unwrap(), "output/vertex_all.mp4");
}

#[test]
fn output_names_follow_the_target() {
    let out = Path::new("output");
    assert_eq!(
        output_path_for(&Target::Single(PathBuf::from("data/2020/2020-02-03.json")), out),
        out.join("vertex_2020-02-03.json.mp4")
    );
    assert_eq!(
        output_path_for(&Target::Range("2020-01-01".into(), "2020-06-30".into()), out),
        out.join("vertex_2020-01-01_2020-06-30.mp4")
    );
    assert_eq!(output_path_for(&Target::All, out), out.join("vertex_all.mp4"));
}

#[test]
fn daily_video_is_filed_by_year_and_month() {
    assert_eq!(daily_video_rel("2023-07-14"), "2023/07/2023-07-14.mp4");
}

#[cfg(unix)]
#[test]
fn encoder_failure_carries_exit_status() {
    let mut o = opts(EncodeProfile::Default);
    o.binary = PathBuf::from("false");
    o.out_path = PathBuf::from("target/unit_encode_ffmpeg/out.mp4");
    let err = encode_frames(Path::new("target/unit_encode_ffmpeg"), &o).unwrap_err();
    assert_eq!(err.encoder_status(), Some(1));
}

#[test]
fn missing_encoder_is_an_encode_error_without_status() {
    let mut o = opts(EncodeProfile::Default);
    o.binary = PathBuf::from("target/definitely-not-an-encoder");
    o.out_path = PathBuf::from("target/unit_encode_ffmpeg_missing/out.mp4");
    let err = encode_frames(Path::new("target"), &o).unwrap_err();
    assert!(matches!(err, VertexError::Encode { status: None, .. }));
    assert!(!is_encoder_available(&o.binary));
}
