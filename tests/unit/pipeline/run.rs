use super::*;
use crate::render::text::FontSource;

const SQUARE: &str = r##"{
    "vertices": [{"coordinates": [0, 0]}, {"coordinates": [1, 0]}, {"coordinates": [1, 1]}, {"coordinates": [0, 1]}],
    "shapes": [{"vertices": [0, 1, 2, 3], "color": 0}],
    "palette": ["#c33"],
    "theme": "one square"
}"##;

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn small_opts(frames_dir: PathBuf) -> PipelineOpts {
    PipelineOpts {
        frames_dir,
        threads: Some(2),
        channel_capacity: 4,
        framer: FramerOpts {
            ramp_steps: 2,
            appear_hold: 2,
            final_hold_single: 3,
            final_hold_batch: 2,
        },
        render: RenderOpts {
            canvas_px: 40,
            fit_width: 32,
            fit_height: 20,
            out_width: 40,
            out_height: 24,
            font: FontSource::Disabled,
            ..RenderOpts::default()
        },
        ..PipelineOpts::default()
    }
}

#[test]
fn estimate_counts_frames_and_days() {
    let dir = scratch("unit_pipeline_run_estimate");
    let a = dir.join("2020-01-01.json");
    let b = dir.join("2020-01-01-b.json");
    std::fs::write(&a, SQUARE).unwrap();
    std::fs::write(&b, SQUARE).unwrap();

    let one = estimate(std::slice::from_ref(&a), &FramerOpts::default(), 1).unwrap();
    // 31 appear + 3 walk + 31 decay frames, with holds of 30 and 300.
    assert_eq!(one.frames, 65 - 2 + 30 + 300);
    assert_eq!(one.days, 1);

    let two = estimate(&[a, b], &FramerOpts::default(), 1).unwrap();
    assert_eq!(two.frames, 2 * (65 - 2 + 30 + 60));
    assert_eq!(two.files, 2);
    assert_eq!(two.days, 1);
}

#[test]
fn duration_is_formatted_as_hours_minutes_seconds() {
    let e = Estimate {
        files: 1,
        frames: 60 * 3725,
        days: 1,
    };
    assert_eq!(e.duration_hms(60), "1:02:05");
    let short = Estimate {
        frames: 59,
        ..e
    };
    assert_eq!(short.duration_hms(60), "0:00:00");
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(1)).is_ok());
}

#[test]
fn stale_frames_are_cleared_but_other_files_kept() {
    let dir = scratch("unit_pipeline_run_prepare");
    std::fs::write(dir.join("frame_00000003.png"), b"old").unwrap();
    std::fs::write(dir.join("frame_00000004.png.partial"), b"old").unwrap();
    std::fs::write(dir.join("notes.txt"), b"keep").unwrap();

    prepare_frames_dir(&dir).unwrap();
    assert!(!dir.join("frame_00000003.png").exists());
    assert!(!dir.join("frame_00000004.png.partial").exists());
    assert!(dir.join("notes.txt").exists());
}

#[test]
fn writes_every_frame_number_exactly_once() {
    let dir = scratch("unit_pipeline_run_frames");
    let input = dir.join("2021-05-06.json");
    std::fs::write(&input, SQUARE).unwrap();
    let frames_dir = dir.join("frames");

    let stats = render_frames(&[input], &small_opts(frames_dir.clone())).unwrap();
    // 3 appear + 3 walk + 3 decay; holds of 2 and 3.
    assert_eq!(stats.jobs, 9);
    assert_eq!(stats.frames_total, 9 - 2 + 2 + 3);
    assert_eq!(stats.frames_written, stats.frames_total);
    assert_eq!(stats.files, 1);

    let count = std::fs::read_dir(&frames_dir).unwrap().count() as u64;
    assert_eq!(count, stats.frames_total);
    for n in 0..stats.frames_total {
        assert!(frames_dir.join(crate::foundation::core::FrameNo(n).file_name()).is_file());
    }
}

#[test]
fn cancelled_run_admits_no_files() {
    let dir = scratch("unit_pipeline_run_cancel");
    let input = dir.join("2021-05-06.json");
    std::fs::write(&input, SQUARE).unwrap();
    let opts = small_opts(dir.join("frames"));
    opts.cancel.cancel();

    let stats = render_frames(&[input], &opts).unwrap();
    assert_eq!(stats, RunStats::default());
}

#[test]
fn bad_input_fails_before_any_frame_is_written() {
    let dir = scratch("unit_pipeline_run_bad");
    let good = dir.join("a.json");
    let bad = dir.join("b.json");
    std::fs::write(&good, SQUARE).unwrap();
    std::fs::write(&bad, SQUARE.replace("\"color\": 0", "\"color\": 5")).unwrap();
    let frames_dir = dir.join("frames");

    assert!(render_frames(&[good, bad], &small_opts(frames_dir.clone())).is_err());
    assert!(!frames_dir.exists());
}

#[test]
fn empty_file_list_is_rejected() {
    assert!(render_frames(&[], &small_opts(PathBuf::from("target/unused"))).is_err());
}

#[test]
fn progress_survives_a_poisoned_lock() {
    let progress = Mutex::new(Progress::new(Duration::from_secs(60)));
    std::thread::scope(|s| {
        let res = s
            .spawn(|| {
                let _guard = progress.lock().unwrap();
                panic!("worker died mid-report");
            })
            .join();
        assert!(res.is_err());
    });
    assert!(progress.is_poisoned());

    assert!(report_progress(&progress, || "first".to_owned()));
    assert!(!report_progress(&progress, || "second".to_owned()));
}
