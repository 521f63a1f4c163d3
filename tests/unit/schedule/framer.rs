use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::schedule::walk::Walk;

const SQUARE: &str = r##"{
    "vertices": [{"coordinates": [0, 0]}, {"coordinates": [1, 0]}, {"coordinates": [1, 1]}, {"coordinates": [0, 1]}],
    "shapes": [{"vertices": [0, 1, 2, 3], "color": 0}],
    "palette": ["#000"],
    "theme": "abcdefghijklmnopqrstuvwxyz0123456789"
}"##;

const TWO_SQUARES: &str = r##"{
    "vertices": [
        {"coordinates": [0, 0]}, {"coordinates": [1, 0]},
        {"coordinates": [1, 1]}, {"coordinates": [0, 1]},
        {"coordinates": [2, 1]}, {"coordinates": [2, 2]},
        {"coordinates": [1, 2]}
    ],
    "shapes": [
        {"vertices": [0, 1, 2, 3], "color": 0},
        {"vertices": [2, 4, 5, 6], "color": 0}
    ],
    "palette": ["#000"]
}"##;

fn frames_for(json: &str, final_hold: u64, clock: &mut FrameClock) -> Vec<Frame> {
    let walk = Walk::new(Puzzle::from_json_str(json).unwrap(), StdRng::seed_from_u64(11));
    Framer::new(walk, FramerOpts::default(), final_hold, clock).collect()
}

fn assert_contiguous(frames: &[Frame], start: u64) -> u64 {
    let mut next = start;
    for f in frames {
        assert_eq!(f.frame_no, FrameNo(next));
        assert!(f.repeats >= 1);
        next += f.repeats;
    }
    next
}

#[test]
fn two_shape_walk_gains_sixty_ramp_frames() {
    let mut clock = FrameClock::new();
    let frames = frames_for(TWO_SQUARES, 300, &mut clock);
    assert_eq!(frames.len(), 9 + 60);

    assert_eq!(frames[30].repeats, 30);
    assert_eq!(frames[30].appear(), Some(1.0));
    let first_decay = frames.iter().position(|f| f.decay().is_some()).unwrap();
    assert_eq!(first_decay, 31 + 7);
    assert_eq!(frames[first_decay].repeats, 300);
    assert_eq!(frames[first_decay].decay(), Some(0.0));

    let others = frames
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 30 && *i != first_decay)
        .all(|(_, f)| f.repeats == 1);
    assert!(others);

    let end = assert_contiguous(&frames, 0);
    assert_eq!(end, 69 - 2 + 30 + 300);
    assert_eq!(clock.total(), end);
}

#[test]
fn appear_ramp_reuses_the_untouched_state() {
    let mut clock = FrameClock::new();
    let frames = frames_for(SQUARE, 60, &mut clock);
    for (i, f) in frames[..31].iter().enumerate() {
        assert_eq!(f.appear(), Some(i as f64 / 30.0));
        assert_eq!(f.text_reveal, Some(i));
        assert_eq!(f.puzzle.shapes()[0].sides_revealed, 0);
        assert_eq!(f.remaining, 1);
    }
}

#[test]
fn decay_ramp_reuses_the_solved_state_and_truncates_text() {
    let mut clock = FrameClock::new();
    let frames = frames_for(SQUARE, 60, &mut clock);
    let decay = &frames[frames.len() - 31..];
    for (i, f) in decay.iter().enumerate() {
        assert_eq!(f.decay(), Some(i as f64 / 30.0));
        assert!(f.puzzle.is_solved());
        assert_eq!(f.remaining, 0);
        if i == 0 {
            assert_eq!(f.text_reveal, None);
        } else {
            assert_eq!(f.text_reveal, Some(30 - i));
        }
    }
}

#[test]
fn single_shape_walk_passes_three_middle_frames() {
    let mut clock = FrameClock::new();
    let frames = frames_for(SQUARE, 60, &mut clock);
    assert_eq!(frames.len(), 5 + 60);
    let middle = frames
        .iter()
        .filter(|f| f.ramp.is_none())
        .map(|f| f.puzzle.shapes()[0].sides_revealed)
        .collect::<Vec<_>>();
    assert_eq!(middle, vec![1, 2, 3]);
}

#[test]
fn solved_puzzle_yields_only_ramp_frames() {
    let solved = SQUARE.replace("\"color\": 0}", "\"color\": 0, \"isPreDrawn\": true}");
    let mut clock = FrameClock::new();
    let frames = frames_for(&solved, 60, &mut clock);
    assert_eq!(frames.len(), 62);
    assert!(frames.iter().all(|f| f.ramp.is_some()));
    assert_contiguous(&frames, 0);
}

#[test]
fn numbering_continues_across_files() {
    let mut clock = FrameClock::new();
    let a = frames_for(SQUARE, 60, &mut clock);
    let after_a = clock.total();
    let b = frames_for(TWO_SQUARES, 60, &mut clock);
    let c = frames_for(SQUARE, 60, &mut clock);

    let end_a = assert_contiguous(&a, 0);
    assert_eq!(end_a, after_a);
    let end_b = assert_contiguous(&b, end_a);
    let end_c = assert_contiguous(&c, end_b);
    assert_eq!(end_c, clock.total());
}

#[test]
fn frame_numbers_cover_repeats() {
    let mut clock = FrameClock::new();
    let frames = frames_for(SQUARE, 4, &mut clock);
    let held = &frames[30];
    let covered = held.frame_numbers().collect::<Vec<_>>();
    assert_eq!(covered.len(), 30);
    assert_eq!(covered[0], FrameNo(30));
    assert_eq!(covered[29], FrameNo(59));
}

#[test]
fn final_hold_depends_on_file_count() {
    let opts = FramerOpts::default();
    assert_eq!(opts.final_hold(1), 300);
    assert_eq!(opts.final_hold(2), 60);
}

#[test]
fn empty_raw_sequence_yields_nothing() {
    let mut clock = FrameClock::new();
    let frames = Framer::new(std::iter::empty(), FramerOpts::default(), 60, &mut clock)
        .collect::<Vec<_>>();
    assert!(frames.is_empty());
    assert_eq!(clock.total(), 0);
}
