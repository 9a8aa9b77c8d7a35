use beatline_model::{Chart, NoteInfo, TimingInfo};
use beatline_play::note::NoteSignal;
use beatline_play::note_pool::POOL_CAPACITY;
use beatline_play::{
    Judge, MsWindows, Note, NoteDesc, NoteImageType, NoteResult, NoteState, NoteVisualPool,
    ReplayHitKind, create_replay,
};
use proptest::prelude::*;

fn arb_judge() -> impl Strategy<Value = Judge> {
    prop_oneof![
        Just(Judge::BeatBased),
        (1.0f64..60.0, 0.0f64..80.0, 0.0f64..60.0, 0.0f64..30.0).prop_map(
            |(cool, good, bad, miss)| {
                let good = cool + good;
                let bad = good + bad;
                Judge::MsBased(MsWindows {
                    cool,
                    good,
                    bad,
                    miss: bad + miss,
                })
            }
        ),
    ]
}

fn arb_image_type() -> impl Strategy<Value = NoteImageType> {
    prop_oneof![
        (0usize..7).prop_map(NoteImageType::lane),
        (0usize..7).prop_map(NoteImageType::hold_lane),
        Just(NoteImageType::TrailUp),
        Just(NoteImageType::TrailDown),
    ]
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Tick(f64),
    Press(f64),
    Release(f64),
}

fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(
        prop_oneof![
            (0.0f64..50.0).prop_map(Action::Tick),
            (-400.0f64..400.0).prop_map(Action::Press),
            (-400.0f64..400.0).prop_map(Action::Release),
        ],
        1..40,
    )
}

fn desc(hold: bool) -> NoteDesc {
    NoteDesc {
        lane: 0,
        start_time: 1000.0,
        start_bpm: 120.0,
        initial_track_position: 100_000.0,
        tail: hold.then_some(beatline_play::note::HoldTail {
            end_time: 1600.0,
            end_track_position: 160_000.0,
            end_bpm: 120.0,
        }),
        sound: None,
    }
}

proptest! {
    #[test]
    fn windows_nest(judge in arb_judge(), bpm in 30.0f64..400.0) {
        let w = judge.windows(bpm);
        prop_assert!(w.cool <= w.good);
        prop_assert!(w.good <= w.bad);
        prop_assert!(w.bad <= w.miss);
    }

    #[test]
    fn results_widen_with_distance(judge in arb_judge(), bpm in 60.0f64..300.0, a in 0.0f64..400.0, b in 0.0f64..400.0) {
        let (near, far) = (a.min(b), a.max(b));
        let near = judge.calculate_result(1000.0, bpm, 1000.0 + near);
        let far = judge.calculate_result(1000.0, bpm, 1000.0 + far);
        if far.accepted {
            prop_assert!(near.accepted);
            prop_assert!(near.result >= far.result);
        }
    }

    #[test]
    fn pool_never_exceeds_capacity(ops in prop::collection::vec((arb_image_type(), any::<bool>()), 0..400)) {
        let mut pool = NoteVisualPool::new();
        let mut out = Vec::new();
        for (image_type, take) in ops {
            if take {
                out.push(pool.depool(image_type));
            } else if let Some(handle) = out.pop() {
                pool.repool(handle);
            }
            prop_assert!(pool.idle_count(image_type) <= POOL_CAPACITY);
        }
        for handle in out.drain(..) {
            pool.repool(handle);
        }
        for lane in 0..7 {
            prop_assert!(pool.idle_count(NoteImageType::lane(lane)) <= POOL_CAPACITY);
            prop_assert!(pool.idle_count(NoteImageType::hold_lane(lane)) <= POOL_CAPACITY);
        }
    }

    /// A note that has scored its head never takes another press, and
    /// releases only land on pressed or broken holds.
    #[test]
    fn finished_notes_are_never_rehit(hold in any::<bool>(), actions in arb_actions()) {
        let judge = Judge::BeatBased;
        let mut pool = NoteVisualPool::new();
        let mut note = Note::default();
        note.load(desc(hold), 0.0, &mut pool);

        let mut time = 600.0;
        let mut signals = Vec::new();
        for action in actions {
            match action {
                Action::Tick(dt) => {
                    time += dt;
                    note.update(&judge, time, &mut signals);
                }
                Action::Press(offset) => {
                    let before = note.state();
                    let judgement = note.check_hit(&judge, time + offset);
                    if matches!(
                        before,
                        NoteState::NormalNotePassed
                            | NoteState::HoldOnHolding
                            | NoteState::HoldPassed
                            | NoteState::DoRemove
                    ) {
                        prop_assert!(!judgement.accepted);
                    }
                    if judgement.accepted {
                        note.on_hit(judgement.result, time + offset, &mut signals);
                    }
                }
                Action::Release(offset) => {
                    let before = note.state();
                    let judgement = note.check_release(&judge, time + offset);
                    if judgement.accepted {
                        prop_assert!(matches!(
                            before,
                            NoteState::HoldOnHolding | NoteState::HoldMissedActive
                        ));
                        note.on_release(judgement.result, time + offset, &mut signals);
                    }
                }
            }
        }

        let head_scores = signals
            .iter()
            .filter(|s| matches!(s, NoteSignal::Score(info) if !info.is_release))
            .count();
        prop_assert!(head_scores <= 1);
    }

    #[test]
    fn autoplay_events_are_sorted_and_paired(
        starts in prop::collection::vec((0usize..7, 0u32..20_000), 1..60),
    ) {
        let notes = starts
            .into_iter()
            .map(|(lane, t)| NoteInfo::normal(lane, f64::from(t)))
            .collect();
        let mut chart = Chart::new(notes, vec![TimingInfo::bpm(0.0, 150.0)], Vec::new());
        chart.prepare().unwrap();

        let replay = create_replay(&chart, &Judge::BeatBased);
        prop_assert_eq!(replay.len(), chart.notes.len() * 2);
        for pair in replay.windows(2) {
            prop_assert!(pair[0].time <= pair[1].time);
            if pair[0].time == pair[1].time {
                prop_assert!(
                    !(pair[0].kind == ReplayHitKind::KeyDown && pair[1].kind == ReplayHitKind::KeyUp)
                );
            }
        }

        let downs = replay.iter().filter(|e| e.kind == ReplayHitKind::KeyDown).count();
        prop_assert_eq!(downs, chart.notes.len());
        for down in replay.iter().filter(|e| e.kind == ReplayHitKind::KeyDown) {
            let judgement = Judge::BeatBased.calculate_result(down.time, 150.0, down.time);
            prop_assert_eq!(judgement.result, NoteResult::Cool);
        }
    }
}
