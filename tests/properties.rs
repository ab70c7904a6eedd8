use bridgesim::material::MATERIALS;
use bridgesim::scoring::{final_score, preview_score, CrossingTally, Outcome};
use bridgesim::strain::{signed_strain, ForceKind, StrainReading};
use bridgesim::vehicle::{clamp_load_weight, MAX_LOAD_WEIGHT, MIN_LOAD_WEIGHT};
use bridgesim::{point, Bridge, BuildError};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn tally(total: usize, broken: usize, cost: f64, load: f64, elapsed: f64) -> CrossingTally {
    CrossingTally {
        total_beams: total,
        broken_beams: broken.min(total),
        material_cost: cost,
        load_weight: load,
        elapsed_ms: elapsed,
    }
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn load_weight_is_always_in_range(weight in any::<f64>()) {
        let clamped = clamp_load_weight(weight);
        prop_assert!((MIN_LOAD_WEIGHT..=MAX_LOAD_WEIGHT).contains(&clamped));

        let mut bridge = Bridge::default();
        let stored = bridge.set_load_weight(weight).expect("idle bridge");
        prop_assert_eq!(stored, bridge.load_weight());
        prop_assert!((MIN_LOAD_WEIGHT..=MAX_LOAD_WEIGHT).contains(&stored));
    }

    #[test]
    fn failure_pays_for_surviving_beams(total in 0_usize..200, broken in 0_usize..200) {
        let tally = tally(total, broken, 10.0, 60.0, 5000.0);
        let expected = 500 + 50 * u32::try_from(tally.surviving_beams()).expect("small");
        prop_assert_eq!(final_score(Outcome::Failure, &tally), expected);
    }

    #[test]
    fn breaking_more_beams_never_helps_a_success(
        total in 1_usize..100,
        broken in 0_usize..100,
        cost in prop::sample::select(vec![5.0, 8.0, 10.0]),
        load in 20.0_f64..=100.0,
        elapsed in 0.0_f64..60_000.0,
    ) {
        let fewer = final_score(Outcome::Success, &tally(total, broken, cost, load, elapsed));
        let more = final_score(Outcome::Success, &tally(total, broken + 1, cost, load, elapsed));
        prop_assert!(more <= fewer);
    }

    #[test]
    fn preview_rewards_load_and_penalises_beams(
        beams in 0_usize..500,
        cost in prop::sample::select(vec![5.0, 8.0, 10.0]),
        load in 20.0_f64..=100.0,
    ) {
        let score = preview_score(beams, cost, load);
        prop_assert!(f64::from(score) >= (load * 5.0).round());
        prop_assert!(preview_score(beams + 1, cost, load) <= score);
    }

    #[test]
    fn strain_sign_follows_length_change(original in 1.0_f64..400.0, current in 0.0_f64..800.0) {
        let reading = StrainReading::measure(original, current, 1000.0);
        let expected = if current > original {
            ForceKind::Tension
        } else if current < original {
            ForceKind::Compression
        } else {
            ForceKind::Neutral
        };
        prop_assert_eq!(reading.force_kind(), expected);
        prop_assert!(reading.stress >= 0.0);
        prop_assert_eq!(reading.signed_strain, signed_strain(original, current));
    }

    #[test]
    fn beams_exist_only_within_material_span(
        index in 0_usize..MATERIALS.len(),
        x in 210.0_f64..990.0,
        y in 100.0_f64..540.0,
    ) {
        let material = MATERIALS[index];
        let mut bridge = Bridge::default();
        bridge.select_material(material).expect("idle bridge");
        let (left, _) = bridge.anchors();
        let joint = bridge.add_joint(point(x, y)).expect("idle bridge");
        let length = point(200.0, 450.0).distance_to(point(x, y));

        match bridge.add_beam(left, joint) {
            Ok(beam) => {
                prop_assert!(length <= material.max_length);
                let state = bridge.beam(beam).expect("beam");
                prop_assert_eq!(state.original_length(), length);
                prop_assert!(state.original_length() <= state.material().max_length);
            }
            Err(BuildError::BeamTooLong { length: rejected, max_length, .. }) => {
                prop_assert!(rejected > max_length);
                prop_assert_eq!(max_length, material.max_length);
                prop_assert_eq!(bridge.beam_count(), 0);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
