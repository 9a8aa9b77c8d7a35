use beatline_model::TimingInfo;
use beatline_timing::{TimingCurve, VelocityTiming};
use proptest::prelude::*;

// SV values on a 0.25 grid and integral times keep the rounded offsets table
// exact, so monotonicity can be checked without tolerance.
fn arb_velocity() -> impl Strategy<Value = VelocityTiming> {
    let svs = prop::collection::vec((0u32..100_000, 0u32..40), 0..16);
    (svs, 0u32..16).prop_map(|(mut svs, base)| {
        svs.sort_by_key(|(t, _)| *t);
        VelocityTiming::new(
            vec![TimingInfo::bpm(0.0, 120.0)],
            svs.into_iter()
                .map(|(t, v)| TimingInfo::sv(t as f64, v as f64 * 0.25))
                .collect(),
            base as f64 * 0.25,
        )
    })
}

proptest! {
    #[test]
    fn velocity_offsets_never_decrease(
        curve in arb_velocity(),
        a in 0u32..120_000,
        b in 0u32..120_000,
    ) {
        let (t1, t2) = (a.min(b) as f64, a.max(b) as f64);
        prop_assert!(curve.offset_at(t1) <= curve.offset_at(t2));
    }

    #[test]
    fn static_offsets_are_strictly_increasing(a in -10_000i32..120_000, step in 1i32..5_000) {
        let curve = TimingCurve::Static(beatline_timing::StaticTiming::new(vec![
            TimingInfo::bpm(0.0, 150.0),
        ]));
        prop_assert!(curve.offset_at(a as f64) < curve.offset_at((a + step) as f64));
    }
}
