//! Property-based tests for rig evaluation.
//!
//! Run with: cargo test -p rig-physics -- proptest

use proptest::prelude::*;
use rig_physics::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Mobility, delay, acceleration and radius of one simulated particle.
fn arb_particle() -> impl Strategy<Value = ParticleDefinition> {
    (0.1f32..1.0, 0.1f32..1.5, 0.1f32..3.0, 0.2f32..5.0)
        .prop_map(|(m, d, a, r)| ParticleDefinition::new(m, d, a, r))
}

/// A single chain fed by three inputs, with an angle output on every segment.
fn arb_definition() -> impl Strategy<Value = RigDefinition> {
    (prop::collection::vec(arb_particle(), 1..6), 0.0f32..100.0, any::<bool>()).prop_map(
        |(particles, weight, inverted)| {
            let mut angle = InputDefinition::new("ParamAngle", SourceComponent::Angle, weight);
            if inverted {
                angle = angle.inverted();
            }

            let mut chain = SubRigDefinition::new("chain", Normalization::default())
                .with_input(InputDefinition::new("ParamX", SourceComponent::TranslationX, 100.0))
                .with_input(InputDefinition::new("ParamY", SourceComponent::TranslationY, 50.0))
                .with_input(angle)
                .with_particle(ParticleDefinition::anchor());

            for (i, particle) in particles.into_iter().enumerate() {
                chain = chain
                    .with_particle(particle)
                    .with_output(OutputDefinition::new("ParamOut", i + 1, SourceComponent::Angle, 100.0));
            }

            RigDefinition::new().with_sub_rig(chain)
        },
    )
}

/// Input values and frame time for one evaluation.
fn arb_frame() -> impl Strategy<Value = (f32, f32, f32, f32)> {
    (-30.0f32..30.0, -30.0f32..30.0, -30.0f32..30.0, 0.001f32..0.1)
}

fn table() -> ParameterTable {
    let mut table = ParameterTable::new();
    table.add("ParamX", -30.0, 30.0, 0.0);
    table.add("ParamY", -30.0, 30.0, 0.0);
    table.add("ParamAngle", -30.0, 30.0, 0.0);
    table.add("ParamOut", -1.0, 1.0, 0.0);
    table
}

fn chain_lengths_hold(rig: &Rig) -> bool {
    rig.sub_rigs().iter().all(|sub_rig| {
        sub_rig
            .particles()
            .windows(2)
            .all(|pair| ((pair[1].position - pair[0].position).norm() - pair[1].radius).abs() < 1e-4)
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_chain_lengths_hold(
        definition in arb_definition(),
        frames in prop::collection::vec(arb_frame(), 1..60),
        fixed_rate in prop_oneof![Just(0.0f32), Just(30.0f32), Just(60.0f32), Just(120.0f32)],
        wind in prop::array::uniform2(-2.0f32..2.0),
    ) {
        let config = PhysicsConfig::with_fixed_rate(fixed_rate).wind(Vector2::new(wind[0], wind[1]));
        let mut rig = Rig::new(&definition, config).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut table = table();

        for (x, y, angle, delta) in frames {
            table.set_value_of("ParamX", x);
            table.set_value_of("ParamY", y);
            table.set_value_of("ParamAngle", angle);
            rig.evaluate(&mut table, delta);
            prop_assert!(chain_lengths_hold(&rig));
        }
    }

    #[test]
    fn proptest_outputs_stay_in_range(
        definition in arb_definition(),
        frames in prop::collection::vec(arb_frame(), 1..30),
    ) {
        let mut rig = Rig::new(&definition, PhysicsConfig::with_fixed_rate(60.0))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut table = table();
        rig.stabilize(&mut table);

        for (x, y, angle, delta) in frames {
            table.set_value_of("ParamX", x);
            table.set_value_of("ParamY", y);
            table.set_value_of("ParamAngle", angle);
            rig.evaluate(&mut table, delta);

            let out = table.value_of("ParamOut").unwrap_or(f32::NAN);
            prop_assert!((-1.0..=1.0).contains(&out), "ParamOut = {}", out);
        }
    }

    #[test]
    fn proptest_stabilize_keeps_chain_lengths(
        definition in arb_definition(),
        frame in arb_frame(),
        wind in prop::array::uniform2(-2.0f32..2.0),
    ) {
        let config = PhysicsConfig::default().wind(Vector2::new(wind[0], wind[1]));
        let mut rig = Rig::new(&definition, config).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut table = table();
        let (x, y, angle, _) = frame;
        table.set_value_of("ParamX", x);
        table.set_value_of("ParamY", y);
        table.set_value_of("ParamAngle", angle);

        rig.stabilize(&mut table);
        prop_assert!(chain_lengths_hold(&rig));
    }
}
