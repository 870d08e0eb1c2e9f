// Integration tests for block-state rotation and encoding

use pathforge_core::block::quarter_turns;
use pathforge_core::{BlockPos, BlockState, BlockStateError, PlacementInstruction};
use proptest::prelude::*;

fn stairs() -> BlockState {
    BlockState::parse("minecraft:oak_stairs[facing=north,half=bottom,shape=straight]").unwrap()
}

#[test]
fn test_rotation_quantizes_yaw() {
    assert_eq!(quarter_turns(0.0), 0);
    assert_eq!(quarter_turns(44.0), 0);
    assert_eq!(quarter_turns(46.0), 1);
    assert_eq!(quarter_turns(-90.0), 3);
    assert_eq!(quarter_turns(180.0), 2);
    assert_eq!(quarter_turns(-180.0), 2);
}

#[test]
fn test_stairs_rotate_clockwise() {
    let rotated = stairs().with_rotation(90.0).unwrap();
    assert_eq!(rotated.property("facing"), Some("east"));
    assert_eq!(rotated.property("shape"), Some("straight"));
    assert_eq!(rotated.property("half"), Some("bottom"));
    assert_eq!(stairs().property("facing"), Some("north"));
}

#[test]
fn test_fence_connections_rotate() {
    let fence =
        BlockState::parse("minecraft:oak_fence[east=false,north=true,south=false,west=true]")
            .unwrap();
    let rotated = fence.rotated_quarter_turns(1).unwrap();
    assert_eq!(rotated.property("east"), Some("true"));
    assert_eq!(rotated.property("north"), Some("true"));
    assert_eq!(rotated.property("south"), Some("false"));
    assert_eq!(rotated.property("west"), Some("false"));
}

#[test]
fn test_rail_and_log_rotation() {
    let rail = BlockState::parse("minecraft:rail[shape=north_east]").unwrap();
    assert_eq!(
        rail.rotated_quarter_turns(1).unwrap().property("shape"),
        Some("south_east")
    );
    let log = BlockState::parse("minecraft:oak_log[axis=x]").unwrap();
    assert_eq!(log.rotated_quarter_turns(1).unwrap().property("axis"), Some("z"));
    assert_eq!(log.rotated_quarter_turns(2).unwrap().property("axis"), Some("x"));
}

#[test]
fn test_invalid_rotation_values_are_rejected() {
    let sign = BlockState::parse("minecraft:oak_sign[rotation=20]").unwrap();
    assert!(matches!(
        sign.rotated_quarter_turns(1),
        Err(BlockStateError::InvalidRotation { .. })
    ));
    let pillar = BlockState::parse("minecraft:quartz_pillar[axis=w]").unwrap();
    assert!(pillar.with_rotation(90.0).is_err());
}

#[test]
fn test_malformed_encodings() {
    assert!(BlockState::parse("").is_err());
    assert!(BlockState::parse("minecraft:stone[").is_err());
    assert!(BlockState::parse("minecraft:stone[facing]").is_err());
    assert!(BlockState::parse("minecraft:stone[a=1,a=2]").is_err());
    assert!(BlockState::parse("minecraft:stone[]").unwrap().properties().next().is_none());
}

#[test]
fn test_placement_instruction_holds_state() {
    let instruction = PlacementInstruction::new(BlockPos::new(1, 64, -3), stairs());
    assert_eq!(instruction.pos, BlockPos::new(1, 64, -3));
    assert_eq!(instruction.state, stairs());
}

proptest! {
    #[test]
    fn four_quarter_turns_restore_state(facing in 0usize..4, rotation in 0u8..16, turns in 0u8..4) {
        let facing = ["north", "east", "south", "west"][facing];
        let text = format!("minecraft:test[facing={facing},rotation={rotation}]");
        let state = BlockState::parse(&text).unwrap();

        let mut rotated = state.clone();
        for _ in 0..4 {
            rotated = rotated.rotated_quarter_turns(turns).unwrap();
        }
        prop_assert_eq!(rotated, state);
    }

    #[test]
    fn display_reparses_to_same_state(facing in 0usize..6, waterlogged in any::<bool>()) {
        let facing = ["north", "east", "south", "west", "up", "down"][facing];
        let state = BlockState::new("minecraft:observer")
            .with_property("facing", facing)
            .with_property("waterlogged", if waterlogged { "true" } else { "false" });
        let reparsed = BlockState::parse(&state.to_string()).unwrap();
        prop_assert_eq!(reparsed, state);
    }
}
