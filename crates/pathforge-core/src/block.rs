//! Immutable block-state values and placement instructions.
//!
//! A block-state is a block name plus a sorted property map, rendered in the
//! host's textual form `name[key=value,...]`. Values are `Arc`-backed, cheap
//! to clone and safe to share with the extrusion workers; every transform
//! returns a new value.

use crate::error::BlockStateError;
use crate::geometry::BlockPos;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const AIR: &str = "minecraft:air";

/// Horizontal directions in clockwise order (seen from above).
const HORIZONTAL: [&str; 4] = ["north", "east", "south", "west"];

#[derive(Debug, PartialEq, Eq, Hash)]
struct Inner {
    name: String,
    properties: BTreeMap<String, String>,
}

/// An immutable block-state.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlockState(Arc<Inner>);

impl BlockState {
    /// Create a block-state without properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_properties(name, BTreeMap::new())
    }

    /// Create a block-state from a name and a property map.
    pub fn with_properties(name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self(Arc::new(Inner {
            name: name.into(),
            properties,
        }))
    }

    /// The air block.
    pub fn air() -> Self {
        Self::new(AIR)
    }

    /// Parse the textual encoding `name[key=value,...]`.
    pub fn parse(input: &str) -> Result<Self, BlockStateError> {
        let malformed = |reason: &str| BlockStateError::Malformed {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (name, props) = match trimmed.find('[') {
            Some(open) => {
                let Some(body) = trimmed[open + 1..].strip_suffix(']') else {
                    return Err(malformed("missing closing ']'"));
                };
                (&trimmed[..open], Some(body))
            }
            None => (trimmed, None),
        };

        if name.is_empty() {
            return Err(malformed("empty block name"));
        }
        if name.contains([']', '=', ',']) {
            return Err(malformed("invalid character in block name"));
        }

        let mut properties = BTreeMap::new();
        if let Some(body) = props.filter(|b| !b.trim().is_empty()) {
            for pair in body.split(',') {
                let Some((key, value)) = pair.split_once('=') else {
                    return Err(malformed("property without '='"));
                };
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() || value.is_empty() {
                    return Err(malformed("empty property key or value"));
                }
                if properties
                    .insert(key.to_string(), value.to_string())
                    .is_some()
                {
                    return Err(malformed("duplicate property"));
                }
            }
        }

        Ok(Self::with_properties(name, properties))
    }

    /// Block name, e.g. `minecraft:oak_stairs`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Value of a property, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.0.properties.get(key).map(String::as_str)
    }

    /// All properties in key order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether this is the air block.
    pub fn is_air(&self) -> bool {
        self.0.name == AIR
    }

    /// Copy with one property replaced or added.
    pub fn with_property(&self, key: &str, value: &str) -> Self {
        let mut properties = self.0.properties.clone();
        properties.insert(key.to_string(), value.to_string());
        Self::with_properties(self.0.name.clone(), properties)
    }

    /// Whether this block occupies half a block vertically (a slab).
    pub fn is_half_height(&self) -> bool {
        self.0.name.ends_with("_slab")
            && matches!(self.property("type"), Some("bottom" | "top" | "double"))
    }

    /// Copy rotated clockwise (seen from above) by a yaw in degrees.
    ///
    /// The yaw is quantized to quarter turns. Rotated properties are
    /// `facing`, `axis`, rail `shape`, sign `rotation` and the
    /// `north`/`east`/`south`/`west` connection flags.
    pub fn with_rotation(&self, yaw_degrees: f64) -> Result<Self, BlockStateError> {
        let turns = quarter_turns(yaw_degrees);
        self.rotated_quarter_turns(turns)
    }

    /// Copy rotated clockwise by a number of quarter turns.
    pub fn rotated_quarter_turns(&self, turns: u8) -> Result<Self, BlockStateError> {
        let turns = turns % 4;
        if turns == 0 || self.0.properties.is_empty() {
            return Ok(self.clone());
        }

        let mut rotated = BTreeMap::new();
        for (key, value) in &self.0.properties {
            let (new_key, new_value) = match key.as_str() {
                "facing" => (key.clone(), rotate_facing(value, turns)?),
                "axis" => (key.clone(), rotate_axis(value, turns)?),
                "shape" if is_rail_shape(value) => (key.clone(), rotate_rail_shape(value, turns)?),
                "rotation" => (key.clone(), rotate_sixteenth(value, turns)?),
                k if HORIZONTAL.contains(&k) => (
                    rotate_direction(k, turns)
                        .ok_or_else(|| invalid(key, value))?
                        .to_string(),
                    value.clone(),
                ),
                _ => (key.clone(), value.clone()),
            };
            rotated.insert(new_key, new_value);
        }

        Ok(Self::with_properties(self.0.name.clone(), rotated))
    }
}

/// Number of clockwise quarter turns closest to a yaw in degrees.
pub fn quarter_turns(yaw_degrees: f64) -> u8 {
    ((yaw_degrees / 90.0).round() as i64).rem_euclid(4) as u8
}

fn invalid(property: &str, value: &str) -> BlockStateError {
    BlockStateError::InvalidRotation {
        property: property.to_string(),
        value: value.to_string(),
    }
}

fn rotate_direction(direction: &str, turns: u8) -> Option<&'static str> {
    let index = HORIZONTAL.iter().position(|d| *d == direction)?;
    Some(HORIZONTAL[(index + turns as usize) % 4])
}

fn rotate_facing(value: &str, turns: u8) -> Result<String, BlockStateError> {
    match value {
        "up" | "down" => Ok(value.to_string()),
        _ => rotate_direction(value, turns)
            .map(str::to_string)
            .ok_or_else(|| invalid("facing", value)),
    }
}

fn rotate_axis(value: &str, turns: u8) -> Result<String, BlockStateError> {
    let odd = turns % 2 == 1;
    match value {
        "y" => Ok(value.to_string()),
        "x" if odd => Ok("z".to_string()),
        "z" if odd => Ok("x".to_string()),
        "x" | "z" => Ok(value.to_string()),
        _ => Err(invalid("axis", value)),
    }
}

fn is_rail_shape(value: &str) -> bool {
    matches!(value, "north_south" | "east_west")
        || value.starts_with("ascending_")
        || matches!(
            value,
            "south_east" | "south_west" | "north_west" | "north_east"
        )
}

fn rotate_rail_shape(value: &str, turns: u8) -> Result<String, BlockStateError> {
    if let Some(direction) = value.strip_prefix("ascending_") {
        return rotate_direction(direction, turns)
            .map(|d| format!("ascending_{d}"))
            .ok_or_else(|| invalid("shape", value));
    }

    let (first, second) = value.split_once('_').ok_or_else(|| invalid("shape", value))?;
    let a = rotate_direction(first, turns).ok_or_else(|| invalid("shape", value))?;
    let b = rotate_direction(second, turns).ok_or_else(|| invalid("shape", value))?;

    // Straight rails are written north_south/east_west, curves lead with north/south.
    let canonical = match (a, b) {
        ("south", "north") | ("north", "south") => "north_south".to_string(),
        ("west", "east") | ("east", "west") => "east_west".to_string(),
        (x, y) if matches!(x, "north" | "south") => format!("{x}_{y}"),
        (x, y) => format!("{y}_{x}"),
    };
    Ok(canonical)
}

fn rotate_sixteenth(value: &str, turns: u8) -> Result<String, BlockStateError> {
    let steps: u8 = value.parse().map_err(|_| invalid("rotation", value))?;
    if steps > 15 {
        return Err(invalid("rotation", value));
    }
    Ok(((steps + turns * 4) % 16).to_string())
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)?;
        if !self.0.properties.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.0.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockState({self})")
    }
}

impl FromStr for BlockState {
    type Err = BlockStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BlockState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A single world mutation: put `state` at `pos`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementInstruction {
    /// Target block position.
    pub pos: BlockPos,
    /// Block-state to place.
    pub state: BlockState,
}

impl PlacementInstruction {
    /// Creates a new placement instruction.
    pub fn new(pos: BlockPos, state: BlockState) -> Self {
        Self { pos, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bs(s: &str) -> BlockState {
        BlockState::parse(s).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let state = bs("minecraft:oak_stairs[half=bottom,facing=north]");
        assert_eq!(state.name(), "minecraft:oak_stairs");
        assert_eq!(state.property("facing"), Some("north"));
        assert_eq!(
            state.to_string(),
            "minecraft:oak_stairs[facing=north,half=bottom]"
        );
        assert_eq!(bs("minecraft:stone").to_string(), "minecraft:stone");
        assert_eq!(bs("minecraft:stone[]").to_string(), "minecraft:stone");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BlockState::parse("").is_err());
        assert!(BlockState::parse("minecraft:stone[facing=north").is_err());
        assert!(BlockState::parse("minecraft:stone[facing]").is_err());
        assert!(BlockState::parse("minecraft:stone[a=1,a=2]").is_err());
    }

    #[test]
    fn test_rotate_facing() {
        let state = bs("minecraft:oak_stairs[facing=north]");
        assert_eq!(state.with_rotation(90.0).unwrap().property("facing"), Some("east"));
        assert_eq!(state.with_rotation(180.0).unwrap().property("facing"), Some("south"));
        assert_eq!(state.with_rotation(-90.0).unwrap().property("facing"), Some("west"));
        assert_eq!(state.with_rotation(44.0).unwrap().property("facing"), Some("north"));
        let up = bs("minecraft:piston[facing=up]");
        assert_eq!(up.with_rotation(90.0).unwrap().property("facing"), Some("up"));
    }

    #[test]
    fn test_rotate_axis() {
        let log = bs("minecraft:oak_log[axis=x]");
        assert_eq!(log.with_rotation(90.0).unwrap().property("axis"), Some("z"));
        assert_eq!(log.with_rotation(180.0).unwrap().property("axis"), Some("x"));
        let upright = bs("minecraft:oak_log[axis=y]");
        assert_eq!(upright.with_rotation(90.0).unwrap().property("axis"), Some("y"));
    }

    #[test]
    fn test_rotate_rail_shape() {
        let rail = bs("minecraft:rail[shape=north_south]");
        assert_eq!(rail.with_rotation(90.0).unwrap().property("shape"), Some("east_west"));

        let ascending = bs("minecraft:rail[shape=ascending_east]");
        assert_eq!(
            ascending.with_rotation(90.0).unwrap().property("shape"),
            Some("ascending_south")
        );

        let curve = bs("minecraft:rail[shape=north_east]");
        assert_eq!(curve.with_rotation(90.0).unwrap().property("shape"), Some("south_east"));
        assert_eq!(curve.with_rotation(180.0).unwrap().property("shape"), Some("south_west"));

        let stairs = bs("minecraft:oak_stairs[facing=north,shape=inner_left]");
        assert_eq!(
            stairs.with_rotation(90.0).unwrap().property("shape"),
            Some("inner_left")
        );
    }

    #[test]
    fn test_rotate_connections() {
        let fence = bs("minecraft:oak_fence[east=false,north=true,south=false,west=false]");
        let rotated = fence.with_rotation(90.0).unwrap();
        assert_eq!(rotated.property("east"), Some("true"));
        assert_eq!(rotated.property("north"), Some("false"));
    }

    #[test]
    fn test_rotate_sign_rotation() {
        let sign = bs("minecraft:oak_sign[rotation=14]");
        assert_eq!(sign.with_rotation(90.0).unwrap().property("rotation"), Some("2"));
    }

    #[test]
    fn test_invalid_rotation_is_reported() {
        let odd = bs("minecraft:thing[facing=sideways]");
        assert!(matches!(
            odd.with_rotation(90.0),
            Err(BlockStateError::InvalidRotation { .. })
        ));
        // A zero turn never inspects properties.
        assert!(odd.with_rotation(0.0).is_ok());
    }

    #[test]
    fn test_half_height_detection() {
        assert!(bs("minecraft:stone_slab[type=bottom]").is_half_height());
        assert!(!bs("minecraft:stone").is_half_height());
        let top = bs("minecraft:stone_slab[type=bottom]").with_property("type", "top");
        assert_eq!(top.property("type"), Some("top"));
    }
}
