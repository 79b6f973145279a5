use mcstructure_nbt::{Compound, Tag};
use once_cell::sync::Lazy;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Placeholder returned for cells that hold no block.
pub static STRUCTURE_VOID: Lazy<Block> = Lazy::new(|| Block::new("minecraft:structure_void"));

pub static AIR: Lazy<Block> = Lazy::new(|| Block::new("minecraft:air"));

/// Still water, the target of the waterlog layer.
pub static WATER: Lazy<Block> =
    Lazy::new(|| Block::new("minecraft:water").with_state("liquid_depth", 0));

/// The value of a single block state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    String(String),
    Bool(bool),
    Int(i32),
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::String(s) => write!(f, "\"{}\"", s),
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::String(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::String(value)
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        StateValue::Bool(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        StateValue::Int(value)
    }
}

/// Block states in insertion order. Order is kept for output only;
/// two maps holding the same pairs compare equal regardless of order.
#[derive(Debug, Clone, Default)]
pub struct StateMap {
    entries: Vec<(String, StateValue)>,
}

impl StateMap {
    pub fn new() -> Self {
        StateMap {
            entries: Vec::new(),
        }
    }

    /// Sets `key`, keeping the position of an existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<StateValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn sorted(&self) -> Vec<&(String, StateValue)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl PartialEq for StateMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for StateMap {}

impl Hash for StateMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl<K: Into<String>, V: Into<StateValue>> FromIterator<(K, V)> for StateMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut states = StateMap::new();
        for (key, value) in iter {
            states.insert(key, value);
        }
        states
    }
}

impl<K: Into<String>, V: Into<StateValue>> Extend<(K, V)> for StateMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl Serialize for StateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Which parts of a block [`Block::stringify`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringifyOptions {
    pub with_namespace: bool,
    pub with_states: bool,
}

impl StringifyOptions {
    pub const FULL: StringifyOptions = StringifyOptions {
        with_namespace: true,
        with_states: true,
    };

    pub const NAME_ONLY: StringifyOptions = StringifyOptions {
        with_namespace: false,
        with_states: false,
    };
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions::FULL
    }
}

/// The content of a cell: an identifier plus its block states.
///
/// Extra data (block entity payloads and the like) travels with a block but
/// takes no part in equality or hashing, so two blocks that differ only in
/// extra data share one palette entry.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    namespace: Option<String>,
    name: String,
    states: StateMap,
    waterlogged: bool,
    #[serde(skip)]
    extra_data: Compound,
}

impl Block {
    /// Creates a block from an identifier such as `minecraft:wool`. The part
    /// before the first `:` is the namespace; without one the block has no
    /// namespace.
    pub fn new(identifier: &str) -> Self {
        let (namespace, name) = match identifier.split_once(':') {
            Some((namespace, name)) => (Some(namespace.to_string()), name.to_string()),
            None => (None, identifier.to_string()),
        };
        Block {
            namespace,
            name,
            states: StateMap::new(),
            waterlogged: false,
            extra_data: Compound::new(),
        }
    }

    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.states.insert(key, value);
        self
    }

    pub fn with_states(mut self, states: StateMap) -> Self {
        self.states = states;
        self
    }

    pub fn with_waterlogged(mut self, waterlogged: bool) -> Self {
        self.waterlogged = waterlogged;
        self
    }

    pub fn with_extra_data(mut self, key: impl Into<String>, value: Tag) -> Self {
        self.extra_data.insert(key, value);
        self
    }

    /// Adds or overwrites states; existing keys keep their order.
    pub fn add_states<K, V, I>(&mut self, states: I)
    where
        K: Into<String>,
        V: Into<StateValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.states.extend(states);
    }

    pub fn add_extra_data(&mut self, extra_data: &Compound) {
        self.extra_data.extend_from(extra_data);
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace_and_name(&self) -> (Option<&str>, &str) {
        (self.namespace(), self.name())
    }

    pub fn identifier(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}:{}", namespace, self.name),
            None => self.name.clone(),
        }
    }

    pub fn states(&self) -> &StateMap {
        &self.states
    }

    pub fn is_waterlogged(&self) -> bool {
        self.waterlogged
    }

    pub fn extra_data(&self) -> &Compound {
        &self.extra_data
    }

    pub fn has_extra_data(&self) -> bool {
        !self.extra_data.is_empty()
    }

    /// Renders the block the way commands like `setblock` spell it, e.g.
    /// `minecraft:wool ["color"="red"]`.
    pub fn stringify(&self, options: StringifyOptions) -> String {
        let mut result = String::new();
        if options.with_namespace {
            if let Some(namespace) = &self.namespace {
                result.push_str(namespace);
                result.push(':');
            }
        }
        result.push_str(&self.name);
        if options.with_states {
            let states: Vec<String> = self
                .states
                .iter()
                .map(|(key, value)| format!("\"{}\"={}", key, value))
                .collect();
            result.push_str(" [");
            result.push_str(&states.join(","));
            result.push(']');
        }
        result
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.name == other.name
            && self.states == other.states
            && self.waterlogged == other.waterlogged
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.name.hash(state);
        self.states.hash(state);
        self.waterlogged.hash(state);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify(StringifyOptions::FULL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(block: &Block) -> u64 {
        let mut hasher = DefaultHasher::new();
        block.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_stringify() {
        let b = Block::new("minecraft:wool").with_state("color", "red");
        assert_eq!(b.stringify(StringifyOptions::FULL), r#"minecraft:wool ["color"="red"]"#);
        assert_eq!(
            b.stringify(StringifyOptions {
                with_namespace: false,
                with_states: true
            }),
            r#"wool ["color"="red"]"#
        );
        assert_eq!(
            b.stringify(StringifyOptions {
                with_namespace: true,
                with_states: false
            }),
            "minecraft:wool"
        );
        assert_eq!(b.stringify(StringifyOptions::NAME_ONLY), "wool");

        let b = Block::new("minecraft:dispenser").with_state("triggered_bit", true);
        assert_eq!(
            b.stringify(StringifyOptions {
                with_namespace: false,
                with_states: true
            }),
            r#"dispenser ["triggered_bit"=true]"#
        );

        let b = Block::new("minecraft:jigsaw").with_state("rotation", 12);
        assert_eq!(b.to_string(), r#"minecraft:jigsaw ["rotation"=12]"#);
    }

    #[test]
    fn test_stringify_many_and_no_states() {
        let b = Block::new("minecraft:stairs")
            .with_state("weirdo_direction", 2)
            .with_state("upside_down_bit", false);
        assert_eq!(
            b.to_string(),
            r#"minecraft:stairs ["weirdo_direction"=2,"upside_down_bit"=false]"#
        );
        assert_eq!(Block::new("foobar").to_string(), "foobar []");
    }

    #[test]
    fn test_identifier_parts() {
        let block = Block::new("minecraft:wool");
        assert_eq!(block.namespace_and_name(), (Some("minecraft"), "wool"));
        assert_eq!(block.identifier(), "minecraft:wool");

        let block = Block::new("foobar");
        assert_eq!(block.namespace_and_name(), (None, "foobar"));
        assert_eq!(block.identifier(), "foobar");

        let block = Block::new("ns:odd:name");
        assert_eq!(block.namespace(), Some("ns"));
        assert_eq!(block.name(), "odd:name");
    }

    #[test]
    fn test_state_order_does_not_affect_equality() {
        let a = Block::new("minecraft:log")
            .with_state("axis", "y")
            .with_state("stripped", false);
        let b = Block::new("minecraft:log")
            .with_state("stripped", false)
            .with_state("axis", "y");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_extra_data_is_not_part_of_equality() {
        let plain = Block::new("minecraft:chest");
        let loaded = Block::new("minecraft:chest").with_extra_data("Items", Tag::Int(3));
        assert_eq!(plain, loaded);
        assert_eq!(hash_of(&plain), hash_of(&loaded));
    }

    #[test]
    fn test_waterlogged_is_part_of_equality() {
        let dry = Block::new("minecraft:oak_fence");
        let wet = Block::new("minecraft:oak_fence").with_waterlogged(true);
        assert_ne!(dry, wet);
    }

    #[test]
    fn test_add_states_appends_and_overwrites() {
        let mut block = Block::new("minecraft:beehive").with_state("honey_level", 1);
        block.add_states(vec![("honey_level", 4)]);
        block.add_states(vec![("direction", 2)]);

        let keys: Vec<&str> = block.states().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["honey_level", "direction"]);
        assert_eq!(block.states().get("honey_level"), Some(&StateValue::Int(4)));
    }

    #[test]
    fn test_shared_sentinels() {
        assert_eq!(STRUCTURE_VOID.identifier(), "minecraft:structure_void");
        assert_eq!(WATER.states().get("liquid_depth"), Some(&StateValue::Int(0)));
        assert!(!WATER.is_waterlogged());
        assert_eq!(AIR.namespace(), Some(DEFAULT_NAMESPACE));
    }

    #[test]
    fn test_json_rendering() {
        let lever = Block::new("minecraft:lever")
            .with_state("open_bit", true)
            .with_state("lever_direction", "north")
            .with_state("weight", 3)
            .with_extra_data("Lock", Tag::String("key".to_string()));
        assert_eq!(
            serde_json::to_string(&lever).unwrap(),
            r#"{"namespace":"minecraft","name":"lever","states":{"open_bit":true,"lever_direction":"north","weight":3},"waterlogged":false}"#
        );

        let bare = Block::new("stone").with_waterlogged(true);
        assert_eq!(
            serde_json::to_string(&bare).unwrap(),
            r#"{"namespace":null,"name":"stone","states":{},"waterlogged":true}"#
        );
    }
}
