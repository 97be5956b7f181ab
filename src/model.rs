//! Program documents shared between the pipeline stages
//!
//! The structural extractor produces a [`StructuredProgram`]; the reconciler
//! matches it against the low-level IR and produces a [`RefinedProgram`];
//! the register allocator consumes both. Every document round-trips through
//! JSON with insertion order preserved, so a pre-extracted document can be
//! fed to the pipeline in place of C source.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TranslateError, TranslateResult};

/// A literal value carried by a declaration or initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl Literal {
    /// Integer view; floats are truncated the way the source dialect's
    /// integer contexts truncate them.
    pub fn as_int(&self) -> i64 {
        match self {
            Literal::Int(v) => *v,
            Literal::Float(f) => *f as i64,
        }
    }
}

/// A global initializer: scalar, array, or absent (null)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GlobalInit {
    Scalar(Literal),
    Array(Vec<Literal>),
}

/// Insertion-ordered string map, serialized as a JSON object. Register
/// indices follow first-seen order, so document order is load-bearing and a
/// plain hash map would not do.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace, keeping the key's original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((key, value)),
        }
    }

    /// Insert only if the key is absent.
    pub fn insert_default(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap::new()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(std::marker::PhantomData))
    }
}

/// Global variables declared before the first function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariableTable {
    /// Declared names in order; arrays as `name[size]`
    pub declarations: Vec<String>,
    /// name → literal, literal sequence, or null
    pub initializations: OrderedMap<Option<GlobalInit>>,
}

impl GlobalVariableTable {
    /// Declare a name without a value; a later initialization may fill it.
    pub fn declare(&mut self, name: &str) {
        if !self.declarations.iter().any(|d| d == name) {
            self.declarations.push(name.to_string());
        }
        self.initializations.insert_default(name, None);
    }

    /// Record an initializer, declaring the name first so that every
    /// initialized name is also declared.
    pub fn initialize(&mut self, name: &str, value: GlobalInit) {
        if !self.declarations.iter().any(|d| d == name) {
            self.declarations.push(name.to_string());
        }
        self.initializations.insert(name, Some(value));
    }
}

/// One `for` loop as the structural pass sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopRecord {
    /// Loop init expression as written (`i=0`)
    pub variable: String,
    pub condition: String,
    pub increment: String,
    pub body: Vec<String>,
}

/// One `if` statement as the structural pass sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondRecord {
    pub condition: String,
    pub body: Vec<String>,
}

/// Structural view of one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub function_name: String,
    /// Initialized locals in declaration order; `None` marks a bare
    /// declaration that never received a literal
    pub initializations: OrderedMap<Option<Literal>>,
    /// Raw body lines after initializations were split out
    #[serde(default)]
    pub body: Vec<String>,
    #[serde(default)]
    pub for_loops: Vec<LoopRecord>,
    #[serde(default)]
    pub if_stmts: Vec<CondRecord>,
}

/// The Structured Program Document produced by the extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredProgram {
    pub global_variable: GlobalVariableTable,
    pub functions: Vec<FunctionRecord>,
}

impl StructuredProgram {
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.iter().find(|f| f.function_name == name)
    }

    pub fn from_json(text: &str) -> TranslateResult<Self> {
        serde_json::from_str(text).map_err(|e| TranslateError::malformed_document(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One loop or conditional after reconciliation against the IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedBlock {
    /// Induction or compared variable (first identifier of the condition)
    pub variable: String,
    /// Condition text as the IR spells it
    pub condition: String,
    /// Canonical `lhs = lhs <op> rhs` form; `None` when unresolved
    pub increment: Option<String>,
    /// Body lines with temporary declarations stripped and early exits
    /// rewritten to `break;`
    pub body: Vec<String>,
}

/// Refined view of one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedFunction {
    pub function_name: String,
    /// Variables confirmed by both the structural and the IR view
    pub initializations: OrderedMap<i64>,
    #[serde(default)]
    pub for_loops: Vec<RefinedBlock>,
    #[serde(default)]
    pub if_stmts: Vec<RefinedBlock>,
    /// Every IR statement of the function with its zero-based line index;
    /// diagnostic only
    #[serde(default)]
    pub all_lines: Vec<(usize, String)>,
}

impl RefinedFunction {
    pub fn new(name: impl Into<String>) -> Self {
        RefinedFunction {
            function_name: name.into(),
            initializations: OrderedMap::new(),
            for_loops: Vec::new(),
            if_stmts: Vec::new(),
            all_lines: Vec::new(),
        }
    }

    /// Loop and if blocks in allocation order (loops first).
    pub fn blocks(&self) -> impl Iterator<Item = &RefinedBlock> {
        self.for_loops.iter().chain(self.if_stmts.iter())
    }
}

/// The Refined Program Document produced by the reconciler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinedProgram {
    pub global_variables: GlobalVariableTable,
    pub functions: Vec<RefinedFunction>,
}

impl RefinedProgram {
    pub fn function(&self, name: &str) -> Option<&RefinedFunction> {
        self.functions.iter().find(|f| f.function_name == name)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordered_map_preserves_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("i", 0i64);
        map.insert("iT", 50);
        map.insert("cur", 0);
        map.insert("i", 7); // replace keeps position

        let keys: Vec<_> = map.keys().collect();
        assert_eq!(keys, vec!["i", "iT", "cur"]);
        assert_eq!(map.get("i"), Some(&7));
    }

    #[test]
    fn test_ordered_map_json_round_trip() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1i64);
        map.insert("alpha", 2);
        map.insert("mid", 3);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":2,"mid":3}"#);

        let back: OrderedMap<i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_global_table_initialize_declares() {
        let mut table = GlobalVariableTable::default();
        table.initialize("n", GlobalInit::Scalar(Literal::Int(8)));
        table.declare("k");

        assert_eq!(table.declarations, vec!["n", "k"]);
        assert_eq!(
            table.initializations.get("n"),
            Some(&Some(GlobalInit::Scalar(Literal::Int(8))))
        );
        assert_eq!(table.initializations.get("k"), Some(&None));
    }

    #[test]
    fn test_structured_program_json_round_trip() {
        let mut initializations = OrderedMap::new();
        initializations.insert("i", Some(Literal::Int(0)));
        initializations.insert("n", Some(Literal::Int(10)));

        let doc = StructuredProgram {
            global_variable: GlobalVariableTable::default(),
            functions: vec![FunctionRecord {
                function_name: "accumulate".to_string(),
                initializations,
                body: vec!["sum = sum + i;".to_string()],
                for_loops: vec![LoopRecord {
                    variable: "i=0".to_string(),
                    condition: "i<n".to_string(),
                    increment: "i++".to_string(),
                    body: vec!["sum = sum + i;".to_string()],
                }],
                if_stmts: vec![],
            }],
        };

        let json = doc.to_json().unwrap();
        let back = StructuredProgram::from_json(&json).unwrap();
        assert_eq!(back, doc);
    }
}
