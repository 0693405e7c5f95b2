//! Configuration trees for the walker driver.
//!
//! The tree is kept as a JSON value so fields the generators never touch
//! pass through unchanged and in their original order.
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    root: Value,
}

impl ConfigTree {
    pub fn from_value(root: Value) -> Result<Self> {
        if !root.is_object() {
            return Err(anyhow!("configuration tree root must be a JSON object"));
        }
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read template {}", path.display()))?;
        let root: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse template JSON {}", path.display()))?;
        Self::from_value(root).with_context(|| format!("template {}", path.display()))
    }

    /// Write with four-space indentation.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.root
            .serialize(&mut serializer)
            .context("serialize configuration tree")?;
        fs::write(path, out).with_context(|| format!("write {}", path.display()))
    }

    pub fn value(&self) -> &Value {
        &self.root
    }

    /// Replace `driver` with one entry per walker.
    pub fn set_drivers(&mut self, walkers: usize, processors: u32, md_steps: u64) {
        let drivers = (0..walkers)
            .map(|idx| {
                json!({
                    "number processors": processors,
                    "type": "Gromacs",
                    "MDSteps": md_steps,
                    "logfile": format!("node-{idx}"),
                })
            })
            .collect();
        self.object_mut().insert("driver".to_string(), Value::Array(drivers));
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.object_mut().insert(key.to_string(), value);
    }

    pub fn set_input_file(&mut self, name: String) {
        self.set("inputfile", Value::String(name));
    }

    /// Point the first observer at `name`. Trees without observers are left alone.
    pub fn set_observer_file(&mut self, name: String) -> bool {
        match self
            .root
            .get_mut("observers")
            .and_then(Value::as_array_mut)
            .and_then(|observers| observers.first_mut())
            .and_then(Value::as_object_mut)
        {
            Some(observer) => {
                observer.insert("file name".to_string(), Value::String(name));
                true
            }
            None => false,
        }
    }

    pub fn cv_count(&self) -> usize {
        self.root
            .get("CVs")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn remove_first_cv(&mut self) -> Result<Value> {
        let cvs = array_mut(self.object_mut(), "CVs")?;
        if cvs.is_empty() {
            return Err(anyhow!("CVs is empty"));
        }
        Ok(cvs.remove(0))
    }

    pub fn cv_mut(&mut self, index: usize) -> Result<&mut Map<String, Value>> {
        array_mut(self.object_mut(), "CVs")?
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| anyhow!("CVs[{index}] missing or not an object"))
    }

    /// The `restriction` object of CV `index`, created when absent.
    pub fn restriction_mut(&mut self, index: usize) -> Result<&mut Map<String, Value>> {
        object_entry(self.cv_mut(index)?, "restriction")
            .with_context(|| format!("CVs[{index}]"))
    }

    /// The `method` object, created when absent.
    pub fn method_mut(&mut self) -> Result<&mut Map<String, Value>> {
        object_entry(self.object_mut(), "method")
    }

    pub fn constraint_mut(&mut self, index: usize) -> Result<&mut Map<String, Value>> {
        array_mut(self.object_mut(), "constraints")?
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| anyhow!("constraints[{index}] missing or not an object"))
    }

    fn object_mut(&mut self) -> &mut Map<String, Value> {
        match &mut self.root {
            Value::Object(map) => map,
            // from_value only admits objects
            _ => unreachable!("configuration tree root is an object"),
        }
    }
}

/// Drop the first element of `map[key]` when it is a non-empty array.
pub fn remove_first_entry(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    let array = map.get_mut(key)?.as_array_mut()?;
    if array.is_empty() {
        None
    } else {
        Some(array.remove(0))
    }
}

fn array_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>> {
    map.get_mut(key)
        .ok_or_else(|| anyhow!("missing {key:?}"))?
        .as_array_mut()
        .ok_or_else(|| anyhow!("{key:?} is not an array"))
}

fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>> {
    map.entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| anyhow!("{key:?} is not an object"))
}
