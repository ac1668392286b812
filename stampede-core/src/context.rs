//! Two-tier variable storage threaded through activity execution
//!
//! The `run` store lives for one recurrence and is cleared before the next
//! one begins; the `global` store lives as long as the owning executor.
//! Patterns of the form `${run.<name>[.<attr>]*}` are parsed once into an
//! [`AccessPlan`] and cached by their literal text.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::error::VariableEvaluationError;
use crate::value::{accessor_name, ContextValue};

/// Reserved run-store key an activity sets to force the next activity
pub const NEXT_ACTIVITY_KEY: &str = "__nextActivity";

/// Selects one of the two variable stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Run,
    Global,
}

impl Store {
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Run => "run",
            Store::Global => "global",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(Store::Run),
            "global" => Ok(Store::Global),
            other => Err(format!("Unknown variable store: {}", other)),
        }
    }
}

/// One step of an accessor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    /// Segment as written in the pattern (`city`)
    pub attribute: String,
    /// Derived accessor name (`getCity`)
    pub method: String,
}

impl Accessor {
    pub fn new(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let method = accessor_name(&attribute);
        Self { attribute, method }
    }
}

/// Resolved form of a variable pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPlan {
    pub store: Store,
    pub root: String,
    pub chain: Vec<Accessor>,
}

impl AccessPlan {
    /// Parse `${run.x.y}` / `${global.x}` into store, root name and accessors
    pub fn parse(pattern: &str) -> Result<Self, VariableEvaluationError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(VariableEvaluationError::EmptyPattern);
        }

        let malformed = || VariableEvaluationError::MalformedPattern(pattern.to_string());

        let body = trimmed
            .strip_prefix("${")
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(malformed)?;

        let mut segments = body.split('.');
        let store = segments
            .next()
            .and_then(|prefix| prefix.trim().parse::<Store>().ok())
            .ok_or_else(|| VariableEvaluationError::MissingPrefix(pattern.to_string()))?;

        let root = segments
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(malformed)?
            .to_string();

        let chain = segments
            .map(|attribute| {
                let attribute = attribute.trim();
                if attribute.is_empty() {
                    Err(malformed())
                } else {
                    Ok(Accessor::new(attribute))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { store, root, chain })
    }
}

/// Per-executor variable storage
#[derive(Debug, Default)]
pub struct ExecutionContext {
    run: HashMap<String, ContextValue>,
    global: HashMap<String, ContextValue>,
    patterns: HashMap<String, AccessPlan>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, store: Store) -> &HashMap<String, ContextValue> {
        match store {
            Store::Run => &self.run,
            Store::Global => &self.global,
        }
    }

    fn store_mut(&mut self, store: Store) -> &mut HashMap<String, ContextValue> {
        match store {
            Store::Run => &mut self.run,
            Store::Global => &mut self.global,
        }
    }

    /// Store a value, returning the previous one under the same key
    pub fn set_value(
        &mut self,
        store: Store,
        key: impl Into<String>,
        value: impl Into<ContextValue>,
    ) -> Option<ContextValue> {
        self.store_mut(store).insert(key.into(), value.into())
    }

    pub fn get_value(&self, store: Store, key: &str) -> Option<&ContextValue> {
        self.store(store).get(key)
    }

    pub fn remove(&mut self, store: Store, key: &str) -> Option<ContextValue> {
        self.store_mut(store).remove(key)
    }

    pub fn names(&self, store: Store) -> BTreeSet<String> {
        self.store(store).keys().cloned().collect()
    }

    pub fn clear_run_store(&mut self) {
        self.run.clear();
    }

    /// Force the executor to continue with `activity` instead of the
    /// current activity's static successor
    pub fn set_next_activity(&mut self, activity: impl Into<String>) {
        self.run
            .insert(NEXT_ACTIVITY_KEY.to_string(), ContextValue::from(activity.into()));
    }

    /// Consume the next-activity override, if one was set
    pub fn take_next_activity(&mut self) -> Option<String> {
        self.run
            .remove(NEXT_ACTIVITY_KEY)
            .map(|value| value.render())
    }

    /// Number of distinct literal patterns resolved so far
    pub fn cached_patterns(&self) -> usize {
        self.patterns.len()
    }

    /// Evaluate a variable pattern against the current stores.
    ///
    /// An unknown root variable, or an accessor yielding nothing part way
    /// along the chain, evaluates to `None`. JSON `null` counts as nothing.
    /// The access plan is cached by the literal pattern and never
    /// invalidated, so a root that later holds a value lacking one of the
    /// accessors fails with [`VariableEvaluationError::MissingAccessor`].
    pub fn evaluate(&mut self, pattern: &str) -> Result<Option<ContextValue>, VariableEvaluationError> {
        if pattern.trim().is_empty() {
            return Err(VariableEvaluationError::EmptyPattern);
        }

        if !self.patterns.contains_key(pattern) {
            let plan = AccessPlan::parse(pattern)?;
            trace!("Caching access plan for pattern {}: {:?}", pattern, plan);
            self.patterns.insert(pattern.to_string(), plan);
        }

        let plan = &self.patterns[pattern];
        let store = match plan.store {
            Store::Run => &self.run,
            Store::Global => &self.global,
        };

        let Some(root) = store.get(&plan.root).filter(|value| !value.is_null()) else {
            return Ok(None);
        };

        let mut current = root.clone();
        for accessor in &plan.chain {
            match current.call(accessor)? {
                Some(next) if !next.is_null() => current = next,
                _ => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    /// Replace every `${...}` pattern inside `template` with its rendered
    /// value. Absent values render as the empty string.
    pub fn interpolate(&mut self, template: &str) -> Result<String, VariableEvaluationError> {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            let Some(length) = rest[start..].find('}') else {
                break;
            };
            output.push_str(&rest[..start]);

            let pattern = &rest[start..start + length + 1];
            if let Some(value) = self.evaluate(pattern)? {
                output.push_str(&value.render());
            }
            rest = &rest[start + length + 1..];
        }

        output.push_str(rest);
        Ok(output)
    }
}
