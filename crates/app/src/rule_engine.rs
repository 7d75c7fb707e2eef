//! Rule engine — edge-triggered condition → action rules.
//!
//! The engine keeps a per-rule "last known satisfaction" boolean. A rule
//! fires only when its condition transitions from unsatisfied to satisfied,
//! never while it merely stays true, which is what stops a rule from
//! re-firing on every event while its condition holds.
//!
//! The engine never writes device state: [`RuleEngine::react`] returns the
//! actions of the rules that fired, and the hub submits them to the
//! execution coordinator (with the cascade depth bound applied there).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hearth_domain::error::HearthError;
use hearth_domain::event::Event;
use hearth_domain::id::RuleId;
use hearth_domain::rule::{Action, Condition, Rule};

use crate::ports::EventPublisher;
use crate::registry::DeviceRegistry;

struct TrackedRule {
    rule: Rule,
    last_satisfied: bool,
}

#[derive(Default)]
struct RuleStore {
    /// Rules in creation order.
    rules: Vec<TrackedRule>,
    /// Condition-device name → ids of rules watching it.
    by_device: HashMap<String, Vec<RuleId>>,
}

/// Holds rules and evaluates them against live registry state.
pub struct RuleEngine<P> {
    registry: Arc<DeviceRegistry>,
    publisher: P,
    store: Mutex<RuleStore>,
}

impl<P: EventPublisher> RuleEngine<P> {
    /// Create an engine reading state from `registry` and publishing
    /// `RuleTriggered` events through `publisher`.
    pub fn new(registry: Arc<DeviceRegistry>, publisher: P) -> Self {
        Self {
            registry,
            publisher,
            store: Mutex::new(RuleStore::default()),
        }
    }

    /// Define a new enabled rule.
    ///
    /// The rule's edge state is seeded from live registry state: a
    /// condition that is already satisfied will not fire until it goes
    /// unsatisfied and back.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::EmptyField`] when the condition or action
    /// names a blank device or attribute.
    #[tracing::instrument(skip(self, condition, action))]
    pub fn define(&self, condition: Condition, action: Action) -> Result<RuleId, HearthError> {
        let rule = Rule::new(condition, action);
        rule.validate()?;
        let satisfied = self.currently_satisfied(&rule.condition);
        let id = rule.id;

        let mut store = self.lock_store();
        store
            .by_device
            .entry(rule.condition.device.clone())
            .or_default()
            .push(id);
        store.rules.push(TrackedRule {
            rule,
            last_satisfied: satisfied,
        });
        tracing::debug!(%id, "rule defined");
        Ok(id)
    }

    /// Replace a rule's condition and action atomically, keeping its id,
    /// enabled flag, and creation time. The edge state is re-seeded.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown id and
    /// [`HearthError::EmptyField`] for blank names (the existing rule is
    /// untouched in both cases).
    #[tracing::instrument(skip(self, condition, action))]
    pub fn redefine(
        &self,
        id: RuleId,
        condition: Condition,
        action: Action,
    ) -> Result<(), HearthError> {
        let satisfied = self.currently_satisfied(&condition);
        let mut store = self.lock_store();
        let position = store
            .rules
            .iter()
            .position(|t| t.rule.id == id)
            .ok_or_else(|| HearthError::NotFound {
                entity: "Rule",
                id: id.to_string(),
            })?;

        let existing = &store.rules[position].rule;
        let replacement = Rule {
            id,
            condition,
            action,
            enabled: existing.enabled,
            created_at: existing.created_at,
        };
        replacement.validate()?;

        let old_device = existing.condition.device.clone();
        let new_device = replacement.condition.device.clone();
        if old_device != new_device {
            if let Some(ids) = store.by_device.get_mut(&old_device) {
                ids.retain(|rid| *rid != id);
            }
            store.by_device.entry(new_device).or_default().push(id);
        }
        store.rules[position] = TrackedRule {
            rule: replacement,
            last_satisfied: satisfied,
        };
        Ok(())
    }

    /// Enable or disable a rule.
    ///
    /// Enabling re-seeds the edge state from live registry state, so a
    /// condition that became true while the rule was disabled does not
    /// fire retroactively.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub fn set_enabled(&self, id: RuleId, enabled: bool) -> Result<(), HearthError> {
        let mut store = self.lock_store();
        let tracked = store
            .rules
            .iter_mut()
            .find(|t| t.rule.id == id)
            .ok_or_else(|| HearthError::NotFound {
                entity: "Rule",
                id: id.to_string(),
            })?;
        let was_enabled = tracked.rule.enabled;
        tracked.rule.enabled = enabled;
        if enabled && !was_enabled {
            let condition = tracked.rule.condition.clone();
            drop(store);
            let satisfied = self.currently_satisfied(&condition);
            let mut store = self.lock_store();
            if let Some(tracked) = store.rules.iter_mut().find(|t| t.rule.id == id) {
                tracked.last_satisfied = satisfied;
            }
        }
        Ok(())
    }

    /// Snapshots of all rules, in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<Rule> {
        self.lock_store()
            .rules
            .iter()
            .map(|t| t.rule.clone())
            .collect()
    }

    /// Re-evaluate the rules affected by `event` and return the actions of
    /// those that fired.
    ///
    /// `StateChanged` re-evaluates only the rules watching the changed
    /// device; `ScheduleFired` names no device and re-evaluates every
    /// enabled rule; `RuleTriggered` is informational and evaluates
    /// nothing. A `RuleTriggered` event is published for each firing rule.
    pub async fn react(&self, event: &Event) -> Vec<Action> {
        let fired = {
            let mut store = self.lock_store();
            let affected: Vec<RuleId> = match event {
                Event::StateChanged { device, .. } => {
                    store.by_device.get(device).cloned().unwrap_or_default()
                }
                Event::ScheduleFired { .. } => {
                    store.rules.iter().map(|t| t.rule.id).collect()
                }
                Event::RuleTriggered { .. } => Vec::new(),
            };

            let mut fired = Vec::new();
            for id in affected {
                let Some(position) = store.rules.iter().position(|t| t.rule.id == id) else {
                    continue;
                };
                if !store.rules[position].rule.enabled {
                    continue;
                }
                let satisfied = self.currently_satisfied(&store.rules[position].rule.condition);
                let tracked = &mut store.rules[position];
                let was_satisfied = tracked.last_satisfied;
                tracked.last_satisfied = satisfied;
                if satisfied && !was_satisfied {
                    fired.push((id, tracked.rule.action.clone()));
                }
            }
            fired
        };

        let mut actions = Vec::with_capacity(fired.len());
        for (rule_id, action) in fired {
            tracing::debug!(%rule_id, %action, "rule fired");
            let _ = self
                .publisher
                .publish(Event::RuleTriggered { rule_id })
                .await;
            actions.push(action);
        }
        actions
    }

    /// Evaluate a condition against live registry state.
    ///
    /// Dangling references (unknown device or attribute) evaluate to
    /// unsatisfied and are reported, never fatal.
    fn currently_satisfied(&self, condition: &Condition) -> bool {
        match self.registry.get(&condition.device) {
            Ok(device) => match device.attribute(&condition.attribute) {
                Some(actual) => condition.holds(actual),
                None => {
                    tracing::warn!(
                        device = %condition.device,
                        attribute = %condition.attribute,
                        "rule condition references unknown attribute"
                    );
                    false
                }
            },
            Err(_) => {
                tracing::warn!(
                    device = %condition.device,
                    "rule condition references unknown device"
                );
                false
            }
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, RuleStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
