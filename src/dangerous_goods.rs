//! Dangerous-goods compatibility checks.
//!
//! The load plan assembler treats compatibility as an external concern behind
//! the [`DgCompatibility`] trait. [`SegregationTable`] is the built-in
//! implementation: a rule table checked pairwise over hazard classes and
//! segregation groups, plus fleet-wide group rules.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InputError;
use crate::records::DangerousGoodEntry;

/// Failure of a compatibility collaborator.
///
/// Distinct from an incompatible verdict: a failed check says nothing about
/// whether the goods may travel together.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollaboratorError {
    #[error("compatibility service unavailable: {0}")]
    Unavailable(String),
    #[error("compatibility check failed: {0}")]
    Failed(String),
}

/// Verdict for a set of dangerous goods.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    pub compatible: bool,
    /// Human-readable reasons; empty when compatible.
    pub reasons: Vec<String>,
}

impl CompatibilityVerdict {
    pub fn compatible() -> Self {
        Self {
            compatible: true,
            reasons: Vec::new(),
        }
    }

    /// Verdict derived from a reason list: compatible iff there are no reasons.
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            compatible: reasons.is_empty(),
            reasons,
        }
    }
}

/// Decides whether a set of dangerous goods may share one vehicle.
///
/// Implementations must be callable from several planning workers at once.
pub trait DgCompatibility: Send + Sync {
    fn check(
        &self,
        entries: &[DangerousGoodEntry],
    ) -> Result<CompatibilityVerdict, CollaboratorError>;
}

impl<T: DgCompatibility + ?Sized> DgCompatibility for &T {
    fn check(
        &self,
        entries: &[DangerousGoodEntry],
    ) -> Result<CompatibilityVerdict, CollaboratorError> {
        (**self).check(entries)
    }
}

impl<T: DgCompatibility + ?Sized> DgCompatibility for std::sync::Arc<T> {
    fn check(
        &self,
        entries: &[DangerousGoodEntry],
    ) -> Result<CompatibilityVerdict, CollaboratorError> {
        (**self).check(entries)
    }
}

/// Segregation requirement between two hazard classes or groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegregationStatus {
    Compatible,
    IncompatibleProhibited,
    ConditionalNotes,
    AwayFrom,
    SeparatedFrom,
}

impl fmt::Display for SegregationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SegregationStatus::Compatible => "Compatible",
            SegregationStatus::IncompatibleProhibited => "Incompatible - Prohibited",
            SegregationStatus::ConditionalNotes => "Conditional - See Notes",
            SegregationStatus::AwayFrom => "Away From",
            SegregationStatus::SeparatedFrom => "Separated From",
        };
        f.write_str(label)
    }
}

/// What a rule compares. Rules apply in both directions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RuleScope {
    ClassToClass { primary: String, secondary: String },
    GroupToGroup { primary: String, secondary: String },
    ClassToGroup { class: String, group: String },
}

/// One row of the segregation table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegregationRule {
    #[serde(flatten)]
    pub scope: RuleScope,
    pub status: SegregationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SegregationRule {
    pub fn class_to_class(
        primary: impl Into<String>,
        secondary: impl Into<String>,
        status: SegregationStatus,
    ) -> Self {
        Self {
            scope: RuleScope::ClassToClass {
                primary: primary.into(),
                secondary: secondary.into(),
            },
            status,
            notes: None,
        }
    }

    pub fn group_to_group(
        primary: impl Into<String>,
        secondary: impl Into<String>,
        status: SegregationStatus,
    ) -> Self {
        Self {
            scope: RuleScope::GroupToGroup {
                primary: primary.into(),
                secondary: secondary.into(),
            },
            status,
            notes: None,
        }
    }

    pub fn class_to_group(
        class: impl Into<String>,
        group: impl Into<String>,
        status: SegregationStatus,
    ) -> Self {
        Self {
            scope: RuleScope::ClassToGroup {
                class: class.into(),
                group: group.into(),
            },
            status,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn notes_or_default(&self) -> &str {
        self.notes.as_deref().unwrap_or("No specific reason provided")
    }

    /// Reason text for a matched rule; `None` for compatible rules.
    fn describe(&self, left: &str, right: &str) -> Option<String> {
        match self.status {
            SegregationStatus::Compatible => None,
            SegregationStatus::IncompatibleProhibited => Some(format!(
                "{left} is incompatible with {right} ({}): {}",
                self.status,
                self.notes_or_default()
            )),
            SegregationStatus::ConditionalNotes => Some(format!(
                "{left} vs {right} requires special consideration: {}",
                self.notes.as_deref().unwrap_or("")
            )),
            SegregationStatus::AwayFrom | SegregationStatus::SeparatedFrom => Some(format!(
                "{left} must be {} {right}: {}",
                self.status.to_string().to_lowercase(),
                self.notes_or_default()
            )),
        }
    }
}

/// Fleet-wide rule: two classes must not appear anywhere in the same set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupRule {
    pub class_a: String,
    pub class_b: String,
    pub reason: String,
}

/// Rule-table based compatibility collaborator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegregationTable {
    #[serde(default)]
    rules: Vec<SegregationRule>,
    #[serde(default)]
    group_rules: Vec<GroupRule>,
}

impl SegregationTable {
    /// Empty table: everything is compatible.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard group rules for explosives, flammable liquids
    /// and oxidizers.
    pub fn standard() -> Self {
        Self::new()
            .with_group_rule(
                "1",
                "5.1",
                "Group incompatibility: Explosives (Class 1) cannot be transported with oxidizers (Class 5.1)",
            )
            .with_group_rule(
                "3",
                "5.1",
                "Group incompatibility: Flammable liquids (Class 3) require separation from oxidizers (Class 5.1)",
            )
    }

    pub fn with_rule(mut self, rule: SegregationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_group_rule(
        mut self,
        class_a: impl Into<String>,
        class_b: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.group_rules.push(GroupRule {
            class_a: class_a.into(),
            class_b: class_b.into(),
            reason: reason.into(),
        });
        self
    }

    /// Loads a table from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Checks one pair and returns every reason that applies.
    pub fn check_pair(&self, a: &DangerousGoodEntry, b: &DangerousGoodEntry) -> Vec<String> {
        let a_classes = a.hazard_classes();
        let b_classes = b.hazard_classes();
        let mut reasons = Vec::new();

        for rule in &self.rules {
            match &rule.scope {
                RuleScope::ClassToClass { primary, secondary } => {
                    for ca in &a_classes {
                        for cb in &b_classes {
                            if symmetric_match(primary, secondary, ca, cb) {
                                reasons.extend(
                                    rule.describe(&format!("Class {ca}"), &format!("class {cb}")),
                                );
                            }
                        }
                    }
                }
                RuleScope::GroupToGroup { primary, secondary } => {
                    for ga in &a.segregation_groups {
                        for gb in &b.segregation_groups {
                            if symmetric_match(primary, secondary, ga, gb) {
                                reasons.extend(
                                    rule.describe(&format!("Group {ga}"), &format!("group {gb}")),
                                );
                            }
                        }
                    }
                }
                RuleScope::ClassToGroup { class, group } => {
                    // Class of one entry against a group of the other, both ways round.
                    for (classes, groups) in [
                        (&a_classes, &b.segregation_groups),
                        (&b_classes, &a.segregation_groups),
                    ] {
                        for c in classes.iter().filter(|c| *c == class) {
                            for g in groups.iter().filter(|g| *g == group) {
                                reasons.extend(
                                    rule.describe(&format!("Class {c}"), &format!("group {g}")),
                                );
                            }
                        }
                    }
                }
            }
        }

        reasons
    }
}

fn symmetric_match(primary: &str, secondary: &str, left: &str, right: &str) -> bool {
    (primary == left && secondary == right) || (primary == right && secondary == left)
}

impl DgCompatibility for SegregationTable {
    fn check(
        &self,
        entries: &[DangerousGoodEntry],
    ) -> Result<CompatibilityVerdict, CollaboratorError> {
        if entries.len() < 2 {
            return Ok(CompatibilityVerdict::compatible());
        }

        let mut reasons = Vec::new();
        for (i, a) in entries.iter().enumerate() {
            for b in &entries[i + 1..] {
                reasons.extend(self.check_pair(a, b));
            }
        }

        let classes: Vec<String> = entries.iter().flat_map(|e| e.hazard_classes()).collect();
        let present = |class: &str| classes.iter().any(|c| c == class);
        for rule in &self.group_rules {
            if present(&rule.class_a) && present(&rule.class_b) {
                reasons.push(rule.reason.clone());
            }
        }

        Ok(CompatibilityVerdict::from_reasons(reasons))
    }
}
