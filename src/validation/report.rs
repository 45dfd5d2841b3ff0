use crate::core::types::{EntityId, Severity};
use crate::rules::{Rule, Violation};
use serde::{Deserialize, Serialize};

/// Triggered flag of one rule, for UI styling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleState {
    pub rule_id: String,
    pub triggered: bool,
}

/// Validation result for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity_id: EntityId,
    /// Triggered rules, highest severity first
    pub violations: Vec<Violation>,
    /// Every evaluated rule in registry order
    pub rule_states: Vec<RuleState>,
}

impl EntityReport {
    pub fn from_rules(entity_id: EntityId, rules: &[Rule]) -> Self {
        let mut violations: Vec<Violation> = rules.iter().filter_map(Rule::violation).collect();
        // Stable, so equal severities keep registry order
        violations.sort_by(|a, b| b.severity.cmp(&a.severity));

        let rule_states = rules
            .iter()
            .map(|rule| RuleState {
                rule_id: rule.id().to_string(),
                triggered: rule.triggered(),
            })
            .collect();

        Self {
            entity_id,
            violations,
            rule_states,
        }
    }

    pub fn worst_severity(&self) -> Severity {
        self.violations
            .first()
            .map(|v| v.severity)
            .unwrap_or(Severity::None)
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn is_triggered(&self, rule_id: &str) -> bool {
        self.rule_states
            .iter()
            .any(|state| state.rule_id == rule_id && state.triggered)
    }

    pub fn violation(&self, rule_id: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.rule_id == rule_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(id: &str, severity: Severity) -> Violation {
        Violation {
            rule_id: id.into(),
            severity,
            short_message: id.into(),
            message: id.into(),
        }
    }

    #[test]
    fn test_worst_severity() {
        let mut report = EntityReport {
            entity_id: EntityId::new(),
            violations: vec![],
            rule_states: vec![],
        };
        assert_eq!(report.worst_severity(), Severity::None);
        assert!(report.is_clean());

        report.violations = vec![violation("b", Severity::High), violation("a", Severity::Low)];
        assert_eq!(report.worst_severity(), Severity::High);
        assert!(report.violation("a").is_some());
        assert!(report.violation("c").is_none());
    }

    #[test]
    fn test_report_serializes() {
        let report = EntityReport {
            entity_id: EntityId::new(),
            violations: vec![violation("powerful", Severity::Low)],
            rule_states: vec![RuleState {
                rule_id: "powerful".into(),
                triggered: true,
            }],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"severity\":\"low\""));
        let back: EntityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
