//! Attack classes run by the active scanner and the rule ids behind them.

use serde::Serialize;

/// One vulnerability class and the daemon rule ids that implement it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackClass {
    pub name: &'static str,
    pub rule_ids: &'static [&'static str],
}

/// Reference catalog, in the order active scans run.
const ATTACK_CLASSES: &[AttackClass] = &[
    AttackClass {
        name: "DIRECTORY_BROWSING",
        rule_ids: &["0"],
    },
    AttackClass {
        name: "PATH_TRAVERSAL",
        rule_ids: &["6"],
    },
    AttackClass {
        name: "REMOTE_FILE_INCLUSION",
        rule_ids: &["7"],
    },
    AttackClass {
        name: "SOURCE_CODE_DISCLOSURE",
        rule_ids: &["10045"],
    },
    AttackClass {
        name: "REMOTE_CODE_EXECUTION",
        rule_ids: &["20018"],
    },
    AttackClass {
        name: "EXTERNAL_REDIRECT",
        rule_ids: &["20019"],
    },
    AttackClass {
        name: "BUFFER_OVERFLOW",
        rule_ids: &["30001"],
    },
    AttackClass {
        name: "FORMAT_STRING_ERROR",
        rule_ids: &["30002"],
    },
    AttackClass {
        name: "CRLF_INJECTION",
        rule_ids: &["40003"],
    },
    AttackClass {
        name: "PARAMETER_TAMPERING",
        rule_ids: &["40008"],
    },
    AttackClass {
        name: "SERVER_SIDE_INCLUDE",
        rule_ids: &["40009"],
    },
    AttackClass {
        name: "CROSS_SITE_SCRIPTING",
        rule_ids: &["40012", "40014", "40016", "40017"],
    },
    AttackClass {
        name: "SQL_INJECTION",
        rule_ids: &["40018"],
    },
    AttackClass {
        name: "SCRIPT_ACTIVE_SCAN_RULES",
        rule_ids: &["50000"],
    },
    AttackClass {
        name: "SERVER_SIDE_CODE_INJECTION",
        rule_ids: &["90019"],
    },
    AttackClass {
        name: "REMOTE_OS_COMMAND_INJECTION",
        rule_ids: &["90020"],
    },
];

/// Immutable, ordered list of attack classes.
#[derive(Debug, Clone)]
pub struct AttackCatalog {
    classes: Vec<AttackClass>,
}

impl Default for AttackCatalog {
    fn default() -> Self {
        Self::new(ATTACK_CLASSES.to_vec())
    }
}

impl AttackCatalog {
    pub fn new(classes: Vec<AttackClass>) -> Self {
        Self { classes }
    }

    pub fn rule_ids_for(&self, attack_class: &str) -> Option<&'static [&'static str]> {
        self.classes
            .iter()
            .find(|c| c.name == attack_class)
            .map(|c| c.rule_ids)
    }

    pub fn classes(&self) -> &[AttackClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn reference_catalog_has_sixteen_classes() {
        let catalog = AttackCatalog::default();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.classes()[0].name, "DIRECTORY_BROWSING");
        assert_eq!(catalog.classes()[15].name, "REMOTE_OS_COMMAND_INJECTION");
    }

    #[test]
    fn cross_site_scripting_has_four_rules() {
        let catalog = AttackCatalog::default();
        assert_eq!(
            catalog.rule_ids_for("CROSS_SITE_SCRIPTING"),
            Some(&["40012", "40014", "40016", "40017"][..])
        );
        assert_eq!(catalog.rule_ids_for("SQL_INJECTION"), Some(&["40018"][..]));
        assert!(catalog.rule_ids_for("CLICKJACKING").is_none());
    }

    #[test]
    fn names_and_rule_ids_are_unique() {
        let catalog = AttackCatalog::default();
        let names: HashSet<_> = catalog.classes().iter().map(|c| c.name).collect();
        assert_eq!(names.len(), catalog.len());

        let ids: Vec<_> = catalog.classes().iter().flat_map(|c| c.rule_ids).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
