use fockey_core::types::RuleSet;

use crate::parser::ParsedRule;

pub fn build_rule_set(rules: &[ParsedRule]) -> RuleSet {
    let mut set = RuleSet::new();
    merge_into(&mut set, rules);
    set
}

/// Add `rules` to an existing set. Returns how many were new.
pub fn merge_into(set: &mut RuleSet, rules: &[ParsedRule]) -> usize {
    let mut added = 0usize;
    for rule in rules {
        match set.insert(rule.kind, &rule.value) {
            Ok(true) => added += 1,
            Ok(false) => {}
            Err(e) => log::warn!("line {}: skipping {:?}: {e}", rule.line, rule.value),
        }
    }
    log::info!("imported {added} of {} rules", rules.len());
    added
}
