//! # Plan Rewriter
//!
//! This module implements turvec's rule-based rewriter. Rules rewrite a
//! [`LogicalOperator`] tree in place; the rewriter drives them to a fixed
//! point.
//!
//! ## Rule Application Strategy
//!
//! 1. Apply every rule, in order, to the current node
//! 2. Recurse into the node's children (after the rules, so a rule that
//!    replaces a subtree sees the replacement's children next)
//! 3. If anything changed, repeat the whole pass from the root
//! 4. Stop when a pass changes nothing or `OPTIMIZER_MAX_ITERATIONS` passes
//!    have run
//!
//! Rules must be conservative: a rule that cannot prove a rewrite preserves
//! results leaves the plan untouched and returns `Ok(false)`.
//!
//! ## Usage
//!
//! ```ignore
//! use turvec::sql::optimizer::Rewriter;
//!
//! let mut plan = LogicalOperator::limit(order_by_distance, 10);
//! Rewriter::new().rewrite(&mut plan)?;
//! let op = PhysicalPlanGenerator::create(plan)?;
//! ```

pub mod rules;

use crate::config::OPTIMIZER_MAX_ITERATIONS;
use crate::sql::planner::LogicalOperator;
use eyre::{Result, WrapErr};
use tracing::{debug, warn};

pub trait RewriteRule {
    fn name(&self) -> &'static str;

    /// Rewrites `plan` in place; `Ok(true)` when something changed.
    fn apply(&self, plan: &mut LogicalOperator) -> Result<bool>;
}

pub struct Rewriter {
    rules: Vec<Box<dyn RewriteRule + Send + Sync>>,
    max_iterations: usize,
}

impl Rewriter {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::PredicatePushdownRule),
                Box::new(rules::VectorIndexScanRule),
            ],
            max_iterations: OPTIMIZER_MAX_ITERATIONS,
        }
    }

    pub fn with_rules(rules: Vec<Box<dyn RewriteRule + Send + Sync>>) -> Self {
        Self {
            rules,
            max_iterations: OPTIMIZER_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn add_rule(&mut self, rule: Box<dyn RewriteRule + Send + Sync>) {
        self.rules.push(rule);
    }

    /// Returns the number of passes that changed the plan.
    pub fn rewrite(&self, plan: &mut LogicalOperator) -> Result<usize> {
        let mut changed_passes = 0;
        for iteration in 0..self.max_iterations {
            if !self.rewrite_once(plan)? {
                return Ok(changed_passes);
            }
            changed_passes += 1;
            if iteration + 1 == self.max_iterations {
                warn!(
                    max_iterations = self.max_iterations,
                    "rewriter reached max iterations, stopping"
                );
            }
        }
        Ok(changed_passes)
    }

    fn rewrite_once(&self, plan: &mut LogicalOperator) -> Result<bool> {
        let mut changed = false;
        for rule in &self.rules {
            if rule
                .apply(plan)
                .wrap_err_with(|| format!("applying rewrite rule '{}'", rule.name()))?
            {
                debug!(rule = rule.name(), node = plan.name(), "rule rewrote plan");
                changed = true;
            }
        }
        for child in plan.children_mut() {
            changed |= self.rewrite_once(child)?;
        }
        Ok(changed)
    }
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FieldDef;
    use crate::storage::Table;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoOpRule;

    impl RewriteRule for NoOpRule {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn apply(&self, _plan: &mut LogicalOperator) -> Result<bool> {
            Ok(false)
        }
    }

    /// Claims a change on every call.
    struct RestlessRule(AtomicUsize);

    impl RewriteRule for RestlessRule {
        fn name(&self) -> &'static str {
            "restless"
        }

        fn apply(&self, _plan: &mut LogicalOperator) -> Result<bool> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(true)
        }
    }

    fn plan() -> LogicalOperator {
        let table = Table::create("t", vec![FieldDef::int("a")]).unwrap();
        LogicalOperator::table_get(table)
    }

    #[test]
    fn no_changes_stops_after_one_pass() {
        let rewriter = Rewriter::with_rules(vec![Box::new(NoOpRule)]);
        let mut plan = plan();
        assert_eq!(rewriter.rewrite(&mut plan).unwrap(), 0);
    }

    #[test]
    fn rewriter_default() {
        let rewriter = Rewriter::default();
        assert_eq!(rewriter.max_iterations, 10);
        assert_eq!(rewriter.rules.len(), 2);
    }

    #[test]
    fn max_iterations_bounds_a_rule_that_never_settles() {
        let rewriter = Rewriter::with_rules(vec![Box::new(RestlessRule(AtomicUsize::new(0)))]).with_max_iterations(3);
        let mut plan = plan();
        assert_eq!(rewriter.rewrite(&mut plan).unwrap(), 3);
    }
}
