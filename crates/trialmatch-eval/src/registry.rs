//! Rule dispatch registry
//!
//! Maps every catalogued rule to the creator that builds its evaluator.
//! Leaf creators decode their parameters through the
//! [`FunctionInputResolver`](crate::FunctionInputResolver) and capture them
//! in an immutable evaluator. Composite creators receive the already built
//! sub-criterion evaluators.

use crate::context::RuleContext;
use crate::function::SharedFunction;
use crate::functions;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use trialmatch_diagnostics::{Result, RulePath, TM0100, TM0107, TrialMatchError};
use trialmatch_types::{Rule, RuleExpression};

/// Type alias for leaf rule creators
pub type LeafCreator =
    Arc<dyn Fn(&RuleExpression, &RuleContext) -> Result<SharedFunction> + Send + Sync>;

/// Type alias for composite rule creators
pub type CompositeCreator = Arc<dyn Fn(Vec<SharedFunction>) -> Result<SharedFunction> + Send + Sync>;

/// Creator registered for one rule
#[derive(Clone)]
pub enum RuleCreator {
    Leaf(LeafCreator),
    Composite(CompositeCreator),
}

impl RuleCreator {
    pub fn leaf<F>(create: F) -> Self
    where
        F: Fn(&RuleExpression, &RuleContext) -> Result<SharedFunction> + Send + Sync + 'static,
    {
        Self::Leaf(Arc::new(create))
    }

    pub fn composite<F>(create: F) -> Self
    where
        F: Fn(Vec<SharedFunction>) -> Result<SharedFunction> + Send + Sync + 'static,
    {
        Self::Composite(Arc::new(create))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

/// Registry of rule creators
pub struct RuleRegistry {
    context: RuleContext,
    creators: HashMap<Rule, RuleCreator>,
}

impl RuleRegistry {
    /// Create a registry without any creators
    pub fn new(context: RuleContext) -> Self {
        Self {
            context,
            creators: HashMap::new(),
        }
    }

    /// Create a registry with a creator for every catalogued rule
    pub fn with_standard_rules(context: RuleContext) -> Self {
        let mut registry = Self::new(context);
        for rule in Rule::ALL {
            registry.register(*rule, functions::creator_for(*rule));
        }
        debug!("Registered {} standard rule creators", registry.len());
        registry
    }

    /// Register a creator, replacing and returning any previous one
    pub fn register(&mut self, rule: Rule, creator: RuleCreator) -> Option<RuleCreator> {
        self.creators.insert(rule, creator)
    }

    pub fn creator(&self, rule: Rule) -> Option<&RuleCreator> {
        self.creators.get(&rule)
    }

    pub fn context(&self) -> &RuleContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    /// Check that every catalogued rule has exactly one creator of the right
    /// kind and an input shape in the resolver.
    pub fn verify(&self) -> Result<()> {
        let resolver = self.context.resolver();
        let mut errors = Vec::new();

        for rule in Rule::ALL {
            let problem = match (self.creators.get(rule), resolver.input_for(*rule)) {
                (None, _) => Some("has no creator".to_string()),
                (_, None) => Some("has no input shape".to_string()),
                (Some(creator), Some(input)) if creator.is_composite() != input.is_composite() => {
                    Some(format!(
                        "has a {} creator but declares {}",
                        if creator.is_composite() { "composite" } else { "leaf" },
                        input.describe()
                    ))
                }
                _ => None,
            };
            if let Some(problem) = problem {
                errors.push(TrialMatchError::configuration(
                    TM0107,
                    format!("{} {}", rule.name(), problem),
                ));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(TrialMatchError::Multiple(errors)),
        }
    }

    /// Build the evaluator for a criterion tree
    pub fn create(&self, expression: &RuleExpression) -> Result<SharedFunction> {
        self.create_at(expression, &RulePath::root(expression.rule.name()))
    }

    fn create_at(&self, expression: &RuleExpression, path: &RulePath) -> Result<SharedFunction> {
        let creator = self.creators.get(&expression.rule).ok_or_else(|| {
            TrialMatchError::configuration(
                TM0100,
                format!("no creator registered for {}", expression.rule.name()),
            )
            .at_path(path)
        })?;

        match creator {
            RuleCreator::Leaf(create) => {
                create(expression, &self.context).map_err(|err| err.at_path(path))
            }
            RuleCreator::Composite(create) => {
                let children = self
                    .context
                    .resolver()
                    .create_composite_input(expression)
                    .map_err(|err| err.at_path(path))?;
                let built = children
                    .into_iter()
                    .enumerate()
                    .map(|(index, child)| {
                        self.create_at(child, &path.child(index, child.rule.name()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                create(built).map_err(|err| err.at_path(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::test_support::{context, record};
    use pretty_assertions::assert_eq;
    use trialmatch_diagnostics::{TM0101, TM0103};
    use trialmatch_model::PatientRecord;
    use trialmatch_types::{Evaluation, EvaluationResult, RuleInput};

    /// Well-formed tokens for a leaf input shape
    fn sample_tokens(input: RuleInput) -> Vec<&'static str> {
        match input {
            RuleInput::None => vec![],
            RuleInput::OneInteger => vec!["2"],
            RuleInput::TwoIntegers => vec!["1", "3"],
            RuleInput::ManyIntegers => vec!["1;2"],
            RuleInput::OneDouble => vec!["1.5"],
            RuleInput::TwoDoubles => vec!["3.5", "5.0"],
            RuleInput::OneString => vec!["pembrolizumab"],
            RuleInput::ManyStrings => vec!["pembrolizumab;nivolumab"],
            RuleInput::OneIntegerOneString => vec!["2", "pembrolizumab"],
            RuleInput::OneIntegerManyStrings => vec!["2", "pembrolizumab;nivolumab"],
            RuleInput::OneTreatmentCategory => vec!["IMMUNOTHERAPY"],
            RuleInput::OneTreatmentCategoryOneInteger => vec!["IMMUNOTHERAPY", "2"],
            RuleInput::OneTumorStage => vec!["IV"],
            RuleInput::ManyTumorStages => vec!["IIIC;IV"],
            RuleInput::OneDoidTerm => vec!["lung cancer"],
            RuleInput::ManyDoidTerms => vec!["lung cancer;melanoma"],
            RuleInput::OneIntegerManyDoidTerms => vec!["2", "breast cancer;melanoma"],
            RuleInput::OneGene => vec!["EGFR"],
            RuleInput::ManyGenes => vec!["EGFR;ALK"],
            RuleInput::OneGeneOneInteger => vec!["ERBB2", "3"],
            RuleInput::OneGeneManyCodons => vec!["KRAS", "G12;G13"],
            RuleInput::OneGeneManyProteinImpacts => vec!["BRAF", "p.V600E;V600K"],
            RuleInput::OneHlaAllele => vec!["A*02:01"],
            RuleInput::Composite(_) => unreachable!("composite rules take sub-criteria"),
        }
    }

    #[test]
    fn test_standard_registry_is_complete() {
        let registry = RuleRegistry::with_standard_rules(context());
        assert_eq!(registry.len(), Rule::ALL.len());
        registry.verify().unwrap();
        for rule in Rule::ALL {
            let creator = registry.creator(*rule).unwrap();
            assert_eq!(creator.is_composite(), rule.is_composite(), "{}", rule);
        }
    }

    #[test]
    fn test_leaf_creators_accept_their_declared_shape() {
        let registry = RuleRegistry::with_standard_rules(context());
        for rule in Rule::ALL.iter().filter(|rule| !rule.is_composite()) {
            let expression = RuleExpression::leaf(*rule, sample_tokens(rule.input()));
            assert_eq!(
                registry.context().resolver().has_valid_inputs(&expression),
                Some(true),
                "{}",
                expression
            );
            if let Err(err) = registry.create(&expression) {
                panic!("{} failed to build: {}", expression, err);
            }
        }
    }

    #[test]
    fn test_verify_reports_missing_creators() {
        let mut registry = RuleRegistry::new(context());
        registry.register(Rule::IsMale, functions::creator_for(Rule::IsMale));
        let err = registry.verify().unwrap_err();
        assert_eq!(err.code(), TM0107);
        assert!(matches!(err, TrialMatchError::Multiple(ref errors) if errors.len() == Rule::ALL.len() - 1));
    }

    #[test]
    fn test_verify_reports_wrong_kind() {
        let mut registry = RuleRegistry::with_standard_rules(context());
        registry.register(
            Rule::Not,
            RuleCreator::leaf(|_, _| Ok(Arc::new(|_: &PatientRecord| Evaluation::pass("", "")))),
        );
        let err = registry.verify().unwrap_err();
        assert_eq!(err.code(), TM0107);
        assert!(err.to_string().contains("NOT has a leaf creator"));
    }

    #[test]
    fn test_errors_carry_rule_path() {
        let registry = RuleRegistry::with_standard_rules(context());
        let expression = RuleExpression::composite(
            Rule::And,
            [
                RuleExpression::leaf(Rule::IsMale, Vec::<String>::new()),
                RuleExpression::composite(
                    Rule::Or,
                    [
                        RuleExpression::leaf(Rule::IsFemale, Vec::<String>::new()),
                        RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18", "65"]),
                    ],
                ),
            ],
        );
        let err = registry.create(&expression).err().unwrap();
        assert_eq!(err.code(), TM0101);
        assert_eq!(
            err.path().map(ToString::to_string).as_deref(),
            Some("AND > OR#1 > IS_AT_LEAST_X_YEARS_OLD#1")
        );
    }

    #[test]
    fn test_composite_arity_checked_at_construction() {
        let registry = RuleRegistry::with_standard_rules(context());
        let expression = RuleExpression::composite(
            Rule::Fallback,
            [RuleExpression::leaf(Rule::IsMale, Vec::<String>::new())],
        );
        let err = registry.create(&expression).err().unwrap();
        assert_eq!(err.code(), TM0103);
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("FALLBACK"));
    }

    #[test]
    fn test_custom_creator_overrides_standard() {
        let mut registry = RuleRegistry::with_standard_rules(context());
        let previous = registry.register(
            Rule::IsPregnant,
            RuleCreator::leaf(|_, _| {
                Ok(Arc::new(|_: &PatientRecord| Evaluation::fail("Patient is not pregnant", "")))
            }),
        );
        assert!(previous.is_some());

        let evaluator = registry
            .create(&RuleExpression::leaf(Rule::IsPregnant, Vec::<String>::new()))
            .unwrap();
        assert_eq!(evaluator.evaluate(&record()).result(), EvaluationResult::Fail);
    }
}
