//! Typed input resolver
//!
//! Rule parameters arrive as untyped tokens. The resolver checks them
//! against the input shape each rule declares and decodes them into typed
//! values. `Many*` shapes take one token holding `;`-separated elements;
//! elements are trimmed and empty elements are kept, so `"a;;b"` has three.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use trialmatch_diagnostics::{
    Result, TM0101, TM0102, TM0103, TM0104, TM0105, TM0106, TM0108, TrialMatchError,
};
use trialmatch_doid::DoidModel;
use trialmatch_types::{
    CompositeArity, DoidTerm, Parameter, ResolvedInput, Rule, RuleExpression, RuleInput,
    TreatmentCategory, TumorStage,
};

static GENE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Za-z0-9-]*$").expect("valid gene pattern"));
static CODON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]+$").expect("valid codon pattern"));
static PROTEIN_IMPACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(p\.)?[A-Z][0-9]+[A-Za-z0-9_*]*$").expect("valid protein impact pattern")
});
static HLA_ALLELE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]+[0-9]?\*[0-9]{2,3}(:[0-9]{2,3}){0,3}[A-Z]?$")
        .expect("valid HLA allele pattern")
});

fn wrong_type(rule: Rule, message: impl std::fmt::Display) -> TrialMatchError {
    TrialMatchError::configuration(TM0102, format!("{}: {}", rule.name(), message))
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "parameter" } else { "parameters" }
}

/// Validates and decodes rule parameters according to the input catalogue
pub struct FunctionInputResolver {
    doid_model: Arc<DoidModel>,
    catalogue: HashMap<Rule, RuleInput>,
}

impl FunctionInputResolver {
    /// Resolver over the full rule catalogue
    pub fn new(doid_model: Arc<DoidModel>) -> Self {
        Self::with_catalogue(doid_model, Rule::ALL.iter().map(|rule| (*rule, rule.input())))
    }

    /// Resolver over an explicit input catalogue. Rules missing from it have
    /// no known shape: [`resolve`](Self::resolve) rejects them and
    /// [`has_valid_inputs`](Self::has_valid_inputs) answers `None`.
    pub fn with_catalogue(
        doid_model: Arc<DoidModel>,
        catalogue: impl IntoIterator<Item = (Rule, RuleInput)>,
    ) -> Self {
        Self {
            doid_model,
            catalogue: catalogue.into_iter().collect(),
        }
    }

    pub fn input_for(&self, rule: Rule) -> Option<RuleInput> {
        self.catalogue.get(&rule).copied()
    }

    pub fn doid_model(&self) -> &Arc<DoidModel> {
        &self.doid_model
    }

    /// Decode the parameters of `expression` according to its rule's shape
    pub fn resolve(&self, expression: &RuleExpression) -> Result<ResolvedInput> {
        let input = self.input_for(expression.rule).ok_or_else(|| {
            TrialMatchError::configuration(
                TM0108,
                format!("{} has no registered input shape", expression.rule.name()),
            )
        })?;
        self.resolve_as(expression, input)
    }

    /// Whether every parameter of the tree decodes, without raising.
    ///
    /// `None` when some rule in the tree has no registered input shape.
    pub fn has_valid_inputs(&self, expression: &RuleExpression) -> Option<bool> {
        let input = self.input_for(expression.rule)?;
        if !input.is_composite() {
            return Some(self.resolve_as(expression, input).is_ok());
        }
        if self.create_composite_input(expression).is_err() {
            return Some(false);
        }
        for child in expression.children() {
            match self.has_valid_inputs(child) {
                Some(true) => {}
                other => return other,
            }
        }
        Some(true)
    }

    fn resolve_as(&self, expression: &RuleExpression, input: RuleInput) -> Result<ResolvedInput> {
        let resolved = match input {
            RuleInput::None => {
                self.create_no_input(expression)?;
                ResolvedInput::None
            }
            RuleInput::OneInteger => ResolvedInput::OneInteger(self.create_one_integer_input(expression)?),
            RuleInput::TwoIntegers => {
                let (first, second) = self.create_two_integers_input(expression)?;
                ResolvedInput::TwoIntegers(first, second)
            }
            RuleInput::ManyIntegers => {
                ResolvedInput::ManyIntegers(self.create_many_integers_input(expression)?)
            }
            RuleInput::OneDouble => ResolvedInput::OneDouble(self.create_one_double_input(expression)?),
            RuleInput::TwoDoubles => {
                let (first, second) = self.create_two_doubles_input(expression)?;
                ResolvedInput::TwoDoubles(first, second)
            }
            RuleInput::OneString => ResolvedInput::OneString(self.create_one_string_input(expression)?),
            RuleInput::ManyStrings => {
                ResolvedInput::ManyStrings(self.create_many_strings_input(expression)?)
            }
            RuleInput::OneIntegerOneString => {
                let (integer, string) = self.create_one_integer_one_string_input(expression)?;
                ResolvedInput::OneIntegerOneString { integer, string }
            }
            RuleInput::OneIntegerManyStrings => {
                let (integer, strings) = self.create_one_integer_many_strings_input(expression)?;
                ResolvedInput::OneIntegerManyStrings { integer, strings }
            }
            RuleInput::OneTreatmentCategory => ResolvedInput::OneTreatmentCategory(
                self.create_one_treatment_category_input(expression)?,
            ),
            RuleInput::OneTreatmentCategoryOneInteger => {
                let (category, integer) =
                    self.create_one_treatment_category_one_integer_input(expression)?;
                ResolvedInput::OneTreatmentCategoryOneInteger { category, integer }
            }
            RuleInput::OneTumorStage => {
                ResolvedInput::OneTumorStage(self.create_one_tumor_stage_input(expression)?)
            }
            RuleInput::ManyTumorStages => {
                ResolvedInput::ManyTumorStages(self.create_many_tumor_stages_input(expression)?)
            }
            RuleInput::OneDoidTerm => {
                ResolvedInput::OneDoidTerm(self.create_one_doid_term_input(expression)?)
            }
            RuleInput::ManyDoidTerms => {
                ResolvedInput::ManyDoidTerms(self.create_many_doid_terms_input(expression)?)
            }
            RuleInput::OneIntegerManyDoidTerms => {
                let (integer, doid_terms) =
                    self.create_one_integer_many_doid_terms_input(expression)?;
                ResolvedInput::OneIntegerManyDoidTerms { integer, doid_terms }
            }
            RuleInput::OneGene => ResolvedInput::OneGene(self.create_one_gene_input(expression)?),
            RuleInput::ManyGenes => ResolvedInput::ManyGenes(self.create_many_genes_input(expression)?),
            RuleInput::OneGeneOneInteger => {
                let (gene, integer) = self.create_one_gene_one_integer_input(expression)?;
                ResolvedInput::OneGeneOneInteger { gene, integer }
            }
            RuleInput::OneGeneManyCodons => {
                let (gene, codons) = self.create_one_gene_many_codons_input(expression)?;
                ResolvedInput::OneGeneManyCodons { gene, codons }
            }
            RuleInput::OneGeneManyProteinImpacts => {
                let (gene, protein_impacts) =
                    self.create_one_gene_many_protein_impacts_input(expression)?;
                ResolvedInput::OneGeneManyProteinImpacts { gene, protein_impacts }
            }
            RuleInput::OneHlaAllele => {
                ResolvedInput::OneHlaAllele(self.create_one_hla_allele_input(expression)?)
            }
            RuleInput::Composite(_) => ResolvedInput::Composite(
                self.create_composite_input(expression)?
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
        };
        Ok(resolved)
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    /// The `expected` tokens of a leaf rule
    fn tokens<'a>(&self, expression: &'a RuleExpression, expected: usize) -> Result<Vec<&'a str>> {
        let rule = expression.rule;
        let actual = expression.parameters.len();
        if actual != expected {
            return Err(TrialMatchError::configuration(
                TM0101,
                format!(
                    "{} expects {} {}, got {}",
                    rule.name(),
                    expected,
                    plural(expected),
                    actual
                ),
            ));
        }
        expression
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| match parameter {
                Parameter::Token(token) => Ok(token.as_str()),
                Parameter::Function(child) => Err(TrialMatchError::configuration(
                    TM0105,
                    format!(
                        "{} expects a value as parameter {}, got sub-criterion {}",
                        rule.name(),
                        index + 1,
                        child.rule.name()
                    ),
                )),
            })
            .collect()
    }

    fn single<'a>(&self, expression: &'a RuleExpression) -> Result<&'a str> {
        let tokens = self.tokens(expression, 1)?;
        Ok(tokens[0])
    }

    fn pair<'a>(&self, expression: &'a RuleExpression) -> Result<(&'a str, &'a str)> {
        let tokens = self.tokens(expression, 2)?;
        Ok((tokens[0], tokens[1]))
    }

    fn split_many(token: &str) -> Vec<&str> {
        token.split(';').map(str::trim).collect()
    }

    // ------------------------------------------------------------------
    // Primitive decoding
    // ------------------------------------------------------------------

    fn integer(rule: Rule, token: &str) -> Result<i32> {
        token
            .trim()
            .parse::<i32>()
            .map_err(|_| wrong_type(rule, format_args!("'{}' is not a valid integer", token)))
    }

    fn double(rule: Rule, token: &str) -> Result<f64> {
        match token.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(wrong_type(rule, format_args!("'{}' is not a valid number", token))),
        }
    }

    fn tumor_stage(rule: Rule, token: &str) -> Result<TumorStage> {
        TumorStage::from_str(token.trim()).map_err(|err| wrong_type(rule, err))
    }

    fn treatment_category(rule: Rule, token: &str) -> Result<TreatmentCategory> {
        TreatmentCategory::from_str(token.trim()).map_err(|err| wrong_type(rule, err))
    }

    fn matching(rule: Rule, token: &str, pattern: &Regex, kind: &str) -> Result<String> {
        let token = token.trim();
        if pattern.is_match(token) {
            Ok(token.to_string())
        } else {
            Err(wrong_type(rule, format_args!("'{}' is not a valid {}", token, kind)))
        }
    }

    fn gene(rule: Rule, token: &str) -> Result<String> {
        Self::matching(rule, token, &GENE, "gene")
    }

    fn doid_term(&self, rule: Rule, token: &str) -> Result<DoidTerm> {
        let term = token.trim();
        match self.doid_model.resolve_doid_for_term(term) {
            Some(doid) => Ok(DoidTerm::new(term, doid)),
            None => Err(TrialMatchError::configuration(
                TM0106,
                format!("{}: '{}' is not a known DOID term", rule.name(), term),
            )),
        }
    }

    fn doid_terms(&self, rule: Rule, token: &str) -> Result<Vec<DoidTerm>> {
        Self::split_many(token)
            .into_iter()
            .map(|term| self.doid_term(rule, term))
            .collect()
    }

    // ------------------------------------------------------------------
    // Typed inputs, one per shape
    // ------------------------------------------------------------------

    pub fn create_no_input(&self, expression: &RuleExpression) -> Result<()> {
        self.tokens(expression, 0).map(|_| ())
    }

    pub fn create_one_integer_input(&self, expression: &RuleExpression) -> Result<i32> {
        Self::integer(expression.rule, self.single(expression)?)
    }

    pub fn create_two_integers_input(&self, expression: &RuleExpression) -> Result<(i32, i32)> {
        let (first, second) = self.pair(expression)?;
        Ok((
            Self::integer(expression.rule, first)?,
            Self::integer(expression.rule, second)?,
        ))
    }

    pub fn create_many_integers_input(&self, expression: &RuleExpression) -> Result<Vec<i32>> {
        Self::split_many(self.single(expression)?)
            .into_iter()
            .map(|token| Self::integer(expression.rule, token))
            .collect()
    }

    pub fn create_one_double_input(&self, expression: &RuleExpression) -> Result<f64> {
        Self::double(expression.rule, self.single(expression)?)
    }

    pub fn create_two_doubles_input(&self, expression: &RuleExpression) -> Result<(f64, f64)> {
        let (first, second) = self.pair(expression)?;
        Ok((
            Self::double(expression.rule, first)?,
            Self::double(expression.rule, second)?,
        ))
    }

    pub fn create_one_string_input(&self, expression: &RuleExpression) -> Result<String> {
        Ok(self.single(expression)?.trim().to_string())
    }

    pub fn create_many_strings_input(&self, expression: &RuleExpression) -> Result<Vec<String>> {
        Ok(Self::split_many(self.single(expression)?)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn create_one_integer_one_string_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(i32, String)> {
        let (integer, string) = self.pair(expression)?;
        Ok((Self::integer(expression.rule, integer)?, string.trim().to_string()))
    }

    pub fn create_one_integer_many_strings_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(i32, Vec<String>)> {
        let (integer, strings) = self.pair(expression)?;
        Ok((
            Self::integer(expression.rule, integer)?,
            Self::split_many(strings).into_iter().map(str::to_string).collect(),
        ))
    }

    pub fn create_one_treatment_category_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<TreatmentCategory> {
        Self::treatment_category(expression.rule, self.single(expression)?)
    }

    pub fn create_one_treatment_category_one_integer_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(TreatmentCategory, i32)> {
        let (category, integer) = self.pair(expression)?;
        Ok((
            Self::treatment_category(expression.rule, category)?,
            Self::integer(expression.rule, integer)?,
        ))
    }

    pub fn create_one_tumor_stage_input(&self, expression: &RuleExpression) -> Result<TumorStage> {
        Self::tumor_stage(expression.rule, self.single(expression)?)
    }

    pub fn create_many_tumor_stages_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<Vec<TumorStage>> {
        Self::split_many(self.single(expression)?)
            .into_iter()
            .map(|token| Self::tumor_stage(expression.rule, token))
            .collect()
    }

    pub fn create_one_doid_term_input(&self, expression: &RuleExpression) -> Result<DoidTerm> {
        self.doid_term(expression.rule, self.single(expression)?)
    }

    pub fn create_many_doid_terms_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<Vec<DoidTerm>> {
        self.doid_terms(expression.rule, self.single(expression)?)
    }

    pub fn create_one_integer_many_doid_terms_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(i32, Vec<DoidTerm>)> {
        let (integer, terms) = self.pair(expression)?;
        Ok((
            Self::integer(expression.rule, integer)?,
            self.doid_terms(expression.rule, terms)?,
        ))
    }

    pub fn create_one_gene_input(&self, expression: &RuleExpression) -> Result<String> {
        Self::gene(expression.rule, self.single(expression)?)
    }

    pub fn create_many_genes_input(&self, expression: &RuleExpression) -> Result<Vec<String>> {
        Self::split_many(self.single(expression)?)
            .into_iter()
            .map(|token| Self::gene(expression.rule, token))
            .collect()
    }

    pub fn create_one_gene_one_integer_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(String, i32)> {
        let (gene, integer) = self.pair(expression)?;
        Ok((
            Self::gene(expression.rule, gene)?,
            Self::integer(expression.rule, integer)?,
        ))
    }

    pub fn create_one_gene_many_codons_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(String, Vec<String>)> {
        let (gene, codons) = self.pair(expression)?;
        let codons = Self::split_many(codons)
            .into_iter()
            .map(|codon| Self::matching(expression.rule, codon, &CODON, "codon"))
            .collect::<Result<Vec<_>>>()?;
        Ok((Self::gene(expression.rule, gene)?, codons))
    }

    pub fn create_one_gene_many_protein_impacts_input(
        &self,
        expression: &RuleExpression,
    ) -> Result<(String, Vec<String>)> {
        let (gene, impacts) = self.pair(expression)?;
        let impacts = Self::split_many(impacts)
            .into_iter()
            .map(|impact| {
                Self::matching(expression.rule, impact, &PROTEIN_IMPACT, "protein impact")
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((Self::gene(expression.rule, gene)?, impacts))
    }

    pub fn create_one_hla_allele_input(&self, expression: &RuleExpression) -> Result<String> {
        Self::matching(expression.rule, self.single(expression)?, &HLA_ALLELE, "HLA allele")
    }

    /// Sub-criteria of a composite rule, checked against its arity
    pub fn create_composite_input<'a>(
        &self,
        expression: &'a RuleExpression,
    ) -> Result<Vec<&'a RuleExpression>> {
        let rule = expression.rule;
        let arity = match self.input_for(rule) {
            Some(RuleInput::Composite(arity)) => arity,
            Some(other) => {
                return Err(wrong_type(
                    rule,
                    format_args!("not a composite rule, expects {}", other.describe()),
                ));
            }
            None => {
                return Err(TrialMatchError::configuration(
                    TM0108,
                    format!("{} has no registered input shape", rule.name()),
                ));
            }
        };

        let children = expression
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| match parameter {
                Parameter::Function(child) => Ok(child),
                Parameter::Token(token) => Err(TrialMatchError::configuration(
                    TM0104,
                    format!(
                        "{} expects a sub-criterion as parameter {}, got '{}'",
                        rule.name(),
                        index + 1,
                        token
                    ),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        if !arity.accepts(children.len()) {
            return Err(arity_error(rule, arity, children.len()));
        }
        Ok(children)
    }
}

fn arity_error(rule: Rule, arity: CompositeArity, actual: usize) -> TrialMatchError {
    TrialMatchError::configuration(
        TM0103,
        format!("{} expects {}, got {}", rule.name(), arity, actual),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::test_support::doid_model;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn resolver() -> FunctionInputResolver {
        FunctionInputResolver::new(Arc::new(doid_model()))
    }

    #[test]
    fn test_one_integer_many_strings_round_trip() {
        let expression =
            RuleExpression::leaf(Rule::HasHadTreatmentWithAnyNameYWithinXYears, ["2", "test1;test2"]);
        assert_eq!(
            resolver().resolve(&expression).unwrap(),
            ResolvedInput::OneIntegerManyStrings {
                integer: 2,
                strings: vec!["test1".to_string(), "test2".to_string()],
            }
        );
    }

    #[test]
    fn test_many_strings_keep_empty_elements() {
        let expression = RuleExpression::leaf(Rule::HasHadTreatmentWithAnyNameX, [" a ;; b"]);
        assert_eq!(
            resolver().create_many_strings_input(&expression).unwrap(),
            vec!["a", "", "b"]
        );
    }

    #[rstest]
    #[case(RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18"]), ResolvedInput::OneInteger(18))]
    #[case(RuleExpression::leaf(Rule::HasHadSystemicTreatmentLinesBetweenXAndY, ["1", "3"]), ResolvedInput::TwoIntegers(1, 3))]
    #[case(RuleExpression::leaf(Rule::HasWhoStatusOfAnyOfX, ["0;1"]), ResolvedInput::ManyIntegers(vec![0, 1]))]
    #[case(RuleExpression::leaf(Rule::TmbOfAtLeastX, ["10.5"]), ResolvedInput::OneDouble(10.5))]
    #[case(RuleExpression::leaf(Rule::HasPotassiumMmolPerLBetweenXAndY, ["3.5", "5"]), ResolvedInput::TwoDoubles(3.5, 5.0))]
    #[case(RuleExpression::leaf(Rule::HasHadTreatmentNameX, [" Pembrolizumab "]), ResolvedInput::OneString("Pembrolizumab".into()))]
    #[case(RuleExpression::leaf(Rule::HasHadAtLeastXCyclesOfTreatmentNameY, ["4", "Carboplatin"]), ResolvedInput::OneIntegerOneString { integer: 4, string: "Carboplatin".into() })]
    #[case(RuleExpression::leaf(Rule::HasHadCategoryXTreatment, ["IMMUNOTHERAPY"]), ResolvedInput::OneTreatmentCategory(TreatmentCategory::Immunotherapy))]
    #[case(RuleExpression::leaf(Rule::HasHadCategoryXTreatmentOfAtLeastYLines, ["CHEMOTHERAPY", "2"]), ResolvedInput::OneTreatmentCategoryOneInteger { category: TreatmentCategory::Chemotherapy, integer: 2 })]
    #[case(RuleExpression::leaf(Rule::HasTumorStageX, ["IIIB"]), ResolvedInput::OneTumorStage(TumorStage::IIIB))]
    #[case(RuleExpression::leaf(Rule::HasAnyStageX, ["III;IV"]), ResolvedInput::ManyTumorStages(vec![TumorStage::III, TumorStage::IV]))]
    #[case(RuleExpression::leaf(Rule::HasPrimaryTumorBelongingToDoidTermX, ["Lung Cancer"]), ResolvedInput::OneDoidTerm(DoidTerm::new("Lung Cancer", "1324")))]
    #[case(RuleExpression::leaf(Rule::HasHadConditionWithAnyDoidTermYWithinXYears, ["5", "cancer;melanoma"]), ResolvedInput::OneIntegerManyDoidTerms { integer: 5, doid_terms: vec![DoidTerm::new("cancer", "162"), DoidTerm::new("melanoma", "1909")] })]
    #[case(RuleExpression::leaf(Rule::ActivatingMutationInAnyGenesX, ["BRAF;KRAS"]), ResolvedInput::ManyGenes(vec!["BRAF".into(), "KRAS".into()]))]
    #[case(RuleExpression::leaf(Rule::AmplificationOfGeneXOfAtLeastYCopies, ["ERBB2", "6"]), ResolvedInput::OneGeneOneInteger { gene: "ERBB2".into(), integer: 6 })]
    #[case(RuleExpression::leaf(Rule::MutationInGeneXOfAnyCodonY, ["KRAS", "G12;G13"]), ResolvedInput::OneGeneManyCodons { gene: "KRAS".into(), codons: vec!["G12".into(), "G13".into()] })]
    #[case(RuleExpression::leaf(Rule::MutationInGeneXOfAnyProteinImpactsY, ["BRAF", "V600E;p.V600K"]), ResolvedInput::OneGeneManyProteinImpacts { gene: "BRAF".into(), protein_impacts: vec!["V600E".into(), "p.V600K".into()] })]
    #[case(RuleExpression::leaf(Rule::HasHlaTypeX, ["A*02:01"]), ResolvedInput::OneHlaAllele("A*02:01".into()))]
    #[case(RuleExpression::leaf(Rule::IsMale, Vec::<String>::new()), ResolvedInput::None)]
    fn test_resolve_each_shape(#[case] expression: RuleExpression, #[case] expected: ResolvedInput) {
        assert_eq!(resolver().resolve(&expression).unwrap(), expected);
    }

    #[rstest]
    #[case(RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18", "20"]), TM0101)]
    #[case(RuleExpression::leaf(Rule::IsAtLeastXYearsOld, Vec::<String>::new()), TM0101)]
    #[case(RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["eighteen"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::IsMale, ["1"]), TM0101)]
    #[case(RuleExpression::leaf(Rule::TmbOfAtLeastX, ["NaN"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::HasTumorStageX, ["V"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::HasHadCategoryXTreatment, ["MAGIC"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::HasPrimaryTumorBelongingToDoidTermX, ["unicorn disease"]), TM0106)]
    #[case(RuleExpression::leaf(Rule::ActivatingMutationInGeneX, ["braf v600"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::ActivatingMutationInAnyGenesX, ["BRAF;;KRAS"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::MutationInGeneXOfAnyCodonY, ["KRAS", "12"]), TM0102)]
    #[case(RuleExpression::leaf(Rule::HasHlaTypeX, ["A02"]), TM0102)]
    #[case(RuleExpression::composite(Rule::IsAtLeastXYearsOld, [RuleExpression::leaf(Rule::IsMale, Vec::<String>::new())]), TM0105)]
    #[case(RuleExpression::leaf(Rule::Not, ["IS_MALE"]), TM0104)]
    #[case(RuleExpression::composite(Rule::Not, Vec::new()), TM0103)]
    #[case(RuleExpression::composite(Rule::Or, [RuleExpression::leaf(Rule::IsMale, Vec::<String>::new())]), TM0103)]
    fn test_rejects(#[case] expression: RuleExpression, #[case] code: trialmatch_diagnostics::ErrorCode) {
        let resolver = resolver();
        let err = resolver.resolve(&expression).unwrap_err();
        assert_eq!(err.code(), code, "{} gave {}", expression, err);
        assert_eq!(resolver.has_valid_inputs(&expression), Some(false));
    }

    #[test]
    fn test_has_valid_inputs_recurses_into_composites() {
        let resolver = resolver();
        let valid = RuleExpression::composite(
            Rule::And,
            [
                RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18"]),
                RuleExpression::composite(Rule::Not, [RuleExpression::leaf(Rule::HasTumorStageX, ["IV"])]),
            ],
        );
        assert_eq!(resolver.has_valid_inputs(&valid), Some(true));

        let invalid = RuleExpression::composite(
            Rule::And,
            [
                RuleExpression::leaf(Rule::IsAtLeastXYearsOld, ["18"]),
                RuleExpression::composite(Rule::Not, [RuleExpression::leaf(Rule::HasTumorStageX, ["VI"])]),
            ],
        );
        assert_eq!(resolver.has_valid_inputs(&invalid), Some(false));
    }

    #[test]
    fn test_missing_shape_is_none() {
        let resolver = FunctionInputResolver::with_catalogue(
            Arc::new(doid_model()),
            [(Rule::And, Rule::And.input()), (Rule::IsMale, RuleInput::None)],
        );
        let expression = RuleExpression::composite(
            Rule::And,
            [
                RuleExpression::leaf(Rule::IsMale, Vec::<String>::new()),
                RuleExpression::leaf(Rule::IsFemale, Vec::<String>::new()),
            ],
        );
        assert_eq!(resolver.has_valid_inputs(&expression), None);
        let err = resolver
            .resolve(&RuleExpression::leaf(Rule::IsFemale, Vec::<String>::new()))
            .unwrap_err();
        assert_eq!(err.code(), TM0108);
    }
}
