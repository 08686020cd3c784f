//! Oncological treatment history

use crate::context::RuleContext;
use crate::function::{EvaluationFunction, SharedFunction};
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_model::{PatientRecord, TreatmentHistoryEntry};
use trialmatch_types::{Evaluation, RuleExpression, TreatmentCategory};

struct HasHadTreatmentWithAnyName {
    names: Vec<String>,
}

impl EvaluationFunction for HasHadTreatmentWithAnyName {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let matching = record
            .oncological_history
            .iter()
            .find(|entry| self.names.iter().any(|name| entry.has_name(name)));
        match matching {
            Some(entry) => Evaluation::pass(
                format!("Patient has had treatment with {}", entry.name),
                "Has had treatment",
            ),
            None => Evaluation::fail(
                format!("Patient has not had treatment with {}", self.names.join(" or ")),
                "Has not had treatment",
            ),
        }
    }
}

struct HasHadTreatmentWithinYears {
    names: Vec<String>,
    years: i32,
    reference_year: i32,
}

impl EvaluationFunction for HasHadTreatmentWithinYears {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let min_year = self.reference_year - self.years;
        let mut undetermined = false;

        for entry in &record.oncological_history {
            if !self.names.iter().any(|name| entry.has_name(name)) {
                continue;
            }
            match entry.last_known_year() {
                Some(year) if year > min_year => {
                    return Evaluation::pass(
                        format!(
                            "Patient has had {} within the last {} years",
                            entry.name, self.years
                        ),
                        "Recent treatment",
                    );
                }
                Some(year) if year < min_year => {}
                _ => undetermined = true,
            }
        }

        let names = self.names.join(" or ");
        if undetermined {
            Evaluation::undetermined(
                format!(
                    "Unable to determine whether {} was given within the last {} years",
                    names, self.years
                ),
                "Undetermined recent treatment",
            )
        } else {
            Evaluation::fail(
                format!("Patient has not had {} within the last {} years", names, self.years),
                "No recent treatment",
            )
        }
    }
}

struct HasHadAtLeastCycles {
    name: String,
    min_cycles: i32,
}

impl EvaluationFunction for HasHadAtLeastCycles {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let matching: Vec<&TreatmentHistoryEntry> = record
            .oncological_history
            .iter()
            .filter(|entry| entry.has_name(&self.name))
            .collect();

        if matching
            .iter()
            .any(|entry| entry.number_of_cycles.is_some_and(|c| c >= self.min_cycles))
        {
            Evaluation::pass(
                format!(
                    "Patient has had at least {} cycles of {}",
                    self.min_cycles, self.name
                ),
                "Sufficient treatment cycles",
            )
        } else if matching.iter().any(|entry| entry.number_of_cycles.is_none()) {
            Evaluation::undetermined(
                format!("Number of cycles of {} is unknown", self.name),
                "Unknown treatment cycles",
            )
        } else {
            Evaluation::fail(
                format!(
                    "Patient has not had at least {} cycles of {}",
                    self.min_cycles, self.name
                ),
                "Insufficient treatment cycles",
            )
        }
    }
}

/// Treatment lines counted for a criterion: those that certainly count and
/// those that may count because their category is unknown.
struct LineCount {
    certain: i32,
    possible: i32,
}

impl LineCount {
    fn of_category(record: &PatientRecord, category: TreatmentCategory) -> Self {
        let mut count = Self { certain: 0, possible: 0 };
        for entry in &record.oncological_history {
            if entry.categories.contains(&category) {
                count.certain += 1;
            } else if entry.categories.is_empty() {
                count.possible += 1;
            }
        }
        count
    }

    fn systemic(record: &PatientRecord) -> Self {
        let mut count = Self { certain: 0, possible: 0 };
        for entry in &record.oncological_history {
            if entry.is_systemic() {
                count.certain += 1;
            } else if entry.categories.is_empty() && entry.is_systemic.is_none() {
                count.possible += 1;
            }
        }
        count
    }

    fn max(&self) -> i32 {
        self.certain + self.possible
    }
}

/// Number of treatment lines within `[min, max]`; either bound optional
struct LineRange {
    min: Option<i32>,
    max: Option<i32>,
}

impl LineRange {
    fn contains(&self, lines: i32) -> bool {
        self.min.is_none_or(|min| lines >= min) && self.max.is_none_or(|max| lines <= max)
    }

    /// Some count between `low` and `high` falls in the range
    fn overlaps(&self, low: i32, high: i32) -> bool {
        self.min.is_none_or(|min| high >= min) && self.max.is_none_or(|max| low <= max)
    }

    fn describe(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("between {} and {}", min, max),
            (Some(min), None) => format!("at least {}", min),
            (None, Some(max)) => format!("at most {}", max),
            (None, None) => "any number of".to_string(),
        }
    }
}

/// Lines of one category or of systemic treatment within a range
struct HasHadTreatmentLines {
    category: Option<TreatmentCategory>,
    range: LineRange,
}

impl HasHadTreatmentLines {
    fn kind(&self) -> String {
        match self.category {
            Some(category) => category.display(),
            None => "systemic".to_string(),
        }
    }
}

impl EvaluationFunction for HasHadTreatmentLines {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let count = match self.category {
            Some(category) => LineCount::of_category(record, category),
            None => LineCount::systemic(record),
        };
        let (low, high) = (count.certain, count.max());

        if self.range.contains(low) && self.range.contains(high) {
            Evaluation::pass(
                format!(
                    "Patient has had {} {} treatment lines",
                    self.range.describe(),
                    self.kind()
                ),
                format!("Adequate {} treatment lines", self.kind()),
            )
        } else if self.range.overlaps(low, high) {
            Evaluation::undetermined(
                format!(
                    "Patient has had between {} and {} {} treatment lines, unclear whether {}",
                    low,
                    high,
                    self.kind(),
                    self.range.describe()
                ),
                format!("Undetermined {} treatment lines", self.kind()),
            )
        } else {
            Evaluation::fail(
                format!(
                    "Patient has not had {} {} treatment lines",
                    self.range.describe(),
                    self.kind()
                ),
                format!("Inadequate {} treatment lines", self.kind()),
            )
        }
    }
}

pub(super) fn has_had_treatment_name(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let name = context.resolver().create_one_string_input(expression)?;
    Ok(Arc::new(HasHadTreatmentWithAnyName { names: vec![name] }))
}

pub(super) fn has_had_treatment_with_any_name(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let names = context.resolver().create_many_strings_input(expression)?;
    Ok(Arc::new(HasHadTreatmentWithAnyName { names }))
}

pub(super) fn has_had_treatment_with_any_name_within_years(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (years, names) = context
        .resolver()
        .create_one_integer_many_strings_input(expression)?;
    Ok(Arc::new(HasHadTreatmentWithinYears {
        names,
        years,
        reference_year: context.config().reference_year(),
    }))
}

pub(super) fn has_had_at_least_cycles_of_treatment(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (min_cycles, name) = context
        .resolver()
        .create_one_integer_one_string_input(expression)?;
    Ok(Arc::new(HasHadAtLeastCycles { name, min_cycles }))
}

pub(super) fn has_had_category_treatment(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let category = context.resolver().create_one_treatment_category_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: Some(category),
        range: LineRange { min: Some(1), max: None },
    }))
}

pub(super) fn has_had_category_treatment_of_at_least_lines(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (category, lines) = context
        .resolver()
        .create_one_treatment_category_one_integer_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: Some(category),
        range: LineRange { min: Some(lines), max: None },
    }))
}

pub(super) fn has_had_category_treatment_of_at_most_lines(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (category, lines) = context
        .resolver()
        .create_one_treatment_category_one_integer_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: Some(category),
        range: LineRange { min: None, max: Some(lines) },
    }))
}

pub(super) fn has_had_at_least_systemic_lines(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let lines = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: None,
        range: LineRange { min: Some(lines), max: None },
    }))
}

pub(super) fn has_had_at_most_systemic_lines(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let lines = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: None,
        range: LineRange { min: None, max: Some(lines) },
    }))
}

pub(super) fn has_had_systemic_lines_between(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (min, max) = context.resolver().create_two_integers_input(expression)?;
    Ok(Arc::new(HasHadTreatmentLines {
        category: None,
        range: LineRange { min: Some(min), max: Some(max) },
    }))
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{evaluate, record};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use trialmatch_model::{PatientRecord, TreatmentHistoryEntry};
    use trialmatch_types::{EvaluationResult, TreatmentCategory};

    fn entry(name: &str, categories: &[TreatmentCategory], stop_year: Option<i32>) -> TreatmentHistoryEntry {
        TreatmentHistoryEntry {
            name: name.to_string(),
            categories: categories.iter().copied().collect(),
            start_year: None,
            stop_year,
            number_of_cycles: None,
            is_systemic: None,
        }
    }

    fn with_history(entries: Vec<TreatmentHistoryEntry>) -> PatientRecord {
        let mut record = record();
        record.oncological_history = entries;
        record
    }

    #[test]
    fn test_treatment_names_are_case_insensitive() {
        let record = with_history(vec![entry("Pembrolizumab", &[TreatmentCategory::Immunotherapy], Some(2022))]);
        assert_eq!(evaluate("HAS_HAD_TREATMENT_NAME_X[pembrolizumab]", &record).result(), EvaluationResult::Pass);
        assert_eq!(
            evaluate("HAS_HAD_TREATMENT_WITH_ANY_NAME_X[Nivolumab;Ipilimumab]", &record).result(),
            EvaluationResult::Fail
        );
    }

    #[rstest]
    // reference year 2024
    #[case(Some(2023), EvaluationResult::Pass)]
    #[case(Some(2022), EvaluationResult::Undetermined)]
    #[case(None, EvaluationResult::Undetermined)]
    #[case(Some(2010), EvaluationResult::Fail)]
    fn test_treatment_within_years(#[case] stop_year: Option<i32>, #[case] expected: EvaluationResult) {
        let record = with_history(vec![entry("Carboplatin", &[TreatmentCategory::Chemotherapy], stop_year)]);
        assert_eq!(
            evaluate("HAS_HAD_TREATMENT_WITH_ANY_NAME_Y_WITHIN_X_YEARS[2, carboplatin;cisplatin]", &record).result(),
            expected
        );
    }

    #[test]
    fn test_cycles() {
        let mut treated = entry("Docetaxel", &[TreatmentCategory::Chemotherapy], Some(2023));
        let record = with_history(vec![treated.clone()]);
        assert_eq!(
            evaluate("HAS_HAD_AT_LEAST_X_CYCLES_OF_TREATMENT_NAME_Y[4, Docetaxel]", &record).result(),
            EvaluationResult::Undetermined
        );

        treated.number_of_cycles = Some(6);
        let record = with_history(vec![treated]);
        assert_eq!(
            evaluate("HAS_HAD_AT_LEAST_X_CYCLES_OF_TREATMENT_NAME_Y[4, Docetaxel]", &record).result(),
            EvaluationResult::Pass
        );
    }

    #[rstest]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT[IMMUNOTHERAPY]", EvaluationResult::Pass)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT[TARGETED_THERAPY]", EvaluationResult::Undetermined)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_LEAST_Y_LINES[CHEMOTHERAPY, 2]", EvaluationResult::Pass)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_LEAST_Y_LINES[CHEMOTHERAPY, 3]", EvaluationResult::Undetermined)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_LEAST_Y_LINES[CHEMOTHERAPY, 4]", EvaluationResult::Fail)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_MOST_Y_LINES[CHEMOTHERAPY, 3]", EvaluationResult::Pass)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_MOST_Y_LINES[CHEMOTHERAPY, 2]", EvaluationResult::Undetermined)]
    #[case("HAS_HAD_CATEGORY_X_TREATMENT_OF_AT_MOST_Y_LINES[CHEMOTHERAPY, 1]", EvaluationResult::Fail)]
    #[case("HAS_HAD_AT_LEAST_X_SYSTEMIC_TREATMENT_LINES[3]", EvaluationResult::Pass)]
    #[case("HAS_HAD_AT_LEAST_X_SYSTEMIC_TREATMENT_LINES[4]", EvaluationResult::Undetermined)]
    #[case("HAS_HAD_AT_MOST_X_SYSTEMIC_TREATMENT_LINES[2]", EvaluationResult::Fail)]
    #[case("HAS_HAD_SYSTEMIC_TREATMENT_LINES_BETWEEN_X_AND_Y[3, 4]", EvaluationResult::Pass)]
    #[case("HAS_HAD_SYSTEMIC_TREATMENT_LINES_BETWEEN_X_AND_Y[1, 3]", EvaluationResult::Undetermined)]
    #[case("HAS_HAD_SYSTEMIC_TREATMENT_LINES_BETWEEN_X_AND_Y[5, 6]", EvaluationResult::Fail)]
    fn test_treatment_lines(#[case] criterion: &str, #[case] expected: EvaluationResult) {
        // two chemotherapy lines, one immunotherapy line, one surgery and one
        // treatment of unknown category
        let record = with_history(vec![
            entry("Carboplatin", &[TreatmentCategory::Chemotherapy], Some(2019)),
            entry("Docetaxel", &[TreatmentCategory::Chemotherapy], Some(2021)),
            entry("Pembrolizumab", &[TreatmentCategory::Immunotherapy], Some(2023)),
            entry("Lobectomy", &[TreatmentCategory::Surgery], Some(2018)),
            entry("Study drug", &[], Some(2024)),
        ]);
        assert_eq!(evaluate(criterion, &record).result(), expected, "{}", criterion);
    }
}
