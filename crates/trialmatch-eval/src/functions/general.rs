//! Demographics and general clinical status

use super::from_flag;
use crate::context::RuleContext;
use crate::function::{Constant, EvaluationFunction, SharedFunction};
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_model::PatientRecord;
use trialmatch_types::{Evaluation, Gender, RuleExpression};

/// Age is derived from the birth year alone, so the age equal to the bound
/// cannot be decided without a birth date.
struct MinimumAge {
    min_age: i32,
    reference_year: i32,
}

impl EvaluationFunction for MinimumAge {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let age = self.reference_year - record.birth_year;
        if age > self.min_age {
            Evaluation::pass(
                format!("Patient is at least {} years old", self.min_age),
                "Adequate age",
            )
        } else if age == self.min_age {
            Evaluation::undetermined(
                format!(
                    "Patient may be just {} or {} years old, unclear whether at least {}",
                    age - 1,
                    age,
                    self.min_age
                ),
                "Undetermined age",
            )
        } else {
            Evaluation::fail(
                format!("Patient is below {} years of age", self.min_age),
                "Inadequate age",
            )
        }
    }
}

struct MaximumAge {
    max_age: i32,
    reference_year: i32,
}

impl EvaluationFunction for MaximumAge {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let age = self.reference_year - record.birth_year;
        if age <= self.max_age {
            Evaluation::pass(
                format!("Patient is at most {} years old", self.max_age),
                "Adequate age",
            )
        } else if age == self.max_age + 1 {
            Evaluation::undetermined(
                format!("Patient may be {} or {} years old", age - 1, age),
                "Undetermined age",
            )
        } else {
            Evaluation::fail(
                format!("Patient is older than {} years", self.max_age),
                "Inadequate age",
            )
        }
    }
}

struct HasGender(Gender);

impl EvaluationFunction for HasGender {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let wanted = match self.0 {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        if record.gender == Gender::Other && self.0 != Gender::Other {
            Evaluation::undetermined(
                format!("Unable to determine whether patient is {}", wanted),
                "Undetermined gender",
            )
        } else if record.gender == self.0 {
            Evaluation::pass(format!("Patient is {}", wanted), "Adequate gender")
        } else {
            Evaluation::fail(format!("Patient is not {}", wanted), "Wrong gender")
        }
    }
}

/// Which WHO performance statuses a criterion accepts
enum WhoRequirement {
    AtMost(i32),
    Exactly(i32),
    AnyOf(Vec<i32>),
}

impl WhoRequirement {
    fn accepts(&self, who: i32) -> bool {
        match self {
            Self::AtMost(max) => who <= *max,
            Self::Exactly(expected) => who == *expected,
            Self::AnyOf(allowed) => allowed.contains(&who),
        }
    }

    /// Off by one from an accepted status; WHO is often re-scored at screening
    fn is_near(&self, who: i32) -> bool {
        match self {
            Self::AtMost(max) => who == max + 1,
            Self::Exactly(expected) => (who - expected).abs() == 1,
            Self::AnyOf(allowed) => allowed.iter().any(|a| (who - a).abs() == 1),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::AtMost(max) => format!("at most {}", max),
            Self::Exactly(expected) => format!("exactly {}", expected),
            Self::AnyOf(allowed) => {
                let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                format!("any of {}", allowed.join(", "))
            }
        }
    }
}

struct HasWhoStatus(WhoRequirement);

impl EvaluationFunction for HasWhoStatus {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let requirement = &self.0;
        let Some(who) = record.clinical_status.who else {
            return Evaluation::undetermined("WHO status is missing", "WHO status missing");
        };
        if requirement.accepts(who) {
            Evaluation::pass(
                format!("Patient WHO status {} is {}", who, requirement.describe()),
                "Adequate WHO status",
            )
        } else if requirement.is_near(who) {
            Evaluation::recoverable_fail(
                format!("Patient WHO status {} is not {}", who, requirement.describe()),
                "Inadequate WHO status",
            )
        } else {
            Evaluation::fail(
                format!("Patient WHO status {} is not {}", who, requirement.describe()),
                "Inadequate WHO status",
            )
        }
    }
}

pub(super) fn is_at_least_x_years_old(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let min_age = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(MinimumAge {
        min_age,
        reference_year: context.config().reference_year(),
    }))
}

pub(super) fn is_at_most_x_years_old(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let max_age = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(MaximumAge {
        max_age,
        reference_year: context.config().reference_year(),
    }))
}

pub(super) fn is_male(expression: &RuleExpression, context: &RuleContext) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(HasGender(Gender::Male)))
}

pub(super) fn is_female(expression: &RuleExpression, context: &RuleContext) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(HasGender(Gender::Female)))
}

pub(super) fn has_who_status_of_at_most_x(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let max = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(HasWhoStatus(WhoRequirement::AtMost(max))))
}

pub(super) fn has_who_status_of_exactly_x(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let expected = context.resolver().create_one_integer_input(expression)?;
    Ok(Arc::new(HasWhoStatus(WhoRequirement::Exactly(expected))))
}

pub(super) fn has_who_status_of_any_of_x(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let allowed = context.resolver().create_many_integers_input(expression)?;
    Ok(Arc::new(HasWhoStatus(WhoRequirement::AnyOf(allowed))))
}

pub(super) fn can_give_adequate_informed_consent(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(Constant(Evaluation::not_evaluated(
        "Informed consent is assumed to be given",
        "Informed consent",
    ))))
}

pub(super) fn has_active_infection(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(|record: &PatientRecord| {
        from_flag(
            record.clinical_status.has_active_infection,
            "Patient has an active infection",
            "Patient has no active infection",
            "Unknown whether patient has an active infection",
        )
    }))
}

pub(super) fn is_pregnant(expression: &RuleExpression, context: &RuleContext) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(Constant(Evaluation::not_implemented(
        "Pregnancy status is not evaluated",
        "Pregnancy",
    ))))
}

pub(super) fn has_adequate_venous_access(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    context.resolver().create_no_input(expression)?;
    Ok(Arc::new(Constant(Evaluation::not_implemented(
        "Venous access is not evaluated",
        "Venous access",
    ))))
}
