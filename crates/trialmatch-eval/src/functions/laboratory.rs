//! Laboratory values
//!
//! Every predicate looks at the most recent value of its measurement. Values
//! older than the configured lab window, in an unknown unit or without a
//! reference range (for ULN based limits) are UNDETERMINED. Values outside
//! the limit fail recoverably: labs are re-measured before inclusion.

use crate::context::RuleContext;
use crate::function::{EvaluationFunction, SharedFunction};
use chrono::NaiveDate;
use std::sync::Arc;
use trialmatch_diagnostics::Result;
use trialmatch_model::{LabMeasurement, LabValue, PatientRecord};
use trialmatch_types::{Evaluation, RuleExpression};

/// Hemoglobin g/dL per mmol/L
const HEMOGLOBIN_G_PER_DL_PER_MMOL_PER_L: f64 = 1.611;

/// Unit a limit is expressed in
#[derive(Debug, Clone, Copy)]
enum LabUnit {
    GramsPerDeciliter,
    BillionsPerLiter,
    MillimolesPerLiter,
}

impl LabUnit {
    fn as_str(self) -> &'static str {
        match self {
            Self::GramsPerDeciliter => "g/dL",
            Self::BillionsPerLiter => "10^9/L",
            Self::MillimolesPerLiter => "mmol/L",
        }
    }

    /// `value` measured in `unit`, converted to this unit when possible
    fn convert(self, measurement: LabMeasurement, value: f64, unit: &str) -> Option<f64> {
        let unit = unit.trim();
        if unit.eq_ignore_ascii_case(self.as_str()) {
            return Some(value);
        }
        match (self, measurement) {
            (Self::GramsPerDeciliter, LabMeasurement::Hemoglobin)
                if unit.eq_ignore_ascii_case("mmol/L") =>
            {
                Some(value * HEMOGLOBIN_G_PER_DL_PER_MMOL_PER_L)
            }
            (Self::GramsPerDeciliter, LabMeasurement::Albumin) if unit.eq_ignore_ascii_case("g/L") => {
                Some(value / 10.0)
            }
            (Self::BillionsPerLiter, _) if unit.eq_ignore_ascii_case("10*9/L") => Some(value),
            _ => None,
        }
    }
}

/// Latest usable value, or the UNDETERMINED evaluation explaining why there is none
fn latest_recent_value(
    record: &PatientRecord,
    measurement: LabMeasurement,
    min_date: NaiveDate,
) -> std::result::Result<&LabValue, Evaluation> {
    let Some(lab) = record.latest_lab_value(measurement) else {
        return Err(Evaluation::undetermined(
            format!("No {} measurement available", measurement),
            format!("{} missing", measurement),
        ));
    };
    if lab.date < min_date {
        return Err(Evaluation::undetermined(
            format!("Latest {} measurement of {} is outdated", measurement, lab.date),
            format!("{} outdated", measurement),
        ));
    }
    Ok(lab)
}

fn unknown_unit(lab: &LabValue) -> Evaluation {
    Evaluation::undetermined(
        format!("Unable to interpret {} in unit '{}'", lab.measurement, lab.unit),
        format!("{} unit unknown", lab.measurement),
    )
}

/// Latest value within `[min, max]` in `unit`; either bound optional
struct HasLabValueWithin {
    measurement: LabMeasurement,
    unit: LabUnit,
    min: Option<f64>,
    max: Option<f64>,
    min_date: NaiveDate,
}

impl HasLabValueWithin {
    fn describe(&self) -> String {
        let unit = self.unit.as_str();
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("between {} and {} {}", min, max, unit),
            (Some(min), None) => format!("at least {} {}", min, unit),
            (None, Some(max)) => format!("at most {} {}", max, unit),
            (None, None) => format!("any {}", unit),
        }
    }
}

impl EvaluationFunction for HasLabValueWithin {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let lab = match latest_recent_value(record, self.measurement, self.min_date) {
            Ok(lab) => lab,
            Err(evaluation) => return evaluation,
        };
        let Some(value) = self.unit.convert(lab.measurement, lab.value, &lab.unit) else {
            return unknown_unit(lab);
        };

        let within = self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max);
        if within {
            Evaluation::pass(
                format!(
                    "{} of {} {} is {}",
                    self.measurement,
                    value,
                    self.unit.as_str(),
                    self.describe()
                ),
                format!("Adequate {}", self.measurement),
            )
        } else {
            Evaluation::recoverable_fail(
                format!(
                    "{} of {} {} is not {}",
                    self.measurement,
                    value,
                    self.unit.as_str(),
                    self.describe()
                ),
                format!("Inadequate {}", self.measurement),
            )
        }
    }
}

/// Latest value at most `max_uln` times the upper limit of normal
struct HasLabValueUlnOfAtMost {
    measurement: LabMeasurement,
    max_uln: f64,
    min_date: NaiveDate,
}

impl EvaluationFunction for HasLabValueUlnOfAtMost {
    fn evaluate(&self, record: &PatientRecord) -> Evaluation {
        let lab = match latest_recent_value(record, self.measurement, self.min_date) {
            Ok(lab) => lab,
            Err(evaluation) => return evaluation,
        };
        let Some(multiple) = lab.uln_multiple() else {
            return Evaluation::undetermined(
                format!("No upper limit of normal known for {}", self.measurement),
                format!("{} ULN unknown", self.measurement),
            );
        };

        if multiple <= self.max_uln {
            Evaluation::pass(
                format!(
                    "{} of {:.2}*ULN is at most {}*ULN",
                    self.measurement, multiple, self.max_uln
                ),
                format!("Adequate {}", self.measurement),
            )
        } else {
            Evaluation::recoverable_fail(
                format!(
                    "{} of {:.2}*ULN exceeds {}*ULN",
                    self.measurement, multiple, self.max_uln
                ),
                format!("Inadequate {}", self.measurement),
            )
        }
    }
}

fn minimum(
    expression: &RuleExpression,
    context: &RuleContext,
    measurement: LabMeasurement,
    unit: LabUnit,
) -> Result<SharedFunction> {
    let min = context.resolver().create_one_double_input(expression)?;
    Ok(Arc::new(HasLabValueWithin {
        measurement,
        unit,
        min: Some(min),
        max: None,
        min_date: context.config().min_lab_date()?,
    }))
}

fn uln_maximum(
    expression: &RuleExpression,
    context: &RuleContext,
    measurement: LabMeasurement,
) -> Result<SharedFunction> {
    let max_uln = context.resolver().create_one_double_input(expression)?;
    Ok(Arc::new(HasLabValueUlnOfAtMost {
        measurement,
        max_uln,
        min_date: context.config().min_lab_date()?,
    }))
}

pub(super) fn has_hemoglobin_of_at_least(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    minimum(expression, context, LabMeasurement::Hemoglobin, LabUnit::GramsPerDeciliter)
}

pub(super) fn has_thrombocytes_of_at_least(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    minimum(expression, context, LabMeasurement::ThrombocytesAbs, LabUnit::BillionsPerLiter)
}

pub(super) fn has_neutrophils_of_at_least(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    minimum(expression, context, LabMeasurement::NeutrophilsAbs, LabUnit::BillionsPerLiter)
}

pub(super) fn has_albumin_of_at_least(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    minimum(expression, context, LabMeasurement::Albumin, LabUnit::GramsPerDeciliter)
}

pub(super) fn has_asat_uln_of_at_most(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    uln_maximum(expression, context, LabMeasurement::Asat)
}

pub(super) fn has_alat_uln_of_at_most(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    uln_maximum(expression, context, LabMeasurement::Alat)
}

pub(super) fn has_total_bilirubin_uln_of_at_most(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    uln_maximum(expression, context, LabMeasurement::TotalBilirubin)
}

pub(super) fn has_creatinine_uln_of_at_most(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    uln_maximum(expression, context, LabMeasurement::Creatinine)
}

pub(super) fn has_potassium_between(
    expression: &RuleExpression,
    context: &RuleContext,
) -> Result<SharedFunction> {
    let (min, max) = context.resolver().create_two_doubles_input(expression)?;
    Ok(Arc::new(HasLabValueWithin {
        measurement: LabMeasurement::Potassium,
        unit: LabUnit::MillimolesPerLiter,
        min: Some(min),
        max: Some(max),
        min_date: context.config().min_lab_date()?,
    }))
}
