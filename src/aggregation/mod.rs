//! Workforce statistics over an in-memory set of employee records.
//!
//! Every function here is pure: callers load the segment's records, hand them
//! over, and decide what to persist.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::employee::{Employee, Gender};

/// Current year minus the mean birth year. Year granularity only.
pub fn average_age(employees: &[Employee], today: NaiveDate) -> Option<f64> {
    if employees.is_empty() {
        return None;
    }
    let total: i64 = employees
        .iter()
        .map(|employee| i64::from(employee.date_of_birth.year()))
        .sum();
    let mean_birth_year = total as f64 / employees.len() as f64;
    Some(f64::from(today.year()) - mean_birth_year)
}

/// Mean over the salaries that are present. `None` when no salary is set.
pub fn average_salary(employees: &[Employee]) -> Option<f64> {
    let salaries: Vec<Decimal> = employees.iter().filter_map(|e| e.salary).collect();
    if salaries.is_empty() {
        return None;
    }
    let total: Decimal = salaries.iter().sum();
    (total / Decimal::from(salaries.len())).to_f64()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GenderDistribution {
    pub male_percentage: f64,
    pub female_percentage: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenderDiversity {
    pub index: f64,
    pub distribution: GenderDistribution,
}

/// Simpson-style index `1 - Σ p²` over the known genders of the set.
///
/// Records without a gender are left out of the proportions. When no record
/// has a gender both percentages are 0 and the index is 0.
pub fn gender_diversity(employees: &[Employee]) -> GenderDiversity {
    let (mut male, mut female) = (0usize, 0usize);
    for gender in employees.iter().filter_map(|e| e.gender) {
        match gender {
            Gender::Male => male += 1,
            Gender::Female => female += 1,
        }
    }

    let known = male + female;
    if known == 0 {
        return GenderDiversity {
            index: 0.0,
            distribution: GenderDistribution {
                male_percentage: 0.0,
                female_percentage: 0.0,
            },
        };
    }

    let male_percentage = male as f64 / known as f64 * 100.0;
    let female_percentage = female as f64 / known as f64 * 100.0;
    let index = 1.0 - [male_percentage, female_percentage]
        .iter()
        .map(|p| (p / 100.0).powi(2))
        .sum::<f64>();

    GenderDiversity {
        index,
        distribution: GenderDistribution {
            male_percentage,
            female_percentage,
        },
    }
}
