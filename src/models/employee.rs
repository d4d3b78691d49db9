use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::utils::date_format;
use crate::utils::validation::{error_with_message, validate_gender, validate_salary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "male")]
    Male,
    #[serde(rename = "F", alias = "female")]
    Female,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" | "male" => Ok(Gender::Male),
            "F" | "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender code '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    #[serde(with = "date_format")]
    pub date_of_birth: NaiveDate,
    pub industry: Option<String>,
    pub salary: Option<Decimal>,
    pub years_of_experience: Option<i32>,
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Incoming employee body. Every field is optional so that missing or
/// mistyped values surface as field-level validation errors.
#[derive(Debug, Default, Validate)]
pub struct EmployeePayload {
    #[validate(required)]
    pub id: Option<i32>,
    #[validate(required, length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 255))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom = "validate_gender")]
    pub gender: Option<String>,
    #[validate(required)]
    pub date_of_birth: Option<String>,
    #[validate(length(max = 255))]
    pub industry: Option<String>,
    #[validate(custom = "validate_salary")]
    pub salary: Option<Decimal>,
    #[validate(range(min = 0))]
    pub years_of_experience: Option<i32>,
}

fn invalid_value(message: String) -> ValidationError {
    let mut err = ValidationError::new("invalid");
    err.message = Some(message.into());
    err
}

/// Removes `field` from the body; absent and `null` both read as `None`.
fn take_field<T: DeserializeOwned>(
    body: &mut Map<String, Value>,
    field: &'static str,
    expected: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match body.remove(field) {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                errors.add(field, invalid_value(format!("A valid {} is required.", expected)));
                None
            }
        },
    }
}

/// Text field where `""` means the same as `null`.
fn take_blankable(
    body: &mut Map<String, Value>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    take_field::<String>(body, field, "string", errors).filter(|value| !value.is_empty())
}

/// Salary arrives either as a JSON number or as a decimal string.
fn take_salary(body: &mut Map<String, Value>, errors: &mut ValidationErrors) -> Option<Decimal> {
    let raw = match body.remove("salary") {
        None | Some(Value::Null) => return None,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return None,
        Some(_) => String::new(),
    };
    match Decimal::from_str(&raw) {
        Ok(salary) => Some(salary),
        Err(_) => {
            errors.add("salary", invalid_value("A valid number is required.".to_string()));
            None
        }
    }
}

impl EmployeePayload {
    /// Reads a JSON object field by field so that a mistyped value is reported
    /// against its own field. Unknown keys are ignored.
    pub fn from_json(mut body: Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let payload = EmployeePayload {
            id: take_field(&mut body, "id", "integer", &mut errors),
            first_name: take_field(&mut body, "first_name", "string", &mut errors),
            last_name: take_field(&mut body, "last_name", "string", &mut errors),
            email: take_blankable(&mut body, "email", &mut errors),
            gender: take_blankable(&mut body, "gender", &mut errors),
            date_of_birth: take_field(&mut body, "date_of_birth", "date string", &mut errors),
            industry: take_blankable(&mut body, "industry", &mut errors),
            salary: take_salary(&mut body, &mut errors),
            years_of_experience: take_field(&mut body, "years_of_experience", "integer", &mut errors),
        };
        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }

    /// Runs field validation and converts into an [`Employee`], collecting the
    /// date-of-birth format error alongside any other field errors.
    pub fn into_employee(self) -> Result<Employee, ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let date_of_birth = match self.date_of_birth.as_deref() {
            Some(raw) => {
                let parsed = date_format::parse(raw);
                if parsed.is_none() {
                    errors.add("date_of_birth", date_error());
                }
                parsed
            }
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        match (self.id, self.first_name, self.last_name, date_of_birth) {
            (Some(id), Some(first_name), Some(last_name), Some(date_of_birth)) => Ok(Employee {
                id,
                first_name,
                last_name,
                email: self.email,
                gender: self.gender.and_then(|gender| gender.parse().ok()),
                date_of_birth,
                industry: self.industry,
                salary: self.salary,
                years_of_experience: self.years_of_experience,
            }),
            _ => {
                // required() above guarantees these are present
                let mut errors = ValidationErrors::new();
                errors.add("__all__", ValidationError::new("required"));
                Err(errors)
            }
        }
    }
}

fn date_error() -> ValidationError {
    error_with_message("date", date_format::FORMAT_ERROR)
}

/// Years-of-experience filter: `"5"` is an exact match, `"3-7"` an inclusive range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperienceFilter {
    Exact(i32),
    Range(i32, i32),
}

impl ExperienceFilter {
    pub fn matches(&self, years: Option<i32>) -> bool {
        match (self, years) {
            (ExperienceFilter::Exact(expected), Some(years)) => years == *expected,
            (ExperienceFilter::Range(min, max), Some(years)) => *min <= years && years <= *max,
            (_, None) => false,
        }
    }
}

impl FromStr for ExperienceFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid years_of_experience value '{}'. Use N or A-B.", s);
        match s.split_once('-') {
            Some((min, max)) => {
                let min = min.trim().parse::<i32>().map_err(|_| invalid())?;
                let max = max.trim().parse::<i32>().map_err(|_| invalid())?;
                Ok(ExperienceFilter::Range(min, max))
            }
            None => s
                .trim()
                .parse::<i32>()
                .map(ExperienceFilter::Exact)
                .map_err(|_| invalid()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    Industry,
    Salary,
    YearsOfExperience,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::DateOfBirth => "date_of_birth",
            SortField::Industry => "industry",
            SortField::Salary => "salary",
            SortField::YearsOfExperience => "years_of_experience",
        }
    }

    fn from_column(column: &str) -> Option<Self> {
        let field = match column {
            "id" => SortField::Id,
            "first_name" => SortField::FirstName,
            "last_name" => SortField::LastName,
            "date_of_birth" => SortField::DateOfBirth,
            "industry" => SortField::Industry,
            "salary" => SortField::Salary,
            "years_of_experience" => SortField::YearsOfExperience,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Parses `ordering=first_name,-salary`. Unknown fields are skipped.
pub fn parse_ordering(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .filter_map(|term| {
            let (descending, column) = match term.strip_prefix('-') {
                Some(column) => (true, column),
                None => (false, term),
            };
            SortField::from_column(column).map(|field| SortKey { field, descending })
        })
        .collect()
}

/// Filter, ordering and paging applied to an employee listing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmployeeQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub industry: Option<String>,
    pub years_of_experience: Option<ExperienceFilter>,
    pub ordering: Vec<SortKey>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl EmployeeQuery {
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(first_name) = &self.first_name {
            if !contains_ignore_case(&employee.first_name, first_name) {
                return false;
            }
        }
        if let Some(last_name) = &self.last_name {
            if !contains_ignore_case(&employee.last_name, last_name) {
                return false;
            }
        }
        if let Some(industry) = &self.industry {
            match &employee.industry {
                Some(value) if contains_ignore_case(value, industry) => {}
                _ => return false,
            }
        }
        if let Some(experience) = &self.years_of_experience {
            if !experience.matches(employee.years_of_experience) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> EmployeePayload {
        EmployeePayload {
            id: Some(1),
            first_name: Some("Annmarie".into()),
            last_name: Some("Crooke".into()),
            email: Some("acrooke0@gizmodo.com".into()),
            gender: Some("F".into()),
            date_of_birth: Some("09/07/1978".into()),
            industry: Some("Technology".into()),
            salary: Some(Decimal::new(18046637, 2)),
            years_of_experience: Some(10),
        }
    }

    #[test]
    fn payload_converts_to_employee() {
        let employee = payload().into_employee().unwrap();
        assert_eq!(employee.gender, Some(Gender::Female));
        assert_eq!(employee.date_of_birth, NaiveDate::from_ymd_opt(1978, 7, 9).unwrap());
        assert_eq!(employee.to_string(), "Annmarie Crooke");
    }

    #[test]
    fn payload_reports_each_bad_field() {
        let bad = EmployeePayload {
            date_of_birth: Some("1978-07-09".into()),
            email: Some("not-an-email".into()),
            years_of_experience: Some(-1),
            first_name: None,
            ..payload()
        };
        let errors = bad.into_employee().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("date_of_birth"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("years_of_experience"));
        assert!(fields.contains_key("first_name"));
        assert!(!fields.contains_key("last_name"));
    }

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn from_json_names_mistyped_fields() {
        let errors = EmployeePayload::from_json(body(serde_json::json!({
            "id": "abc",
            "first_name": "Ann",
            "years_of_experience": "five",
            "salary": true,
        })))
        .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("id"));
        assert!(fields.contains_key("years_of_experience"));
        assert!(fields.contains_key("salary"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn from_json_accepts_salary_strings_and_blank_text() {
        let payload = EmployeePayload::from_json(body(serde_json::json!({
            "id": 7,
            "first_name": "Ann",
            "last_name": "Lee",
            "email": "",
            "gender": "",
            "date_of_birth": "01/02/1990",
            "salary": "100.00",
        })))
        .unwrap();
        assert_eq!(payload.salary, Some(Decimal::new(10000, 2)));
        assert_eq!(payload.email, None);
        assert_eq!(payload.gender, None);

        let employee = payload.into_employee().unwrap();
        assert_eq!(employee.email, None);
        assert_eq!(employee.gender, None);
    }

    #[test]
    fn experience_filter_parsing() {
        assert_eq!("5".parse(), Ok(ExperienceFilter::Exact(5)));
        assert_eq!("3-7".parse(), Ok(ExperienceFilter::Range(3, 7)));
        assert_eq!(" 3 - 7 ".parse(), Ok(ExperienceFilter::Range(3, 7)));
        assert!("abc".parse::<ExperienceFilter>().is_err());
        assert!("3-".parse::<ExperienceFilter>().is_err());
        assert!("-3".parse::<ExperienceFilter>().is_err());
        assert!("1-2-3".parse::<ExperienceFilter>().is_err());
    }

    #[test]
    fn experience_range_is_inclusive() {
        let filter = ExperienceFilter::Range(3, 7);
        assert!(filter.matches(Some(3)));
        assert!(filter.matches(Some(7)));
        assert!(!filter.matches(Some(8)));
        assert!(!filter.matches(None));
        assert!(ExperienceFilter::Exact(5).matches(Some(5)));
        assert!(!ExperienceFilter::Exact(5).matches(Some(4)));
    }

    #[test]
    fn ordering_skips_unknown_fields() {
        let keys = parse_ordering("-salary, nope ,first_name");
        assert_eq!(
            keys,
            vec![
                SortKey { field: SortField::Salary, descending: true },
                SortKey { field: SortField::FirstName, descending: false },
            ]
        );
        assert!(parse_ordering("").is_empty());
    }

    #[test]
    fn name_filters_are_case_insensitive_substrings() {
        let employee = payload().into_employee().unwrap();
        let query = EmployeeQuery {
            first_name: Some("ANN".into()),
            last_name: Some("rook".into()),
            industry: Some("tech".into()),
            ..Default::default()
        };
        assert!(query.matches(&employee));

        let by_last_name = EmployeeQuery {
            last_name: Some("Annmarie".into()),
            ..Default::default()
        };
        assert!(!by_last_name.matches(&employee));
    }
}
