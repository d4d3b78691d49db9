use rust_decimal::Decimal;
use validator::ValidationError;

const SALARY_MAX_DIGITS: u32 = 10;
const SALARY_DECIMAL_PLACES: u32 = 2;

pub fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    match gender {
        "M" | "F" | "male" | "female" => Ok(()),
        _ => Err(error_with_message(
            "gender",
            "Gender must be one of 'M' or 'F'.",
        )),
    }
}

/// Salary is stored as NUMERIC(10, 2).
pub fn validate_salary(salary: &Decimal) -> Result<(), ValidationError> {
    let normalized = salary.normalize();
    if normalized.scale() > SALARY_DECIMAL_PLACES {
        return Err(error_with_message(
            "decimal_places",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    let whole_digits = normalized.trunc().abs().to_string().trim_start_matches('0').len() as u32;
    if whole_digits > SALARY_MAX_DIGITS - SALARY_DECIMAL_PLACES {
        return Err(error_with_message(
            "max_digits",
            "Ensure that there are no more than 10 digits in total.",
        ));
    }
    Ok(())
}
