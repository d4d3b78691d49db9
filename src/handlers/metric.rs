use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::aggregation;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::employee::Employee;
use crate::models::metric::{MetricUpdate, Segment};

#[derive(Deserialize)]
pub struct IndustryRequest {
    industry: Option<String>,
}

#[derive(Deserialize)]
pub struct ExperienceRequest {
    years_of_experience: Option<i32>,
}

impl IndustryRequest {
    fn segment(&self) -> Result<Segment, AppError> {
        match self.industry.as_deref() {
            Some(industry) if !industry.trim().is_empty() => {
                Ok(Segment::Industry(industry.to_string()))
            }
            _ => Err(AppError::BadRequest("Industry parameter is required.".to_string())),
        }
    }
}

impl ExperienceRequest {
    fn segment(&self) -> Result<Segment, AppError> {
        match self.years_of_experience {
            Some(years) if years >= 0 => Ok(Segment::Experience(years)),
            Some(_) => Err(AppError::field(
                "years_of_experience",
                "Ensure this value is greater than or equal to 0.",
            )),
            None => Err(AppError::BadRequest(
                "Years of Experience parameter is required.".to_string(),
            )),
        }
    }
}

async fn load_segment(
    store: &dyn Store,
    segment: &Segment,
    not_found: impl FnOnce() -> String,
) -> Result<Vec<Employee>, AppError> {
    let employees = store.employees_in_segment(segment).await?;
    if employees.is_empty() {
        warn!("No employees in segment '{}'", segment);
        return Err(AppError::NotFound(not_found()));
    }
    Ok(employees)
}

pub async fn average_age_per_industry(
    store: web::Data<dyn Store>,
    request: web::Json<IndustryRequest>,
) -> Result<HttpResponse, AppError> {
    let segment = request.segment()?;
    let employees = load_segment(store.get_ref(), &segment, || {
        format!("Industry '{}' not found in the data.", segment)
    })
    .await?;

    let average_age = aggregation::average_age(&employees, Utc::now().date_naive())
        .ok_or_else(|| AppError::NotFound(format!("Industry '{}' not found in the data.", segment)))?;

    store
        .upsert_metric(
            &segment,
            &MetricUpdate {
                average_age: Some(average_age),
                ..Default::default()
            },
        )
        .await?;
    info!("Average age for '{}' = {}", segment, average_age);

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Average Age for {} calculated and saved successfully: {}.",
            segment, average_age
        ),
    })))
}

async fn save_average_salary(
    store: &dyn Store,
    segment: &Segment,
    employees: &[Employee],
) -> Result<f64, AppError> {
    let average_salary = aggregation::average_salary(employees).ok_or_else(|| {
        AppError::NotFound(format!("No salary data available for '{}'.", segment))
    })?;
    store
        .upsert_metric(
            segment,
            &MetricUpdate {
                average_salary: Some(average_salary),
                ..Default::default()
            },
        )
        .await?;
    info!("Average salary for '{}' = {}", segment, average_salary);
    Ok(average_salary)
}

pub async fn average_salary_per_industry(
    store: web::Data<dyn Store>,
    request: web::Json<IndustryRequest>,
) -> Result<HttpResponse, AppError> {
    let segment = request.segment()?;
    let employees = load_segment(store.get_ref(), &segment, || {
        format!("Industry '{}' not found in the data.", segment)
    })
    .await?;
    let average_salary = save_average_salary(store.get_ref(), &segment, &employees).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Average Salary for {} calculated and saved successfully: {}.",
            segment, average_salary
        ),
    })))
}

pub async fn average_salary_per_experience(
    store: web::Data<dyn Store>,
    request: web::Json<ExperienceRequest>,
) -> Result<HttpResponse, AppError> {
    let segment = request.segment()?;
    let years = segment.key();
    let employees = load_segment(store.get_ref(), &segment, || {
        format!(
            "Employees with '{}' Years of Experience not found in the data.",
            years
        )
    })
    .await?;
    let average_salary = save_average_salary(store.get_ref(), &segment, &employees).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Average Salary for {} Years of Experience calculated and saved successfully: {}.",
            years, average_salary
        ),
    })))
}

pub async fn gender_diversity_index(
    store: web::Data<dyn Store>,
    request: web::Json<IndustryRequest>,
) -> Result<HttpResponse, AppError> {
    let segment = request.segment()?;
    let employees = load_segment(store.get_ref(), &segment, || {
        "No employees found in the data for the specified industry.".to_string()
    })
    .await?;

    let diversity = aggregation::gender_diversity(&employees);
    store
        .upsert_metric(
            &segment,
            &MetricUpdate {
                gender_diversity_index: Some(diversity.index),
                male_percentage: Some(diversity.distribution.male_percentage),
                female_percentage: Some(diversity.distribution.female_percentage),
                ..Default::default()
            },
        )
        .await?;
    info!("Gender diversity index for '{}' = {}", segment, diversity.index);

    Ok(HttpResponse::Created().json(json!({
        "message": format!(
            "Gender Diversity Index for {} calculated and saved successfully: {}.",
            segment, diversity.index
        ),
        "gender_distribution": diversity.distribution,
    })))
}

pub async fn get_metrics(store: web::Data<dyn Store>) -> Result<HttpResponse, AppError> {
    let metrics = store.list_metrics().await?;
    Ok(HttpResponse::Ok().json(metrics))
}
