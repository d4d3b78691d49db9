use actix_web::{web, HttpResponse};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{Store, StoreError};
use crate::errors::AppError;
use crate::models::employee::{
    parse_ordering, Employee, EmployeePayload, EmployeeQuery, ExperienceFilter,
};

#[derive(Deserialize)]
pub struct EmployeeQueryParams {
    first_name: Option<String>,
    last_name: Option<String>,
    industry: Option<String>,
    years_of_experience: Option<String>,
    ordering: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<EmployeeQueryParams> for EmployeeQuery {
    type Error = AppError;

    fn try_from(params: EmployeeQueryParams) -> Result<Self, Self::Error> {
        let years_of_experience = match non_empty(params.years_of_experience) {
            Some(raw) => Some(
                raw.parse::<ExperienceFilter>()
                    .map_err(|msg: String| AppError::field("years_of_experience", msg))?,
            ),
            None => None,
        };
        if params.limit.is_some_and(|limit| limit < 0) {
            return Err(AppError::field("limit", "Ensure this value is greater than or equal to 0."));
        }
        if params.offset.is_some_and(|offset| offset < 0) {
            return Err(AppError::field("offset", "Ensure this value is greater than or equal to 0."));
        }

        Ok(EmployeeQuery {
            first_name: non_empty(params.first_name),
            last_name: non_empty(params.last_name),
            industry: non_empty(params.industry),
            years_of_experience,
            ordering: params.ordering.as_deref().map(parse_ordering).unwrap_or_default(),
            limit: params.limit,
            offset: params.offset,
        })
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Employee not found.".to_string())
}

fn parse_payload(body: Value) -> Result<EmployeePayload, AppError> {
    match body {
        Value::Object(fields) => Ok(EmployeePayload::from_json(fields)?),
        _ => Err(AppError::BadRequest(
            "Expected an employee object.".to_string(),
        )),
    }
}

async fn create_one(store: &dyn Store, body: Value) -> Result<Employee, AppError> {
    let employee = parse_payload(body)?.into_employee()?;
    match store.insert_employee(&employee).await {
        Ok(()) => {
            info!("Created employee {} ({})", employee.id, employee);
            Ok(employee)
        }
        Err(StoreError::Conflict(_)) => Err(AppError::field(
            "id",
            "employee with this id already exists.",
        )),
        Err(err) => Err(err.into()),
    }
}

/// Each employee is stored as soon as it validates; a later invalid item
/// fails the request without undoing the earlier ones.
pub async fn create_employees(
    store: web::Data<dyn Store>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    match body.into_inner() {
        Value::Array(items) => {
            let mut created = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let employee = create_one(store.get_ref(), item).await.map_err(|err| match err {
                    AppError::Validation { fields, .. } => AppError::Validation {
                        message: format!("Validation failed for employee at index {}", index),
                        fields,
                    },
                    AppError::BadRequest(msg) => {
                        AppError::BadRequest(format!("{} (employee at index {})", msg, index))
                    }
                    other => other,
                })?;
                created.push(employee);
            }
            Ok(HttpResponse::Created().json(created))
        }
        item => {
            let employee = create_one(store.get_ref(), item).await?;
            Ok(HttpResponse::Created().json(employee))
        }
    }
}

pub async fn get_employees(
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeQueryParams>,
) -> Result<HttpResponse, AppError> {
    let query = EmployeeQuery::try_from(query.into_inner())?;
    debug!("Listing employees with {:?}", query);
    let employees = store.list_employees(&query).await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let employee = store.get_employee(id.into_inner()).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(employee))
}

async fn save_update(store: &dyn Store, id: i32, mut payload: EmployeePayload) -> Result<Employee, AppError> {
    if payload.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::field("id", "Identifier cannot be changed."));
    }
    payload.id = Some(id);
    let employee = payload.into_employee()?;
    if !store.update_employee(&employee).await? {
        return Err(not_found());
    }
    info!("Updated employee {}", id);
    Ok(employee)
}

pub async fn replace_employee(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    store.get_employee(id).await?.ok_or_else(not_found)?;
    let payload = parse_payload(body.into_inner())?;
    let employee = save_update(store.get_ref(), id, payload).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Fields present in the body overwrite the stored ones, `null` included.
pub async fn patch_employee(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    let existing = store.get_employee(id).await?.ok_or_else(not_found)?;

    let patch = match body.into_inner() {
        Value::Object(patch) => patch,
        _ => {
            return Err(AppError::BadRequest(
                "Expected an employee object.".to_string(),
            ))
        }
    };
    let mut merged = serde_json::to_value(&existing)
        .map_err(|err| AppError::Internal(err.to_string()))?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(patch);
    }

    let payload = parse_payload(merged)?;
    let employee = save_update(store.get_ref(), id, payload).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee(
    store: web::Data<dyn Store>,
    id: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();
    if !store.delete_employee(id).await? {
        return Err(not_found());
    }
    info!("Deleted employee {}", id);
    Ok(HttpResponse::Ok().json(json!({
        "detail": "Employee deleted successfully.",
    })))
}
