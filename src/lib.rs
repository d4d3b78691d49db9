pub mod aggregation;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod utils;

use actix_web::web;

use crate::errors::AppError;

/// Registers the employee and metric routes plus the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::resource("/api/employees/")
            .route(web::get().to(handlers::employee::get_employees))
            .route(web::post().to(handlers::employee::create_employees)),
    )
    .service(
        web::resource("/api/employee/{id}/")
            .route(web::get().to(handlers::employee::get_employee))
            .route(web::put().to(handlers::employee::replace_employee))
            .route(web::patch().to(handlers::employee::patch_employee))
            .route(web::delete().to(handlers::employee::delete_employee)),
    )
    .service(
        web::resource("/api/metrics/")
            .route(web::get().to(handlers::metric::get_metrics)),
    )
    .service(
        web::resource("/api/metrics/average-age-per-industry/")
            .route(web::post().to(handlers::metric::average_age_per_industry)),
    )
    .service(
        web::resource("/api/metrics/average-salary-per-industry/")
            .route(web::post().to(handlers::metric::average_salary_per_industry)),
    )
    .service(
        web::resource("/api/metrics/average-salary-per-experience/")
            .route(web::post().to(handlers::metric::average_salary_per_experience)),
    )
    .service(
        web::resource("/api/metrics/gender-diversity-index/")
            .route(web::post().to(handlers::metric::gender_diversity_index)),
    );
}
