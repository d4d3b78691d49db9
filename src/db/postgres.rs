//! PostgreSQL store. Tables are created on connect when missing.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;

use super::{EmployeeStore, MetricStore, StoreError, StoreResult};
use crate::models::employee::{Employee, EmployeeQuery, ExperienceFilter, Gender};
use crate::models::metric::{Metric, MetricUpdate, Segment, SegmentType};

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, gender, date_of_birth, \
     industry, salary, years_of_experience";

const METRIC_COLUMNS: &str = "segment_type, segment_key, average_age, average_salary, \
     gender_diversity_index, male_percentage, female_percentage";

const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS employees (
        id INTEGER PRIMARY KEY,
        first_name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255) NOT NULL,
        email VARCHAR(254),
        gender VARCHAR(1) CHECK (gender IN ('M', 'F')),
        date_of_birth DATE NOT NULL,
        industry VARCHAR(255),
        salary NUMERIC(10, 2),
        years_of_experience INTEGER CHECK (years_of_experience >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS metrics (
        segment_type TEXT NOT NULL,
        segment_key TEXT NOT NULL,
        average_age DOUBLE PRECISION,
        average_salary DOUBLE PRECISION,
        gender_diversity_index DOUBLE PRECISION,
        male_percentage DOUBLE PRECISION,
        female_percentage DOUBLE PRECISION,
        PRIMARY KEY (segment_type, segment_key)
    )
    "#,
];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: Option<String>,
    gender: Option<String>,
    date_of_birth: NaiveDate,
    industry: Option<String>,
    salary: Option<Decimal>,
    years_of_experience: Option<i32>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        let gender = row.gender.and_then(|code| match code.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(err) => {
                warn!("employee {}: {}", row.id, err);
                None
            }
        });
        Employee {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            gender,
            date_of_birth: row.date_of_birth,
            industry: row.industry,
            salary: row.salary,
            years_of_experience: row.years_of_experience,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MetricRow {
    segment_type: String,
    segment_key: String,
    average_age: Option<f64>,
    average_salary: Option<f64>,
    gender_diversity_index: Option<f64>,
    male_percentage: Option<f64>,
    female_percentage: Option<f64>,
}

impl TryFrom<MetricRow> for Metric {
    type Error = StoreError;

    fn try_from(row: MetricRow) -> Result<Self, Self::Error> {
        let segment = SegmentType::parse(&row.segment_type)
            .and_then(|segment_type| Segment::from_parts(segment_type, &row.segment_key))
            .ok_or_else(|| {
                StoreError::Backend(format!(
                    "unreadable metric segment ({}, {})",
                    row.segment_type, row.segment_key
                ))
            })?;
        let mut metric = Metric::empty(&segment);
        metric.average_age = row.average_age;
        metric.average_salary = row.average_salary;
        metric.gender_diversity_index = row.gender_diversity_index;
        metric.male_percentage = row.male_percentage;
        metric.female_percentage = row.female_percentage;
        Ok(metric)
    }
}

/// Escapes LIKE wildcards so user input only matches literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|err| StoreError::Backend(format!("Failed to connect to the database: {}", err)))?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> StoreResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for PgStore {
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO employees ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            EMPLOYEE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(employee.id)
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(&employee.email)
            .bind(employee.gender.map(Gender::code))
            .bind(employee.date_of_birth)
            .bind(&employee.industry)
            .bind(employee.salary)
            .bind(employee.years_of_experience)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_employee(&self, id: i32) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::from))
    }

    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Vec<Employee>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM employees WHERE TRUE", EMPLOYEE_COLUMNS));

        if let Some(first_name) = &query.first_name {
            builder.push(" AND first_name ILIKE ").push_bind(like_pattern(first_name));
        }
        if let Some(last_name) = &query.last_name {
            builder.push(" AND last_name ILIKE ").push_bind(like_pattern(last_name));
        }
        if let Some(industry) = &query.industry {
            builder.push(" AND industry ILIKE ").push_bind(like_pattern(industry));
        }
        match query.years_of_experience {
            Some(ExperienceFilter::Exact(years)) => {
                builder.push(" AND years_of_experience = ").push_bind(years);
            }
            Some(ExperienceFilter::Range(min, max)) => {
                builder
                    .push(" AND years_of_experience BETWEEN ")
                    .push_bind(min)
                    .push(" AND ")
                    .push_bind(max);
            }
            None => {}
        }

        builder.push(" ORDER BY ");
        for key in &query.ordering {
            builder.push(key.field.column());
            builder.push(if key.descending { " DESC NULLS FIRST, " } else { " ASC NULLS LAST, " });
        }
        builder.push("id ASC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ").push_bind(offset);
        }

        debug!("employee listing: {}", builder.sql());
        let rows = builder
            .build_query_as::<EmployeeRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE employees SET first_name = $2, last_name = $3, email = $4, gender = $5, \
             date_of_birth = $6, industry = $7, salary = $8, years_of_experience = $9 \
             WHERE id = $1",
        )
        .bind(employee.id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(employee.gender.map(Gender::code))
        .bind(employee.date_of_birth)
        .bind(&employee.industry)
        .bind(employee.salary)
        .bind(employee.years_of_experience)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_employee(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn employees_in_segment(&self, segment: &Segment) -> StoreResult<Vec<Employee>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM employees WHERE ", EMPLOYEE_COLUMNS));
        match segment {
            Segment::Industry(industry) => {
                builder.push("industry = ").push_bind(industry.clone());
            }
            Segment::Experience(years) => {
                builder.push("years_of_experience = ").push_bind(*years);
            }
        }
        builder.push(" ORDER BY id");

        let rows = builder
            .build_query_as::<EmployeeRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Employee::from).collect())
    }
}

#[async_trait]
impl MetricStore for PgStore {
    async fn upsert_metric(&self, segment: &Segment, update: &MetricUpdate) -> StoreResult<Metric> {
        let sql = format!(
            "INSERT INTO metrics ({columns}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (segment_type, segment_key) DO UPDATE SET \
             average_age = COALESCE(EXCLUDED.average_age, metrics.average_age), \
             average_salary = COALESCE(EXCLUDED.average_salary, metrics.average_salary), \
             gender_diversity_index = COALESCE(EXCLUDED.gender_diversity_index, metrics.gender_diversity_index), \
             male_percentage = COALESCE(EXCLUDED.male_percentage, metrics.male_percentage), \
             female_percentage = COALESCE(EXCLUDED.female_percentage, metrics.female_percentage) \
             RETURNING {columns}",
            columns = METRIC_COLUMNS
        );
        let row = sqlx::query_as::<_, MetricRow>(&sql)
            .bind(segment.segment_type().as_str())
            .bind(segment.key())
            .bind(update.average_age)
            .bind(update.average_salary)
            .bind(update.gender_diversity_index)
            .bind(update.male_percentage)
            .bind(update.female_percentage)
            .fetch_one(&self.pool)
            .await?;
        Metric::try_from(row)
    }

    async fn get_metric(&self, segment: &Segment) -> StoreResult<Option<Metric>> {
        let sql = format!(
            "SELECT {} FROM metrics WHERE segment_type = $1 AND segment_key = $2",
            METRIC_COLUMNS
        );
        let row = sqlx::query_as::<_, MetricRow>(&sql)
            .bind(segment.segment_type().as_str())
            .bind(segment.key())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Metric::try_from).transpose()
    }

    async fn list_metrics(&self) -> StoreResult<Vec<Metric>> {
        let sql = format!(
            "SELECT {} FROM metrics ORDER BY segment_type, segment_key",
            METRIC_COLUMNS
        );
        let rows = sqlx::query_as::<_, MetricRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Metric::try_from).collect()
    }
}
