//! In-memory store. Backs `STORE_BACKEND=memory` and the HTTP tests.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{EmployeeStore, MetricStore, StoreError, StoreResult};
use crate::models::employee::{Employee, EmployeeQuery, SortField, SortKey};
use crate::models::metric::{Metric, MetricUpdate, Segment};

#[derive(Default)]
pub struct MemoryStore {
    employees: RwLock<BTreeMap<i32, Employee>>,
    metrics: RwLock<HashMap<Segment, Metric>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Backend(format!("{} lock poisoned", what))
}

/// NULLs sort after every value.
fn cmp_nullable<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-folded first, so text sorts the way a database collation would.
fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn cmp_field(a: &Employee, b: &Employee, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::FirstName => cmp_text(&a.first_name, &b.first_name),
        SortField::LastName => cmp_text(&a.last_name, &b.last_name),
        SortField::DateOfBirth => a.date_of_birth.cmp(&b.date_of_birth),
        SortField::Industry => match (&a.industry, &b.industry) {
            (Some(a), Some(b)) => cmp_text(a, b),
            (a, b) => cmp_nullable(a, b),
        },
        SortField::Salary => cmp_nullable(&a.salary, &b.salary),
        SortField::YearsOfExperience => cmp_nullable(&a.years_of_experience, &b.years_of_experience),
    }
}

fn sort_employees(employees: &mut [Employee], ordering: &[SortKey]) {
    employees.sort_by(|a, b| {
        for key in ordering {
            let ord = cmp_field(a, b, key.field);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    });
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let mut guard = self.employees.write().map_err(|_| poisoned("employees"))?;
        if guard.contains_key(&employee.id) {
            return Err(StoreError::Conflict(format!(
                "employee {} already exists",
                employee.id
            )));
        }
        guard.insert(employee.id, employee.clone());
        Ok(())
    }

    async fn get_employee(&self, id: i32) -> StoreResult<Option<Employee>> {
        let guard = self.employees.read().map_err(|_| poisoned("employees"))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_employees(&self, query: &EmployeeQuery) -> StoreResult<Vec<Employee>> {
        let guard = self.employees.read().map_err(|_| poisoned("employees"))?;
        let mut employees: Vec<Employee> =
            guard.values().filter(|e| query.matches(e)).cloned().collect();
        drop(guard);

        sort_employees(&mut employees, &query.ordering);

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit.max(0) as usize);
        Ok(employees.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<bool> {
        let mut guard = self.employees.write().map_err(|_| poisoned("employees"))?;
        match guard.get_mut(&employee.id) {
            Some(stored) => {
                *stored = employee.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_employee(&self, id: i32) -> StoreResult<bool> {
        let mut guard = self.employees.write().map_err(|_| poisoned("employees"))?;
        Ok(guard.remove(&id).is_some())
    }

    async fn employees_in_segment(&self, segment: &Segment) -> StoreResult<Vec<Employee>> {
        let guard = self.employees.read().map_err(|_| poisoned("employees"))?;
        let employees = guard
            .values()
            .filter(|e| match segment {
                Segment::Industry(industry) => e.industry.as_deref() == Some(industry.as_str()),
                Segment::Experience(years) => e.years_of_experience == Some(*years),
            })
            .cloned()
            .collect();
        Ok(employees)
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn upsert_metric(&self, segment: &Segment, update: &MetricUpdate) -> StoreResult<Metric> {
        let mut guard = self.metrics.write().map_err(|_| poisoned("metrics"))?;
        let metric = guard
            .entry(segment.clone())
            .or_insert_with(|| Metric::empty(segment));
        metric.apply(update);
        Ok(metric.clone())
    }

    async fn get_metric(&self, segment: &Segment) -> StoreResult<Option<Metric>> {
        let guard = self.metrics.read().map_err(|_| poisoned("metrics"))?;
        Ok(guard.get(segment).cloned())
    }

    async fn list_metrics(&self) -> StoreResult<Vec<Metric>> {
        let guard = self.metrics.read().map_err(|_| poisoned("metrics"))?;
        let mut metrics: Vec<Metric> = guard.values().cloned().collect();
        metrics.sort_by(|a, b| {
            (a.segment_type.as_str(), &a.segment_key).cmp(&(b.segment_type.as_str(), &b.segment_key))
        });
        Ok(metrics)
    }
}
