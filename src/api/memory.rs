use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::tracker::entities::{Role, User, Workday};

use super::{ApiError, WorkdayApi};

/// Server stand-in keeping everything in memory. Mirrors the storage rules of the real backend:
/// one record per user and day, saves replace, listings come newest first.
#[derive(Default)]
pub struct MemoryApi {
    users: Mutex<BTreeMap<String, (String, Role)>>,
    workdays: Mutex<BTreeMap<(String, NaiveDate), Workday>>,
}

impl MemoryApi {
    pub fn with_user(self, dni: &str, password: &str, role: Role) -> Self {
        lock(&self.users).insert(dni.to_string(), (password.to_string(), role));
        self
    }

    pub fn stored(&self, dni: &str, date: NaiveDate) -> Option<Workday> {
        lock(&self.workdays).get(&(dni.to_string(), date)).cloned()
    }

    pub fn insert(&self, dni: &str, workday: Workday) {
        let workday = Workday {
            user_dni: Some(dni.to_string()),
            ..workday
        };
        lock(&self.workdays).insert((dni.to_string(), workday.date), workday);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl WorkdayApi for MemoryApi {
    async fn login(&self, dni: &str, password: &str) -> Result<User, ApiError> {
        match lock(&self.users).get(dni) {
            Some((stored, role)) if stored == password => Ok(User {
                dni: dni.to_string(),
                role: role.clone(),
            }),
            _ => Err(ApiError::Server {
                status: 401,
                message: "Incorrect DNI or password".into(),
            }),
        }
    }

    async fn get_workday(&self, dni: &str, date: NaiveDate) -> Result<Option<Workday>, ApiError> {
        Ok(self.stored(dni, date))
    }

    async fn save_workday(&self, dni: &str, workday: &Workday) -> Result<(), ApiError> {
        self.insert(dni, workday.clone());
        Ok(())
    }

    async fn delete_workday(&self, dni: &str, date: NaiveDate) -> Result<(), ApiError> {
        lock(&self.workdays).remove(&(dni.to_string(), date));
        Ok(())
    }

    async fn user_workdays(&self, dni: &str) -> Result<Vec<Workday>, ApiError> {
        let mut workdays = lock(&self.workdays)
            .values()
            .filter(|v| v.user_dni.as_deref() == Some(dni))
            .cloned()
            .collect::<Vec<_>>();
        workdays.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(workdays)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(lock(&self.users)
            .iter()
            .map(|(dni, (_, role))| User {
                dni: dni.clone(),
                role: role.clone(),
            })
            .collect())
    }

    async fn register_user(
        &self,
        dni: &str,
        password: &str,
        role: &Role,
    ) -> Result<String, ApiError> {
        let mut users = lock(&self.users);
        if users.contains_key(dni) {
            return Err(ApiError::Server {
                status: 409,
                message: "DNI already exists".into(),
            });
        }
        users.insert(dni.to_string(), (password.to_string(), role.clone()));
        Ok("User registered".into())
    }

    async fn all_workdays(&self) -> Result<Vec<Workday>, ApiError> {
        let mut workdays = lock(&self.workdays).values().cloned().collect::<Vec<_>>();
        workdays.sort_by(|a, b| a.user_dni.cmp(&b.user_dni).then(b.date.cmp(&a.date)));
        Ok(workdays)
    }
}
