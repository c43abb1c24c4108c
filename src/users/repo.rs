use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::{CarDetails, DeleteSummary, NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("encode car details: {0}")]
    Encode(#[from] serde_json::Error),
    #[cfg(test)]
    #[error("store unavailable")]
    Unavailable,
}

/// Data-access seam for lead records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users in insertion order.
    async fn find_many(&self) -> Result<Vec<User>, StoreError>;
    /// Remove every user and report how many rows went away.
    async fn delete_many(&self) -> Result<DeleteSummary, StoreError>;
    /// Insert one user and return it with its assigned id.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_many(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, preferred_language, interest_score, sentiment,
                   phone_number, call_duration, car_details, created_at
              FROM users
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_many(&self) -> Result<DeleteSummary, StoreError> {
        let done = sqlx::query("DELETE FROM users").execute(&self.db).await?;
        Ok(DeleteSummary {
            count: done.rows_affected(),
        })
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let car_details = user
            .car_details
            .as_ref()
            .map(CarDetails::to_text)
            .transpose()?;

        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, preferred_language, interest_score, sentiment,
                               phone_number, call_duration, car_details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, preferred_language, interest_score, sentiment,
                      phone_number, call_duration, car_details, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.preferred_language)
        .bind(user.interest_score)
        .bind(&user.sentiment)
        .bind(&user.phone_number)
        .bind(user.call_duration)
        .bind(car_details) // Option<String> → NULL allowed
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
pub mod fakes {
    use std::sync::Mutex;

    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;

    /// In-process store keeping rows in insertion order.
    #[derive(Default)]
    pub struct MemoryUserStore {
        rows: Mutex<Vec<User>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_many(&self) -> Result<Vec<User>, StoreError> {
            Ok(self.rows.lock().expect("rows lock").clone())
        }

        async fn delete_many(&self) -> Result<DeleteSummary, StoreError> {
            let mut rows = self.rows.lock().expect("rows lock");
            let count = rows.len() as u64;
            rows.clear();
            Ok(DeleteSummary { count })
        }

        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            let car_details = user
                .car_details
                .as_ref()
                .map(CarDetails::to_text)
                .transpose()?;
            let row = User {
                id: Uuid::new_v4(),
                name: user.name,
                preferred_language: user.preferred_language,
                interest_score: user.interest_score,
                sentiment: user.sentiment,
                phone_number: user.phone_number,
                call_duration: user.call_duration,
                car_details,
                created_at: OffsetDateTime::now_utc(),
            };
            self.rows.lock().expect("rows lock").push(row.clone());
            Ok(row)
        }
    }

    /// Store whose every call fails, for error-path tests.
    pub struct DownUserStore;

    #[async_trait]
    impl UserStore for DownUserStore {
        async fn find_many(&self) -> Result<Vec<User>, StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn delete_many(&self) -> Result<DeleteSummary, StoreError> {
            Err(StoreError::Unavailable)
        }

        async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Unavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::MemoryUserStore;
    use super::*;

    fn lead(name: &str) -> NewUser {
        NewUser {
            name: name.into(),
            preferred_language: "Hindi".into(),
            interest_score: 7,
            sentiment: "Positive".into(),
            phone_number: "+91-9800000000".into(),
            call_duration: 240,
            car_details: Some(CarDetails {
                manufacturer: "Toyota".into(),
                model: "Corolla".into(),
                variant: "LE".into(),
                year: "2020".into(),
            }),
        }
    }

    #[tokio::test]
    async fn memory_store_keeps_insertion_order_and_unique_ids() {
        let store = MemoryUserStore::default();
        let a = store.create(lead("Asha")).await.unwrap();
        let b = store.create(lead("Bilal")).await.unwrap();
        assert_ne!(a.id, b.id);

        let all = store.find_many().await.unwrap();
        let names: Vec<_> = all.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Asha", "Bilal"]);
    }

    #[tokio::test]
    async fn memory_store_delete_reports_count() {
        let store = MemoryUserStore::default();
        store.create(lead("Asha")).await.unwrap();
        store.create(lead("Bilal")).await.unwrap();

        let summary = store.delete_many().await.unwrap();
        assert_eq!(summary.count, 2);
        assert!(store.find_many().await.unwrap().is_empty());
        assert_eq!(store.delete_many().await.unwrap().count, 0);
    }

    #[test]
    fn car_details_serialize_to_flat_json_text() {
        let text = lead("Asha").car_details.unwrap().to_text().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "manufacturer": "Toyota",
                "model": "Corolla",
                "variant": "LE",
                "year": "2020"
            })
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pg_find_many_returns_rows_in_insertion_order(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let mut created = Vec::new();
        for name in ["Asha", "Bilal", "Chitra", "Dev"] {
            created.push(store.create(lead(name)).await.unwrap());
        }

        let all = store.find_many().await.unwrap();
        let ids: Vec<_> = all.iter().map(|u| u.id).collect();
        let expected: Vec<_> = created.iter().map(|u| u.id).collect();
        assert_eq!(ids, expected);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pg_create_returns_stored_columns(pool: PgPool) {
        let store = PgUserStore::new(pool);
        let input = lead("Asha");
        let user = store.create(input.clone()).await.unwrap();

        assert_eq!(user.name, input.name);
        assert_eq!(user.preferred_language, input.preferred_language);
        assert_eq!(user.interest_score, input.interest_score);
        assert_eq!(user.sentiment, input.sentiment);
        assert_eq!(user.phone_number, input.phone_number);
        assert_eq!(user.call_duration, input.call_duration);
        let car: CarDetails = serde_json::from_str(user.car_details.as_deref().unwrap()).unwrap();
        assert_eq!(Some(car), input.car_details);

        let mut bare = lead("Bilal");
        bare.car_details = None;
        assert_eq!(store.create(bare).await.unwrap().car_details, None);

        let listed = store.find_many().await.unwrap();
        assert_eq!(listed[0], user);

        let json = serde_json::to_value(&listed[0]).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "callDuration",
                "carDetails",
                "id",
                "interestScore",
                "name",
                "phoneNumber",
                "preferredLanguage",
                "sentiment"
            ]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn pg_delete_many_counts_rows_then_leaves_table_empty(pool: PgPool) {
        let store = PgUserStore::new(pool);
        for name in ["Asha", "Bilal", "Chitra"] {
            store.create(lead(name)).await.unwrap();
        }

        assert_eq!(store.delete_many().await.unwrap().count, 3);
        assert!(store.find_many().await.unwrap().is_empty());
        assert_eq!(store.delete_many().await.unwrap().count, 0);
    }
}
