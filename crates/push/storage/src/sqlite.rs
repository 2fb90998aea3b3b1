//! SQLite storage implementation.

use color_eyre::eyre::WrapErr as _;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;

use crate::models::*;
use crate::schema::*;
use crate::traits::*;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
type SqliteConn = PooledConnection<ConnectionManager<SqliteConnection>>;

const IN_MEMORY_URL: &str = ":memory:";

/// SQLite-based storage.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage from a database URL.
    pub fn new(database_url: &str) -> color_eyre::eyre::Result<Self> {
        Self::with_pool_size(database_url, 10)
    }

    /// Open a migrated storage for `database_url`.
    ///
    /// `:memory:` gets the single-connection in-memory storage.
    pub fn open(database_url: &str) -> color_eyre::eyre::Result<Self> {
        if database_url == IN_MEMORY_URL {
            return Self::in_memory();
        }

        let storage = Self::new(database_url)?;
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Create a migrated in-memory storage.
    ///
    /// Every pooled connection would see its own in-memory database, so the
    /// pool is pinned to a single connection.
    pub fn in_memory() -> color_eyre::eyre::Result<Self> {
        let storage = Self::with_pool_size(IN_MEMORY_URL, 1)?;
        storage.run_migrations()?;
        Ok(storage)
    }

    fn with_pool_size(database_url: &str, max_size: u32) -> color_eyre::eyre::Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .wrap_err("failed to create connection pool")?;

        Ok(Self { pool })
    }

    /// Run migrations.
    pub fn run_migrations(&self) -> color_eyre::eyre::Result<()> {
        use diesel_migrations::MigrationHarness as _;

        let mut conn = self
            .pool
            .get()
            .wrap_err("failed to get connection for migrations")?;

        conn.run_pending_migrations(crate::MIGRATIONS)
            .map_err(|e| color_eyre::eyre::eyre!("migration failed: {}", e))?;

        Ok(())
    }

    fn conn(&self) -> color_eyre::eyre::Result<SqliteConn> {
        self.pool
            .get()
            .wrap_err("failed to get database connection")
    }

    /// Register a device token for an owner, optionally tied to a pet.
    pub fn register_device(
        &self,
        owner_id: &str,
        pet_id: Option<&str>,
        token: &str,
    ) -> color_eyre::eyre::Result<()> {
        let mut conn = self.conn()?;

        let row = NewFcmToken {
            owner_id,
            pet_id,
            token,
            created_at: chrono::Utc::now().naive_utc(),
        };

        diesel::insert_into(fcm_tokens::table)
            .values(&row)
            .execute(&mut conn)
            .wrap_err("failed to register device token")?;

        Ok(())
    }

    /// Issue an access token for a user. `None` never expires.
    pub fn issue_access_token(
        &self,
        token: &str,
        user_id: &str,
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
    ) -> color_eyre::eyre::Result<()> {
        let mut conn = self.conn()?;

        let row = NewAccessToken {
            token,
            user_id,
            expires_at: expires_at.map(|t| t.naive_utc()),
        };

        diesel::insert_into(access_tokens::table)
            .values(&row)
            .on_conflict(access_tokens::token)
            .do_update()
            .set((
                access_tokens::user_id.eq(user_id),
                access_tokens::expires_at.eq(row.expires_at),
            ))
            .execute(&mut conn)
            .wrap_err("failed to issue access token")?;

        Ok(())
    }

    fn lookup_user(&self, bearer: &str) -> color_eyre::eyre::Result<Option<String>> {
        let mut conn = self.conn()?;
        let now = chrono::Utc::now().naive_utc();

        access_tokens::table
            .filter(access_tokens::token.eq(bearer))
            .filter(
                access_tokens::expires_at
                    .is_null()
                    .or(access_tokens::expires_at.gt(now)),
            )
            .select(AccessTokenRow::as_select())
            .first::<AccessTokenRow>(&mut conn)
            .optional()
            .map(|row| row.map(|row| row.user_id))
            .wrap_err("failed to look up access token")
    }

    fn has_device(&self, owner_id: &str, token: &str) -> color_eyre::eyre::Result<bool> {
        let mut conn = self.conn()?;

        diesel::select(exists(
            fcm_tokens::table
                .filter(fcm_tokens::owner_id.eq(owner_id))
                .filter(fcm_tokens::token.eq(token)),
        ))
        .get_result(&mut conn)
        .wrap_err("failed to check token ownership")
    }

    fn pet_devices(
        &self,
        pet_id: &str,
        owner_id: Option<&str>,
    ) -> color_eyre::eyre::Result<Vec<String>> {
        let mut conn = self.conn()?;

        let mut query = fcm_tokens::table
            .filter(fcm_tokens::pet_id.eq(pet_id))
            .select(FcmTokenRow::as_select())
            .order(fcm_tokens::id.asc())
            .into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(owner_id) = owner_id {
            query = query.filter(fcm_tokens::owner_id.eq(owner_id));
        }

        let rows: Vec<FcmTokenRow> = query
            .load(&mut conn)
            .wrap_err("failed to load pet tokens")?;

        Ok(rows.into_iter().map(|row| row.token).collect())
    }

    /// Run a blocking storage call off the async runtime.
    async fn blocking<T, F>(&self, f: F) -> color_eyre::eyre::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> color_eyre::eyre::Result<T> + Send + 'static,
    {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .wrap_err("storage task failed")?
    }
}

impl IdentityStore for SqliteStorage {
    async fn verify_token(&self, bearer: &str) -> color_eyre::eyre::Result<Option<String>> {
        let bearer = bearer.to_owned();
        self.blocking(move |s| s.lookup_user(&bearer)).await
    }
}

impl TokenStore for SqliteStorage {
    async fn owns_token(&self, owner_id: &str, token: &str) -> color_eyre::eyre::Result<bool> {
        let (owner_id, token) = (owner_id.to_owned(), token.to_owned());
        self.blocking(move |s| s.has_device(&owner_id, &token)).await
    }

    async fn tokens_for_pet(
        &self,
        pet_id: &str,
        owner_id: Option<&str>,
    ) -> color_eyre::eyre::Result<Vec<String>> {
        let (pet_id, owner_id) = (pet_id.to_owned(), owner_id.map(str::to_owned));
        self.blocking(move |s| s.pet_devices(&pet_id, owner_id.as_deref()))
            .await
    }
}
