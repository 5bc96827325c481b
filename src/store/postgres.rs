use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::PgConnection;
use uuid::Uuid;

use crate::domain::{AuthProvider, User};
use crate::store::models::{IdentityRow, UserRow};
use crate::store::schema::{user_identities, users};
use crate::store::{AccountStore, StoreError};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Implémentation Postgres du [`AccountStore`].
///
/// Uniqueness (email, provider subject, one identity per user) is enforced by
/// the database indexes; creation writes both rows inside one transaction.
pub struct PgAccountStore {
    pool: DbPool,
}

impl PgAccountStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| StoreError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConnection, StoreError> {
        self.pool.get().map_err(Into::into)
    }

    fn identity_of(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Option<IdentityRow>, diesel::result::Error> {
        user_identities::table
            .filter(user_identities::user_id.eq(user_id))
            .select(IdentityRow::as_select())
            .first::<IdentityRow>(conn)
            .optional()
    }
}

impl AccountStore for PgAccountStore {
    fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn()?;

        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .optional()
            .map_err(StoreError::from)?;

        match row {
            Some(row) => {
                let identity = Self::identity_of(&mut conn, row.id)?;
                row.into_domain(identity).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn()?;

        let row = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .optional()
            .map_err(StoreError::from)?;

        match row {
            Some(row) => {
                let identity = Self::identity_of(&mut conn, row.id)?;
                row.into_domain(identity).map(Some)
            }
            None => Ok(None),
        }
    }

    fn find_by_provider_subject(
        &self,
        provider: AuthProvider,
        provider_user_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn()?;

        let pair = user_identities::table
            .inner_join(users::table)
            .filter(user_identities::provider.eq(provider.as_str()))
            .filter(user_identities::provider_user_id.eq(provider_user_id))
            .select((IdentityRow::as_select(), UserRow::as_select()))
            .first::<(IdentityRow, UserRow)>(&mut conn)
            .optional()
            .map_err(StoreError::from)?;

        match pair {
            Some((identity, user)) => user.into_domain(Some(identity)).map(Some),
            None => Ok(None),
        }
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let user_row = UserRow::from(user);
        let identity_row = user.identity().map(IdentityRow::from);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(users::table)
                .values(&user_row)
                .execute(conn)?;

            if let Some(identity_row) = &identity_row {
                diesel::insert_into(user_identities::table)
                    .values(identity_row)
                    .execute(conn)?;
            }

            Ok(())
        })
        .map_err(Into::into)
    }

    fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let user_row = UserRow::from(user);
        let identity_row = user.identity().map(IdentityRow::from);

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::update(users::table.find(user_row.id))
                .set(&user_row)
                .execute(conn)?;

            if let Some(identity_row) = &identity_row {
                diesel::update(user_identities::table.find(identity_row.id))
                    .set(identity_row)
                    .execute(conn)?;
            }

            Ok(())
        })
        .map_err(Into::into)
    }
}
