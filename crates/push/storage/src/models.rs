//! Database models.

use diesel::prelude::*;

use crate::schema::{access_tokens, fcm_tokens};

/// Registered device token.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = fcm_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FcmTokenRow {
    pub id: i32,
    pub owner_id: String,
    pub pet_id: Option<String>,
    pub token: String,
    pub created_at: chrono::NaiveDateTime,
}

/// New device token for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = fcm_tokens)]
pub struct NewFcmToken<'a> {
    pub owner_id: &'a str,
    pub pet_id: Option<&'a str>,
    pub token: &'a str,
    pub created_at: chrono::NaiveDateTime,
}

/// Issued user access token.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = access_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccessTokenRow {
    pub token: String,
    pub user_id: String,
    pub expires_at: Option<chrono::NaiveDateTime>,
}

/// New access token for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = access_tokens)]
pub struct NewAccessToken<'a> {
    pub token: &'a str,
    pub user_id: &'a str,
    pub expires_at: Option<chrono::NaiveDateTime>,
}
