use crate::orm::users;
use crate::session::hash_password;
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// The parts of a user the request context needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub is_staff: bool,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.username,
            is_staff: user.is_staff,
        }
    }
}

impl Profile {
    /// Returns a user profile by id.
    pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<Self>, DbErr> {
        Ok(users::Entity::find_by_id(id).one(db).await?.map(Self::from))
    }
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(name))
        .one(db)
        .await
}

/// Creates a user with an argon2-hashed password.
pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
    is_staff: bool,
) -> Result<users::Model, DbErr> {
    let password_hash = hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    users::ActiveModel {
        username: Set(username.trim().to_owned()),
        password: Set(password_hash),
        is_staff: Set(is_staff),
        created_at: Set(Utc::now().naive_utc()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Stamps the last successful login.
pub async fn touch_last_login<C: ConnectionTrait>(db: &C, user: users::Model) -> Result<(), DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.last_login = Set(Some(Utc::now().naive_utc()));
    active.update(db).await?;
    Ok(())
}
