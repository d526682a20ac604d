use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub full_name: String,

    pub municipality: String,

    pub id_number: String,

    /// Role label (admin, mto, ptcao)
    pub designation: String,

    /// Stored lower-cased
    #[sea_orm(unique)]
    pub email: String,

    pub gender: String,

    pub birthday: Date,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// False until an administrator approves the registration.
    #[sea_orm(default_value = false)]
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
