//! Session entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Session.
impl From<Model> for folio_core::domain::Session {
    fn from(model: Model) -> Self {
        Self {
            token: model.token,
            user_id: model.user_id,
            expires_at: model.expires_at.into(),
            created_at: model.created_at.into(),
        }
    }
}

/// Conversion from Domain Session to SeaORM ActiveModel.
impl From<folio_core::domain::Session> for ActiveModel {
    fn from(session: folio_core::domain::Session) -> Self {
        Self {
            token: Set(session.token),
            user_id: Set(session.user_id),
            expires_at: Set(session.expires_at.into()),
            created_at: Set(session.created_at.into()),
        }
    }
}
