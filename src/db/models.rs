pub mod event {
    use chrono::{DateTime, NaiveDate, Utc};
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "events")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = true)]
        pub id: i64,

        pub name: String,

        /// `normalize(name)`; half of the natural key.
        pub name_key: String,

        /// Calendar day of `event_date`; the other half of the natural key.
        pub event_day: NaiveDate,

        pub event_date: DateTime<Utc>,

        pub is_active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::fight::Entity")]
        Fight,
    }

    impl Related<super::fight::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Fight.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod fight {
    use rust_decimal::Decimal;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "fights")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = true)]
        pub id: i64,

        pub event_id: i64,

        pub fighter_a_name: String,

        pub fighter_b_name: String,

        #[sea_orm(nullable)]
        pub odds_a: Option<Decimal>,

        #[sea_orm(nullable)]
        pub odds_b: Option<Decimal>,

        #[sea_orm(nullable)]
        pub winner: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::event::Entity",
            from = "Column::EventId",
            to = "super::event::Column::Id",
            on_delete = "Cascade"
        )]
        Event,
    }

    impl Related<super::event::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Event.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
