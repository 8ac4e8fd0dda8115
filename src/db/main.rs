use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::{ColumnDef, Expr, ForeignKey, ForeignKeyAction, Index, OnConflict, Table, TableCreateStatement};
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::models::{event, fight};
use crate::db::store::{Event, EventDraft, Fight, FightUpsert, Store};
use crate::error::{Error, Result};

pub struct Db {
    connection: DatabaseConnection,
}

impl Db {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("DATABASE_URL not set".into()))?;

        let mut options = ConnectOptions::new(url.to_string());
        options
            .max_connections(pool_size(url, config.max_connections))
            .sqlx_logging(false);

        let connection = Database::connect(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        info!("✅ Connected to {:?} database", connection.get_database_backend());
        Ok(Self { connection })
    }

    /// Create `events` and `fights` if they do not exist yet.
    pub async fn create_tables(&self) -> Result<()> {
        info!("Creating events and fights tables...");

        let events = Table::create()
            .table(event::Entity)
            .if_not_exists()
            .col(
                ColumnDef::new(event::Column::Id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key()
            )
            .col(
                ColumnDef::new(event::Column::Name)
                    .string_len(255)
                    .not_null()
            )
            .col(
                ColumnDef::new(event::Column::NameKey)
                    .string_len(255)
                    .not_null()
            )
            .col(
                ColumnDef::new(event::Column::EventDay)
                    .date()
                    .not_null()
            )
            .col(
                ColumnDef::new(event::Column::EventDate)
                    .timestamp_with_time_zone()
                    .not_null()
            )
            .col(
                ColumnDef::new(event::Column::IsActive)
                    .boolean()
                    .not_null()
                    .default(true)
            )
            .index(
                Index::create()
                    .name("uq_events_natural_key")
                    .col(event::Column::NameKey)
                    .col(event::Column::EventDay)
                    .unique()
            )
            .to_owned();

        let fights = Table::create()
            .table(fight::Entity)
            .if_not_exists()
            .col(
                ColumnDef::new(fight::Column::Id)
                    .big_integer()
                    .not_null()
                    .auto_increment()
                    .primary_key()
            )
            .col(
                ColumnDef::new(fight::Column::EventId)
                    .big_integer()
                    .not_null()
            )
            .col(
                ColumnDef::new(fight::Column::FighterAName)
                    .string_len(255)
                    .not_null()
            )
            .col(
                ColumnDef::new(fight::Column::FighterBName)
                    .string_len(255)
                    .not_null()
            )
            .col(
                ColumnDef::new(fight::Column::OddsA)
                    .decimal_len(20, 10)
            )
            .col(
                ColumnDef::new(fight::Column::OddsB)
                    .decimal_len(20, 10)
            )
            .col(
                ColumnDef::new(fight::Column::Winner)
                    .string_len(255)
            )
            .index(
                Index::create()
                    .name("uq_fights_natural_key")
                    .col(fight::Column::EventId)
                    .col(fight::Column::FighterAName)
                    .col(fight::Column::FighterBName)
                    .unique()
            )
            .foreign_key(
                ForeignKey::create()
                    .name("fk_fights_event")
                    .from(fight::Entity, fight::Column::EventId)
                    .to(event::Entity, event::Column::Id)
                    .on_delete(ForeignKeyAction::Cascade)
            )
            .to_owned();

        self.execute_schema(&events).await?;
        self.execute_schema(&fights).await?;

        info!("✅ Created events and fights tables");
        Ok(())
    }

    async fn execute_schema(&self, stmt: &TableCreateStatement) -> Result<()> {
        let backend = self.connection.get_database_backend();

        self.connection
            .execute(backend.build(stmt))
            .await
            .map_err(|e| Error::Database(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    async fn find_event_by_key(&self, draft: &EventDraft) -> Result<Option<event::Model>> {
        let (name_key, event_day) = draft.natural_key();

        let found = event::Entity::find()
            .filter(event::Column::NameKey.eq(name_key))
            .filter(event::Column::EventDay.eq(event_day))
            .one(&self.connection)
            .await?;

        Ok(found)
    }
}

#[async_trait]
impl Store for Db {
    async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = event::Entity::find()
            .order_by_asc(event::Column::EventDate)
            .order_by_asc(event::Column::Id)
            .all(&self.connection)
            .await?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn upsert_event(&self, draft: &EventDraft) -> Result<Event> {
        let (name_key, event_day) = draft.natural_key();

        let active_model = event::ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(draft.name.clone()),
            name_key: ActiveValue::Set(name_key),
            event_day: ActiveValue::Set(event_day),
            event_date: ActiveValue::Set(draft.event_date),
            is_active: ActiveValue::Set(draft.is_active),
        };

        <event::Entity as EntityTrait>::insert(active_model)
            .on_conflict(
                OnConflict::columns([event::Column::NameKey, event::Column::EventDay])
                    .update_columns([event::Column::EventDate, event::Column::IsActive])
                    .to_owned(),
            )
            .exec_without_returning(&self.connection)
            .await
            .map_err(|e| Error::Database(format!("Failed to upsert event {}: {}", draft.name, e)))?;

        self.find_event_by_key(draft)
            .await?
            .map(Event::from)
            .ok_or_else(|| Error::Database(format!("Event {} missing after upsert", draft.name)))
    }

    async fn refresh_event(&self, id: i64, event_date: Option<DateTime<Utc>>) -> Result<()> {
        if event::Entity::find_by_id(id).one(&self.connection).await?.is_none() {
            return Err(Error::EventNotFound(id));
        }

        let mut update = event::Entity::update_many().col_expr(event::Column::IsActive, Expr::value(true));
        if let Some(date) = event_date {
            update = update
                .col_expr(event::Column::EventDate, Expr::value(date))
                .col_expr(event::Column::EventDay, Expr::value(date.date_naive()));
        }

        update
            .filter(event::Column::Id.eq(id))
            .exec(&self.connection)
            .await
            .map_err(|e| Error::Database(format!("Failed to refresh event {}: {}", id, e)))?;

        Ok(())
    }

    async fn upsert_fight(&self, fight: &FightUpsert) -> Result<()> {
        let active_model = Self::create_fight_active_model(fight);

        <fight::Entity as EntityTrait>::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    fight::Column::EventId,
                    fight::Column::FighterAName,
                    fight::Column::FighterBName,
                ])
                .update_columns([fight::Column::OddsA, fight::Column::OddsB])
                .to_owned(),
            )
            .exec_without_returning(&self.connection)
            .await
            .map_err(|e| {
                Error::Database(format!(
                    "Failed to upsert fight {} vs {}: {}",
                    fight.fighter_a_name, fight.fighter_b_name, e
                ))
            })?;

        Ok(())
    }

    async fn find_event(&self, id: i64) -> Result<Option<Event>> {
        let found = event::Entity::find_by_id(id).one(&self.connection).await?;
        Ok(found.map(Event::from))
    }

    async fn fights_for_event(&self, event_id: i64) -> Result<Vec<Fight>> {
        let rows = fight::Entity::find()
            .filter(fight::Column::EventId.eq(event_id))
            .order_by_asc(fight::Column::Id)
            .all(&self.connection)
            .await?;

        Ok(rows.into_iter().map(Fight::from).collect())
    }
}

impl Db {
    fn create_fight_active_model(fight: &FightUpsert) -> fight::ActiveModel {
        // shortest round-trip text, so "1.83333" is stored as given
        let to_decimal = |v: f64| -> Option<Decimal> { Decimal::from_str(&v.to_string()).ok() };

        fight::ActiveModel {
            id: ActiveValue::NotSet,
            event_id: ActiveValue::Set(fight.event_id),
            fighter_a_name: ActiveValue::Set(fight.fighter_a_name.clone()),
            fighter_b_name: ActiveValue::Set(fight.fighter_b_name.clone()),
            odds_a: ActiveValue::Set(fight.odds_a.and_then(to_decimal)),
            odds_b: ActiveValue::Set(fight.odds_b.and_then(to_decimal)),
            winner: ActiveValue::NotSet,
        }
    }
}

/// Every connection to an in-memory SQLite database opens its own empty
/// database, so such URLs get a single pooled connection.
fn pool_size(url: &str, configured: u32) -> u32 {
    let in_memory = url.starts_with("sqlite::memory:") || (url.starts_with("sqlite:") && url.contains("mode=memory"));
    if in_memory {
        1
    } else {
        configured
    }
}

impl From<event::Model> for Event {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            event_date: m.event_date,
            is_active: m.is_active,
        }
    }
}

impl From<fight::Model> for Fight {
    fn from(m: fight::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            fighter_a_name: m.fighter_a_name,
            fighter_b_name: m.fighter_b_name,
            odds_a: m.odds_a.and_then(|d| d.to_f64()),
            odds_b: m.odds_b.and_then(|d| d.to_f64()),
            winner: m.winner,
        }
    }
}
