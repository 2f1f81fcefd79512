//! Seed helpers shared by the billing test modules

use shared::models::{
    BillingCycle, BillingCycleResolve, ContractCreate, ContractWithNames, ReadingOutcome, Room,
    RoomCreate, Tenant, TenantCreate, UtilityKind, UtilityRateCreate, UtilityType,
};
use sqlx::SqlitePool;

use crate::db::repository::{billing_cycle, contract, room, tenant, utility};

pub async fn seed_tenant(pool: &SqlitePool, username: &str) -> Tenant {
    tenant::create(
        pool,
        TenantCreate {
            username: username.into(),
            display_name: username.to_uppercase(),
            phone: None,
            email: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_room(pool: &SqlitePool, number: &str, capacity: i32) -> Room {
    room::create(
        pool,
        RoomCreate {
            room_number: number.into(),
            floor: 1,
            capacity: Some(capacity),
            monthly_rent: 3000.0,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_contract(pool: &SqlitePool, tenant_id: i64, room_id: i64) -> ContractWithNames {
    contract::create(
        pool,
        ContractCreate {
            tenant_id,
            room_id,
            start_date: "2024-01-01".into(),
            status: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_rate(pool: &SqlitePool, utility: UtilityKind, rate: f64, date: &str) {
    utility::append_rate(
        pool,
        UtilityRateCreate {
            utility,
            rate_per_unit: rate,
            effective_date: date.into(),
        },
    )
    .await
    .unwrap();
}

pub async fn seed_cycle(pool: &SqlitePool, year: i32, month: i32) -> BillingCycle {
    let mut conn = pool.acquire().await.unwrap();
    billing_cycle::resolve_or_create(
        &mut conn,
        BillingCycleResolve {
            year,
            month,
            start_date: None,
            end_date: None,
            due_date: None,
        },
    )
    .await
    .unwrap()
}

pub async fn utility_type(pool: &SqlitePool, kind: UtilityKind) -> UtilityType {
    let mut conn = pool.acquire().await.unwrap();
    utility::find_type_by_code(&mut conn, kind)
        .await
        .unwrap()
        .unwrap()
}

/// Record a reading through the real reconciler path
pub async fn seed_reading(
    pool: &SqlitePool,
    room_id: i64,
    year: i32,
    month: i32,
    kind: UtilityKind,
    value: f64,
) -> ReadingOutcome {
    let cycle = seed_cycle(pool, year, month).await;
    let utility = utility_type(pool, kind).await;
    let mut conn = pool.acquire().await.unwrap();
    super::reconciler::record_reading(&mut conn, room_id, &cycle, &utility, value)
        .await
        .unwrap()
}
