use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
};
use sea_orm_migration::{MigrationName, SchemaManager};

use school_facilities_entity::sea_orm_active_enums::UserRole;
use school_facilities_entity::{board, budget_category, contract, contract_year, maintenance_history, school, user, user_school};

use crate::catalog::{enum_label_exists, DbEnum};
use crate::error::{MigrationError, StepError};
use crate::migrator::{BucketProvisioner, Criticality, Migrator, StepContext, StepKind, StepState, StepTrait, Tracking};
use crate::seed::SeedData;
use crate::tracking::TrackingStore;

/// 单连接的内存数据库，多连接时每个连接会拿到各自独立的库
pub(crate) async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    Database::connect(opt).await.unwrap()
}

#[derive(Default)]
struct RecordingBuckets {
    created: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingBuckets {
    fn failing_on(bucket: String) -> Self {
        Self {
            fail_on: Some(bucket),
            ..Default::default()
        }
    }

    fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl BucketProvisioner for RecordingBuckets {
    async fn create_bucket_if_absent(&self, name: &str) -> anyhow::Result<()> {
        if self.fail_on.as_deref() == Some(name) {
            anyhow::bail!("存储服务不可用");
        }
        self.created.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

struct Stub {
    name: &'static str,
    kind: StepKind,
    criticality: Criticality,
    tracking: Tracking,
    requires: &'static [&'static str],
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl Stub {
    fn new(name: &'static str, kind: StepKind) -> Self {
        Self {
            name,
            kind,
            criticality: Criticality::NonCritical,
            tracking: Tracking::SelfIdempotent,
            requires: &[],
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn critical(mut self) -> Self {
        self.criticality = Criticality::Critical;
        self
    }

    fn tracked(mut self) -> Self {
        self.tracking = Tracking::Tracked;
        self
    }

    fn depends_on(mut self, requires: &'static [&'static str]) -> Self {
        self.requires = requires;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl MigrationName for Stub {
    fn name(&self) -> &str {
        self.name
    }
}

#[async_trait::async_trait]
impl StepTrait for Stub {
    fn kind(&self) -> StepKind {
        self.kind
    }

    fn criticality(&self) -> Criticality {
        self.criticality
    }

    fn tracking(&self) -> Tracking {
        self.tracking
    }

    fn requires(&self) -> &'static [&'static str] {
        self.requires
    }

    async fn up(&self, _ctx: &StepContext<'_>) -> Result<(), StepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StepError::Data("boom".to_string()));
        }
        Ok(())
    }
}

/// 把迁移记录表换成一个列对不上的同名表，之后的查询和写入都会失败
struct BreakTrackingTable;

impl MigrationName for BreakTrackingTable {
    fn name(&self) -> &str {
        "m_break_tracking_table"
    }
}

#[async_trait::async_trait]
impl StepTrait for BreakTrackingTable {
    fn kind(&self) -> StepKind {
        StepKind::Schema
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    fn tracking(&self) -> Tracking {
        Tracking::SelfIdempotent
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        ctx.db.execute_unprepared("DROP TABLE app_migrations").await?;
        ctx.db.execute_unprepared("CREATE TABLE app_migrations (bogus TEXT)").await?;
        Ok(())
    }
}

fn boxed(steps: Vec<Stub>) -> Vec<Box<dyn StepTrait>> {
    steps.into_iter().map(|s| Box::new(s) as Box<dyn StepTrait>).collect()
}

async fn enum_label_rows(db: &DatabaseConnection) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            "SELECT COUNT(*) AS n FROM enum_labels",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

fn staff_user(index: usize) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(format!("u-staff-{:05}", index)),
        email: Set(format!("staff{}@example.org", index)),
        display_name: Set(format!("Staff {}", index)),
        role: Set(UserRole::Staff),
        password_hash: Set(None),
        created_at: Set("2024-03-12 00:00:00".to_string()),
    }
}

/// 只执行到种子数据为止，便于在数据修复步骤之前插入测试数据
fn migrator_through_seed() -> Migrator {
    Migrator::new(crate::steps().into_iter().take(6).collect())
}

#[test]
fn test_default_plan_is_valid() {
    let migrator = Migrator::default();
    migrator.validate().unwrap();
    let names = migrator.step_names();
    assert_eq!(names.len(), 11);
    assert_eq!(names[0], "m20240108_000001_create_base_schema");
    assert_eq!(names[10], "m20240902_000001_backfill_contract_years");
}

#[test]
fn test_invalid_plans_are_rejected() {
    let duplicated = Migrator::new(boxed(vec![
        Stub::new("m_a", StepKind::Schema),
        Stub::new("m_a", StepKind::Schema),
    ]));
    assert_matches!(duplicated.validate(), Err(MigrationError::InvalidPlan(_)));

    let unnamed = Migrator::new(boxed(vec![Stub::new("", StepKind::Schema)]));
    assert_matches!(unnamed.validate(), Err(MigrationError::InvalidPlan(_)));

    let out_of_order = Migrator::new(boxed(vec![
        Stub::new("m_seed", StepKind::Seed).depends_on(&["m_schema"]),
        Stub::new("m_schema", StepKind::Schema),
    ]));
    assert_matches!(out_of_order.validate(), Err(MigrationError::InvalidPlan(_)));

    let schema_after_data = Migrator::new(boxed(vec![
        Stub::new("m_schema", StepKind::Schema),
        Stub::new("m_data", StepKind::Data),
        Stub::new("m_late_schema", StepKind::Schema),
    ]));
    assert_matches!(schema_after_data.validate(), Err(MigrationError::InvalidPlan(msg)) if msg.contains("m_late_schema"));

    let fine = Migrator::new(boxed(vec![
        Stub::new("m_schema", StepKind::Schema),
        Stub::new("m_seed", StepKind::Seed).depends_on(&["m_schema"]),
        Stub::new("m_data", StepKind::Data).depends_on(&["m_schema", "m_seed"]),
    ]));
    fine.validate().unwrap();
}

#[tokio::test]
async fn test_invalid_plan_runs_nothing() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let first = Stub::new("m_a", StepKind::Data);
    let first_calls = first.calls();
    let migrator = Migrator::new(boxed(vec![first, Stub::new("m_b", StepKind::Schema)]));
    assert_matches!(migrator.run(&ctx).await, Err(MigrationError::InvalidPlan(_)));
    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_critical_failure_aborts_remaining_steps() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let before = Stub::new("m_before", StepKind::Schema).critical();
    let after = Stub::new("m_after", StepKind::Data);
    let (before_calls, after_calls) = (before.calls(), after.calls());
    let migrator = Migrator::new(boxed(vec![
        before,
        Stub::new("m_bad", StepKind::Schema).critical().failing(),
        after,
    ]));

    let result = migrator.run(&ctx).await;
    assert_matches!(
        result,
        Err(MigrationError::CriticalStep { step, source: StepError::Data(_) }) if step == "m_bad"
    );
    assert_eq!(before_calls.load(Ordering::SeqCst), 1);
    assert_eq!(after_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_critical_failure_is_isolated() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let after = Stub::new("m_after", StepKind::Data).tracked();
    let after_calls = after.calls();
    let migrator = Migrator::new(boxed(vec![
        Stub::new("m_bad", StepKind::Data).tracked().failing(),
        after,
    ]));

    let report = migrator.run(&ctx).await.unwrap();
    assert_eq!(report.failed(), vec!["m_bad"]);
    assert_matches!(report.state("m_bad"), Some(StepState::Failed(msg)) if msg.contains("boom"));
    assert_eq!(report.state("m_after"), Some(&StepState::Completed));
    assert_eq!(after_calls.load(Ordering::SeqCst), 1);

    // 失败的步骤没有记录，下次启动会重试；成功的不再执行
    let store = TrackingStore::new(&db);
    assert!(!store.has_run("m_bad").await);
    assert!(store.has_run("m_after").await);
}

#[tokio::test]
async fn test_tracked_steps_run_once_and_self_idempotent_steps_always_run() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let tracked = Stub::new("m_tracked", StepKind::Data).tracked();
    let always = Stub::new("m_always", StepKind::Data);
    let (tracked_calls, always_calls) = (tracked.calls(), always.calls());
    let migrator = Migrator::new(boxed(vec![tracked, always]));

    let first = migrator.run(&ctx).await.unwrap();
    assert_eq!(first.count(&StepState::Completed), 2);
    let second = migrator.run(&ctx).await.unwrap();
    assert_eq!(second.state("m_tracked"), Some(&StepState::Skipped));
    assert_eq!(second.state("m_always"), Some(&StepState::Completed));

    assert_eq!(tracked_calls.load(Ordering::SeqCst), 1);
    assert_eq!(always_calls.load(Ordering::SeqCst), 2);

    // 自行判断幂等的步骤不写迁移记录
    let records = TrackingStore::new(&db).records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "m_tracked");
}

#[tokio::test]
async fn test_broken_tracking_table_fails_open() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let tracked = Stub::new("m_tracked", StepKind::Data).tracked();
    let tracked_calls = tracked.calls();
    let migrator = Migrator::new(vec![
        Box::new(BreakTrackingTable) as Box<dyn StepTrait>,
        Box::new(tracked) as Box<dyn StepTrait>,
    ]);

    let report = migrator.run(&ctx).await.unwrap();
    // 查询失败按未执行处理，步骤照常执行，但记录写不进去，算作失败
    assert_eq!(tracked_calls.load(Ordering::SeqCst), 1);
    assert_matches!(report.state("m_tracked"), Some(StepState::Failed(_)));
    assert_eq!(report.state("m_break_tracking_table"), Some(&StepState::Completed));
}

#[tokio::test]
async fn test_empty_database_is_fully_initialized() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert!(report.failed().is_empty(), "{:?}", report.steps());
    assert_eq!(report.count(&StepState::Completed), 11);

    let manager = SchemaManager::new(&db);
    for table in ["boards", "schools", "users", "user_schools", "tickets", "documents", "sessions", "contract_years"] {
        assert!(manager.has_table(table).await.unwrap(), "{}", table);
    }
    assert!(manager.has_column("schools", "board_id").await.unwrap());
    assert!(manager.has_column("user_schools", "is_default").await.unwrap());
    assert!(manager.has_column("budget_categories", "spent").await.unwrap());

    for (db_enum, label) in [
        (DbEnum::UserRole, "admin"),
        (DbEnum::UserRole, "board_admin"),
        (DbEnum::TicketStatus, "open"),
        (DbEnum::TicketStatus, "on_hold"),
        (DbEnum::TicketStatus, "awaiting_parts"),
        (DbEnum::TicketPriority, "urgent"),
        (DbEnum::DocumentCategory, "inspection_report"),
        (DbEnum::DocumentCategory, "floor_plan"),
    ] {
        assert!(
            enum_label_exists(&manager, db_enum, label).await.unwrap(),
            "{}.{}",
            db_enum.name(),
            label
        );
    }

    assert_eq!(board::Entity::find().count(&db).await.unwrap(), 2);
    let school_ids: Vec<String> = school::Entity::find()
        .order_by_asc(school::Column::Id)
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    let expected: Vec<String> = seed.schools.iter().map(|s| s.id.clone()).collect();
    assert_eq!(school_ids, expected);

    let admin = user::Entity::find_by_id(seed.admin.id.clone())
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, UserRole::Admin);
    assert_eq!(admin.email, seed.admin.email);

    let links = user_school::Entity::find().all(&db).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].user_id, seed.admin.id);
    assert_eq!(Some(links[0].school_id.clone()), seed.default_school_id);
    assert!(links[0].is_default);

    let created = buckets.created();
    assert_eq!(created.len(), 9);
    assert!(created.contains(&seed.bucket_name(&seed.schools[0].id)));

    let records = TrackingStore::new(&db).records().await.unwrap();
    let mut tracked: Vec<String> = records.into_iter().map(|r| r.name).collect();
    tracked.sort();
    assert_eq!(
        tracked,
        vec![
            "m20240311_000002_add_multi_tenant_columns",
            "m20240520_000001_add_budget_and_contract_columns",
            "m20240715_000001_recalculate_budget_spent",
            "m20240902_000001_backfill_contract_years",
        ]
    );
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);
    let migrator = Migrator::default();

    migrator.run(&ctx).await.unwrap();
    let labels_after_first_run = enum_label_rows(&db).await;
    let report = migrator.run(&ctx).await.unwrap();

    assert!(report.failed().is_empty(), "{:?}", report.steps());
    // 4 + 4 + 4 + 5 个基础取值，加上后续补充的 5 个
    assert_eq!(labels_after_first_run, 22);
    assert_eq!(enum_label_rows(&db).await, labels_after_first_run);
    assert_eq!(report.count(&StepState::Skipped), 4);
    assert_eq!(report.count(&StepState::Completed), 7);
    assert_eq!(board::Entity::find().count(&db).await.unwrap(), 2);
    assert_eq!(school::Entity::find().count(&db).await.unwrap(), 9);
    assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(user_school::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_existing_schools_are_left_alone() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);

    // 只建表，不写种子数据
    Migrator::new(crate::steps().into_iter().take(5).collect())
        .run(&ctx)
        .await
        .unwrap();
    school::ActiveModel {
        id: Set("a-local-school".to_string()),
        name: Set("Local School".to_string()),
        board_id: Set(None),
        created_at: Set("2024-01-01 00:00:00".to_string()),
    }
    .insert(&db)
    .await
    .unwrap();

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert!(report.failed().is_empty(), "{:?}", report.steps());
    assert_eq!(school::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(board::Entity::find().count(&db).await.unwrap(), 0);

    // 配置的默认学校不存在，管理员被分配到现有学校
    let links = user_school::Entity::find().all(&db).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].school_id, "a-local-school");
    assert!(links[0].is_default);
}

#[tokio::test]
async fn test_bucket_failure_does_not_block_later_steps() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let failing_bucket = seed.bucket_name(&seed.schools[2].id);
    let buckets = RecordingBuckets::failing_on(failing_bucket);
    let ctx = StepContext::new(&db, &seed, &buckets);

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert_eq!(report.failed(), vec!["m20240601_000001_provision_school_buckets"]);
    assert_eq!(
        report.state("m20240715_000001_recalculate_budget_spent"),
        Some(&StepState::Completed)
    );
    assert_eq!(
        report.state("m20240902_000001_backfill_contract_years"),
        Some(&StepState::Completed)
    );
    // 其他学校的存储桶仍然创建了
    assert_eq!(buckets.created().len(), 8);
}

#[tokio::test]
async fn test_budget_spent_is_recalculated_case_insensitively() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);
    migrator_through_seed().run(&ctx).await.unwrap();

    let school_a = seed.schools[0].id.clone();
    let school_b = seed.schools[1].id.clone();

    let mut category_ids = Vec::new();
    for (school_id, name, spent) in [
        (&school_a, "Heating", 999.0),
        (&school_a, "Roofing", 50.0),
        (&school_b, "heating", 0.0),
    ] {
        let inserted = budget_category::ActiveModel {
            school_id: Set(school_id.clone()),
            name: Set(name.to_string()),
            year: Set(2024),
            budget: Set(1000.0),
            spent: Set(spent),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        category_ids.push(inserted.id);
    }
    for (school_id, category, cost) in [
        (&school_a, "HEATING", 100.0),
        (&school_a, "heating", 50.5),
        (&school_b, "Heating", 7.0),
        (&school_b, "Plumbing", 30.0),
    ] {
        maintenance_history::ActiveModel {
            school_id: Set(school_id.clone()),
            category: Set(category.to_string()),
            description: Set(None),
            cost: Set(cost),
            performed_on: Set("2024-05-01".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
    }

    Migrator::default().run(&ctx).await.unwrap();

    let spent = |id: i32| {
        let db = &db;
        async move {
            budget_category::Entity::find_by_id(id)
                .one(db)
                .await
                .unwrap()
                .unwrap()
                .spent
        }
    };
    assert_eq!(spent(category_ids[0]).await, 150.5);
    assert_eq!(spent(category_ids[1]).await, 0.0);
    assert_eq!(spent(category_ids[2]).await, 7.0);

    // 已有迁移记录，之后新增的维修记录不会再被汇总
    maintenance_history::ActiveModel {
        school_id: Set(school_a.clone()),
        category: Set("Heating".to_string()),
        description: Set(None),
        cost: Set(1.0),
        performed_on: Set("2024-06-01".to_string()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();
    let report = Migrator::default().run(&ctx).await.unwrap();
    assert_eq!(
        report.state("m20240715_000001_recalculate_budget_spent"),
        Some(&StepState::Skipped)
    );
    assert_eq!(spent(category_ids[0]).await, 150.5);
}

#[tokio::test]
async fn test_contract_years_are_backfilled() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);
    migrator_through_seed().run(&ctx).await.unwrap();

    let mut contract_ids = Vec::new();
    for (start_date, interval) in [("2020-09-01", Some(10)), ("2023-01-15", None), ("not a date", Some(1))] {
        let inserted = contract::ActiveModel {
            school_id: Set(seed.schools[0].id.clone()),
            name: Set("Boiler service".to_string()),
            vendor: Set(None),
            start_date: Set(start_date.to_string()),
            end_date: Set(None),
            recurrence_interval_years: Set(interval),
            created_at: Set("2024-01-01 00:00:00".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        contract_ids.push(inserted.id);
    }
    contract_year::ActiveModel {
        contract_id: Set(contract_ids[0]),
        year: Set(2030),
        status: Set("done".to_string()),
    }
    .insert(&db)
    .await
    .unwrap();

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert!(report.failed().is_empty(), "{:?}", report.steps());

    let years_of = |id: i32| {
        let db = &db;
        async move {
            contract_year::Entity::find()
                .filter(contract_year::Column::ContractId.eq(id))
                .order_by_asc(contract_year::Column::Year)
                .all(db)
                .await
                .unwrap()
        }
    };

    let recurring = years_of(contract_ids[0]).await;
    assert_eq!(
        recurring.iter().map(|y| y.year).collect::<Vec<_>>(),
        vec![2020, 2030, 2040, 2050]
    );
    // 已有记录保持原状
    assert_eq!(recurring[1].status, "done");
    assert_eq!(recurring[0].status, "pending");

    let once = years_of(contract_ids[1]).await;
    assert_eq!(once.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2023]);

    assert!(years_of(contract_ids[2]).await.is_empty());
}

#[tokio::test]
async fn test_users_without_school_get_default_link() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);
    Migrator::default().run(&ctx).await.unwrap();

    let lowest = seed.schools[0].id.clone();
    let higher = seed.schools[4].id.clone();
    for (id, email) in [("u-staff", "staff@example.org"), ("u-two-defaults", "two@example.org")] {
        user::ActiveModel {
            id: Set(id.to_string()),
            email: Set(email.to_string()),
            display_name: Set(id.to_string()),
            role: Set(UserRole::Staff),
            password_hash: Set(None),
            created_at: Set("2024-03-12 00:00:00".to_string()),
        }
        .insert(&db)
        .await
        .unwrap();
    }
    for school_id in [&higher, &lowest] {
        user_school::ActiveModel {
            user_id: Set("u-two-defaults".to_string()),
            school_id: Set(school_id.clone()),
            is_default: Set(true),
            created_at: Set("2024-03-12 00:00:00".to_string()),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert!(report.failed().is_empty(), "{:?}", report.steps());

    let staff_links = user_school::Entity::find()
        .filter(user_school::Column::UserId.eq("u-staff"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(staff_links.len(), 1);
    assert!(staff_links[0].is_default);

    let defaults: Vec<String> = user_school::Entity::find()
        .filter(user_school::Column::UserId.eq("u-two-defaults"))
        .filter(user_school::Column::IsDefault.eq(true))
        .all(&db)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.school_id)
        .collect();
    assert_eq!(defaults, vec![lowest]);
}

#[tokio::test]
async fn test_large_number_of_unlinked_users() {
    let db = memory_db().await;
    let seed = SeedData::default();
    let buckets = RecordingBuckets::default();
    let ctx = StepContext::new(&db, &seed, &buckets);
    Migrator::default().run(&ctx).await.unwrap();

    // 超过单条语句的绑定参数上限
    const USERS: usize = 9_000;
    for start in (0..USERS).step_by(1_000) {
        user::Entity::insert_many((start..start + 1_000).map(staff_user))
            .exec_without_returning(&db)
            .await
            .unwrap();
    }

    let report = Migrator::default().run(&ctx).await.unwrap();
    assert_eq!(
        report.state("m20240312_000003_assign_users_to_schools"),
        Some(&StepState::Completed)
    );

    let total_users = user::Entity::find().count(&db).await.unwrap();
    assert_eq!(total_users, USERS as u64 + 1);
    assert_eq!(user_school::Entity::find().count(&db).await.unwrap(), total_users);
    let defaults = user_school::Entity::find()
        .filter(user_school::Column::IsDefault.eq(true))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(defaults, total_users);

    let last = user_school::Entity::find()
        .filter(user_school::Column::UserId.eq(format!("u-staff-{:05}", USERS - 1)))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(last.school_id), seed.default_school_id);
}
