//! End-to-end visibility scenarios
//!
//! Wires the real services over the in-memory store with a scripted
//! policy oracle:
//! - limited viewers never receive mood
//! - an unreachable or hanging oracle yields no records
//! - revoking is idempotent and hides records immediately
//! - duplicate shares are rejected

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use careshare::auth::{PolicyAction, UserRole, Viewer};
use careshare::logging::AuditLogger;
use careshare::onboarding::RoleService;
use careshare::permissions::{CapabilitySet, PermissionResolver, ResolverConfig};
use careshare::policy::{CachedPolicyOracle, DecisionCacheConfig, PolicyOracle, PolicyUser};
use careshare::records::{Mood, NewHealthRecord, PeriodFlow, RecordService, Symptom};
use careshare::shares::ShareRegistry;
use careshare::store::Stores;
use careshare::CareShareError;

/// How the scripted oracle answers for one user
#[derive(Clone, Copy)]
enum Script {
    Grant(CapabilitySet),
    Fail,
    Hang,
}

struct ScriptedOracle {
    scripts: HashMap<String, Script>,
    checks: AtomicUsize,
}

impl ScriptedOracle {
    fn new(scripts: &[(&str, Script)]) -> Arc<Self> {
        Arc::new(Self {
            scripts: scripts
                .iter()
                .map(|(id, script)| (id.to_string(), *script))
                .collect(),
            checks: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl PolicyOracle for ScriptedOracle {
    async fn check(
        &self,
        user_id: &str,
        action: PolicyAction,
        _resource: &str,
    ) -> Result<bool, CareShareError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(user_id).copied() {
            Some(Script::Grant(caps)) => Ok(match action {
                PolicyAction::ViewRecordsFull => caps.can_view_full,
                PolicyAction::ViewRecordsLimited => caps.can_view_limited,
                PolicyAction::Update => caps.can_update,
            }),
            Some(Script::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some(Script::Fail) | None => {
                Err(CareShareError::OracleUnavailable("unknown user".into()))
            }
        }
    }

    async fn sync_user(&self, _user: &PolicyUser, _role: UserRole) -> Result<bool, CareShareError> {
        Ok(true)
    }
}

struct World {
    records: RecordService,
    shares: ShareRegistry,
    roles: RoleService,
}

fn world(oracle: Arc<dyn PolicyOracle>) -> World {
    let stores = Stores::memory();
    let audit = AuditLogger::new();
    let resolver = Arc::new(PermissionResolver::new(
        Arc::clone(&oracle),
        audit.clone(),
        ResolverConfig {
            check_timeout: Duration::from_millis(100),
            ..Default::default()
        },
    ));
    let shares = ShareRegistry::new(stores.shares.clone(), stores.users.clone(), audit.clone());
    World {
        records: RecordService::new(
            resolver,
            shares.clone(),
            stores.records.clone(),
            stores.users.clone(),
        ),
        shares,
        roles: RoleService::new(oracle, stores.users.clone(), audit, Duration::from_secs(1)),
    }
}

fn alice() -> Viewer {
    Viewer::new("alice", "alice@example.com")
}

fn doctor() -> Viewer {
    Viewer::new("dr-bob", "bob@clinic.example")
}

async fn onboard(world: &World) {
    world.roles.select_role(&alice(), UserRole::User).await.unwrap();
    world.roles.select_role(&doctor(), UserRole::Doctor).await.unwrap();
}

async fn track_day(world: &World, day: u32, mood: Mood) {
    world
        .records
        .track_record(
            &alice(),
            NewHealthRecord {
                record_date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
                period_flow: Some(PeriodFlow::Heavy),
                symptoms: vec![Symptom::Cramps, Symptom::BackPain],
                mood: Some(mood),
                notes: Some("hot water bottle".into()),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn doctor_with_limited_view_never_sees_mood() {
    let oracle = ScriptedOracle::new(&[("dr-bob", Script::Grant(CapabilitySet::limited()))]);
    let world = world(oracle);
    onboard(&world).await;
    track_day(&world, 1, Mood::Anxious).await;
    track_day(&world, 2, Mood::Calm).await;
    world.shares.create_share("alice", "Bob@Clinic.example").await.unwrap();

    let view = world.records.viewable_records(&doctor()).await.unwrap();
    assert_eq!(view.capabilities, CapabilitySet::limited());
    assert_eq!(view.owners.len(), 1);

    let group = &view.owners[0];
    assert_eq!(group.owner_id, "alice");
    assert_eq!(group.owner_email.as_deref(), Some("alice@example.com"));

    let json = serde_json::to_value(group).unwrap();
    let records = json["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    for record in records {
        let obj = record.as_object().unwrap();
        assert!(!obj.contains_key("mood"));
        assert_eq!(obj["period_flow"], "heavy");
        assert_eq!(obj["notes"], "hot water bottle");
    }
    assert_eq!(records[0]["record_date"], "2024-07-02");
    assert!(json["latest_record"].get("mood").is_none());
}

#[tokio::test]
async fn partner_with_full_view_sees_everything() {
    let oracle = ScriptedOracle::new(&[("dr-bob", Script::Grant(CapabilitySet::full()))]);
    let world = world(oracle);
    onboard(&world).await;
    track_day(&world, 3, Mood::Happy).await;
    world.shares.create_share("alice", "bob@clinic.example").await.unwrap();

    let view = world.records.viewable_records(&doctor()).await.unwrap();
    let json = serde_json::to_value(&view.owners[0].records[0]).unwrap();
    assert_eq!(json["mood"], "happy");
    assert_eq!(json["user_id"], "alice");
}

#[tokio::test]
async fn oracle_failure_shows_nothing() {
    for script in [Script::Fail, Script::Hang] {
        let oracle = ScriptedOracle::new(&[("dr-bob", script)]);
        let world = world(oracle);
        onboard(&world).await;
        track_day(&world, 4, Mood::Sensitive).await;
        world.shares.create_share("alice", "bob@clinic.example").await.unwrap();

        let view = tokio::time::timeout(
            Duration::from_secs(5),
            world.records.viewable_records(&doctor()),
        )
        .await
        .expect("resolution must not hang")
        .unwrap();
        assert_eq!(view.capabilities, CapabilitySet::restricted());
        assert!(view.owners.is_empty());
    }
}

#[tokio::test]
async fn owner_always_sees_own_records_in_full() {
    let oracle = ScriptedOracle::new(&[]);
    let world = world(oracle);
    onboard(&world).await;
    track_day(&world, 5, Mood::Irritable).await;

    let own = world.records.own_records(&alice()).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].mood, Some(Mood::Irritable));
}

#[tokio::test]
async fn revoke_hides_records_and_is_idempotent() {
    let oracle = ScriptedOracle::new(&[("dr-bob", Script::Grant(CapabilitySet::full()))]);
    let world = world(oracle);
    onboard(&world).await;
    track_day(&world, 6, Mood::Calm).await;
    let share = world.shares.create_share("alice", "bob@clinic.example").await.unwrap();

    assert_eq!(world.records.viewable_records(&doctor()).await.unwrap().owners.len(), 1);

    world.shares.revoke_owned_share("alice", &share.id).await.unwrap();
    world.shares.revoke_owned_share("alice", &share.id).await.unwrap();

    assert!(world.records.viewable_records(&doctor()).await.unwrap().owners.is_empty());
    assert!(world
        .shares
        .list_active_shares_by_viewer_email("bob@clinic.example")
        .await
        .unwrap()
        .is_empty());

    // Sharing again after a revoke is allowed
    world.shares.create_share("alice", "bob@clinic.example").await.unwrap();
}

#[tokio::test]
async fn duplicate_share_rejected() {
    let oracle = ScriptedOracle::new(&[]);
    let world = world(oracle);
    onboard(&world).await;

    world.shares.create_share("alice", "bob@clinic.example").await.unwrap();
    let err = world
        .shares
        .create_share("alice", "  BOB@clinic.example ")
        .await
        .unwrap_err();
    assert!(matches!(err, CareShareError::DuplicateShare(_)));
    assert_eq!(
        world.shares.list_active_shares_by_owner("alice").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn cached_oracle_serves_repeat_resolutions() {
    let scripted = ScriptedOracle::new(&[("dr-bob", Script::Grant(CapabilitySet::limited()))]);
    let cached = Arc::new(CachedPolicyOracle::new(
        scripted.clone(),
        DecisionCacheConfig::default(),
    ));
    let world = world(cached);
    onboard(&world).await;
    world.shares.create_share("alice", "bob@clinic.example").await.unwrap();

    world.records.viewable_records(&doctor()).await.unwrap();
    world.records.viewable_records(&doctor()).await.unwrap();

    assert_eq!(
        scripted.checks.load(Ordering::SeqCst),
        PolicyAction::TRACKED.len()
    );
}
