//! "Pet tests": one pet is created in setup and then read, updated twice
//! and finally deleted by the cases, each observing the previous writes.

use futures::FutureExt;
use serde_json::json;
use tracing::info;

use crate::environment::resolve_path;
use crate::error::{ContractError, FieldMode, Result};
use crate::factory::{Entity, EntityKind, Pet, PetStatus};
use crate::fixture::Fixture;
use crate::testing::assertions::{
    expect_absence, expect_field, expect_fields, expect_matches_snapshot, expect_status,
};
use crate::testing::{CaseContext, Suite};

use super::{PET, PET_BY_ID};

pub const SUITE: &str = "Pet tests";
pub const ADD: &str = "add a pet";
pub const UPDATE_IMAGE: &str = "update a pet's image";
pub const UPDATE_NAME_STATUS: &str = "update a pet's name and status";
pub const DELETE: &str = "delete a pet";

const ROLE: &str = "pet";
const ROUND_TRIP_FIELDS: [&str; 6] = ["id", "name", "category", "photoUrls", "tags", "status"];

pub fn suite() -> Suite {
    Suite::new(SUITE)
        .setup(|cx| create_pet(cx).boxed())
        .case(ADD, |cx| read_back(cx).boxed())
        .case(UPDATE_IMAGE, |cx| update_image(cx).boxed())
        .case(UPDATE_NAME_STATUS, |cx| update_name_and_status(cx).boxed())
        .case(DELETE, |cx| delete_pet(cx).boxed())
}

fn pet_path(fixture: &Fixture) -> Result<String> {
    let id = fixture.identity.to_string();
    resolve_path(PET_BY_ID, &[("id", id.as_str())])
}

fn typed_pet(fixture: &Fixture) -> Result<Pet> {
    match fixture.entity()? {
        Entity::Pet(pet) => Ok(pet),
        Entity::User(_) => Err(ContractError::configuration(format!(
            "Fixture `{}` is not a pet",
            fixture.role
        ))),
    }
}

async fn create_pet(cx: CaseContext<'_>) -> Result<()> {
    let overrides = json!({
        "category": { "id": 0, "name": "Fish" },
        "photoUrls": [cx.env.test_data.pet.initial_image],
        "tags": [{ "id": 0, "name": "fish" }],
        "status": PetStatus::Available.as_str(),
    });
    let pet = cx.factory.generate(EntityKind::Pet, &overrides)?;
    let pet_id = pet.identity().to_value();

    let response = cx.client.create(PET, pet.to_json()).await?;
    expect_status(&response, 200)?;
    expect_field(&response, "id", pet_id.clone(), FieldMode::Equals)?;

    let fixture = cx.fixtures.set(ROLE, &pet);
    info!(%pet_id, name = fixture.field_str("name").unwrap_or_default(), "pet created");
    Ok(())
}

async fn read_back(cx: CaseContext<'_>) -> Result<()> {
    let fixture = cx.fixtures.get(ROLE)?;
    let response = cx.client.read(&pet_path(fixture)?, &[]).await?;
    expect_status(&response, 200)?;
    expect_matches_snapshot(&response, fixture, &ROUND_TRIP_FIELDS)
}

async fn update_image(cx: CaseContext<'_>) -> Result<()> {
    let fixture = cx.fixtures.get(ROLE)?;
    let path = pet_path(fixture)?;
    let mut pet = typed_pet(fixture)?;
    let image = cx.env.test_data.pet.updated_image.clone();
    pet.photo_urls = vec![image.clone()];

    let response = cx.client.update(PET, Entity::Pet(pet).to_json()).await?;
    expect_status(&response, 200)?;
    cx.fixtures.update(ROLE, json!({ "photoUrls": [image.as_str()] }))?;

    let updated = cx.client.read(&path, &[]).await?;
    expect_status(&updated, 200)?;
    expect_field(&updated, "photoUrls[0]", image, FieldMode::Equals)
}

async fn update_name_and_status(cx: CaseContext<'_>) -> Result<()> {
    let fixture = cx.fixtures.get(ROLE)?;
    let path = pet_path(fixture)?;
    let mut pet = typed_pet(fixture)?;
    pet.name = cx.factory.pet_name(&pet.name);
    pet.status = PetStatus::NotAvailable;
    let name = json!(pet.name);
    let status = json!(pet.status.as_str());

    let response = cx.client.update(PET, Entity::Pet(pet).to_json()).await?;
    expect_status(&response, 200)?;
    cx.fixtures.update(ROLE, json!({ "name": name, "status": status }))?;

    let updated = cx.client.read(&path, &[]).await?;
    expect_status(&updated, 200)?;
    expect_fields(&updated, &[("name", name), ("status", status)])
}

async fn delete_pet(cx: CaseContext<'_>) -> Result<()> {
    let path = pet_path(cx.fixtures.get(ROLE)?)?;

    let response = cx.client.delete(&path).await?;
    expect_status(&response, 200)?;
    cx.fixtures.remove(ROLE)?;

    let gone = cx.client.read(&path, &[]).await?;
    expect_absence(&gone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RunEnvironment;
    use crate::factory::DataFactory;
    use crate::fixture::FixtureContext;
    use crate::http::ApiClient;
    use crate::scenarios::fake_store::{FakePetStore, Faults};
    use crate::testing::{CaseVerdict, SkipReason, SuiteOrchestrator, SuiteReport, SuiteStatus};

    async fn run_against(store: &FakePetStore, seed: u64) -> SuiteReport {
        let server = store.serve().await;
        let env = RunEnvironment {
            base_url: FakePetStore::base_url(&server),
            ..RunEnvironment::default()
        };
        let orchestrator = SuiteOrchestrator::new(env, DataFactory::seeded(seed)).unwrap();
        orchestrator.run(&suite()).await
    }

    fn failure_kind(report: &SuiteReport, case: &str) -> String {
        match &report.case(case).unwrap().verdict {
            CaseVerdict::Failed(failure) => failure.kind.clone(),
            other => panic!("{case} did not fail: {other:?}"),
        }
    }

    #[tokio::test]
    async fn lifecycle_passes_against_conforming_store() {
        let store = FakePetStore::new();
        let report = run_against(&store, 31).await;

        assert_eq!(report.status, SuiteStatus::Passed, "{report:?}");
        assert_eq!(report.passed(), 4);
        // create + two updates
        assert_eq!(store.pet_writes(), 3);
    }

    #[tokio::test]
    async fn failed_creation_blocks_every_case() {
        let store = FakePetStore::with_faults(Faults {
            reject_pet_create: true,
            ..Faults::default()
        });
        let report = run_against(&store, 32).await;

        assert_eq!(report.status, SuiteStatus::Blocked);
        assert_eq!(report.blocked_by.as_ref().unwrap().kind, "status_mismatch");
        assert_eq!(report.skipped(), 4);
        assert!(
            report
                .cases
                .iter()
                .all(|case| case.verdict == CaseVerdict::Skipped { skip: SkipReason::SetupFailed })
        );
    }

    #[tokio::test]
    async fn surviving_delete_is_unexpected_presence() {
        let store = FakePetStore::with_faults(Faults {
            keep_deleted_pets: true,
            ..Faults::default()
        });
        let report = run_against(&store, 33).await;

        assert_eq!(failure_kind(&report, DELETE), "unexpected_presence");
        assert_eq!(report.passed(), 3);
        assert_eq!(report.status, SuiteStatus::PartiallyFailed);
    }

    #[tokio::test]
    async fn ignored_updates_are_field_mismatches() {
        let store = FakePetStore::with_faults(Faults {
            ignore_pet_updates: true,
            ..Faults::default()
        });
        let report = run_against(&store, 34).await;

        assert!(report.case(ADD).unwrap().verdict.is_passed());
        assert_eq!(failure_kind(&report, UPDATE_IMAGE), "field_mismatch");
        assert_eq!(failure_kind(&report, UPDATE_NAME_STATUS), "field_mismatch");
        assert!(report.case(DELETE).unwrap().verdict.is_passed());
        assert_eq!(report.status, SuiteStatus::PartiallyFailed);
    }

    #[tokio::test]
    async fn rename_then_delete_pet_42() {
        let store = FakePetStore::new();
        let server = store.serve().await;
        let env = RunEnvironment {
            base_url: FakePetStore::base_url(&server),
            ..RunEnvironment::default()
        };
        let client = ApiClient::new(&env).unwrap();
        let factory = DataFactory::seeded(35);
        let mut fixtures = FixtureContext::new();

        let rex = factory
            .generate(EntityKind::Pet, &json!({"id": 42, "name": "Rex", "status": "available"}))
            .unwrap();
        let created = client.create(PET, rex.to_json()).await.unwrap();
        expect_status(&created, 200).unwrap();
        fixtures
            .set_snapshot(ROLE, EntityKind::Pet, created.body.unwrap())
            .unwrap();

        let mut max = typed_pet(fixtures.get(ROLE).unwrap()).unwrap();
        max.name = "Max".into();
        max.status = PetStatus::NotAvailable;
        expect_status(&client.update(PET, Entity::Pet(max).to_json()).await.unwrap(), 200).unwrap();
        let fixture = fixtures
            .update(ROLE, json!({"name": "Max", "status": "not available"}))
            .unwrap();
        assert_eq!(fixture.version, 1);

        let read = client.read("/pet/42", &[]).await.unwrap();
        expect_fields(
            &read,
            &[("name", json!("Max")), ("status", json!("not available"))],
        )
        .unwrap();
        expect_matches_snapshot(&read, fixtures.get(ROLE).unwrap(), &ROUND_TRIP_FIELDS).unwrap();

        expect_status(&client.delete("/pet/42").await.unwrap(), 200).unwrap();
        fixtures.remove(ROLE).unwrap();
        let gone = client.read("/pet/42", &[]).await.unwrap();
        expect_absence(&gone).unwrap();
        assert_eq!(gone.status, 404);
        assert!(store.pet(42).is_none());
    }

    #[tokio::test]
    async fn repeated_update_is_idempotent() {
        let store = FakePetStore::new();
        let server = store.serve().await;
        let env = RunEnvironment {
            base_url: FakePetStore::base_url(&server),
            ..RunEnvironment::default()
        };
        let client = ApiClient::new(&env).unwrap();
        let pet = DataFactory::seeded(36).generate(EntityKind::Pet, &json!(null)).unwrap();
        client.create(PET, pet.to_json()).await.unwrap();

        let mut renamed = match pet {
            Entity::Pet(pet) => pet,
            Entity::User(_) => unreachable!(),
        };
        renamed.name = "Bubbles".into();
        let body = Entity::Pet(renamed.clone()).to_json();
        for _ in 0..2 {
            expect_status(&client.update(PET, body.clone()).await.unwrap(), 200).unwrap();
        }

        let read = client.read(&format!("/pet/{}", renamed.id), &[]).await.unwrap();
        assert_eq!(read.body.unwrap(), body);
        assert_eq!(store.pet_writes(), 3);
    }
}
