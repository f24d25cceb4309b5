//! "User tests": account creation, session login/logout and bulk creation.

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::info;

use crate::environment::resolve_path;
use crate::error::{ContractError, FieldMode, Result};
use crate::factory::EntityKind;
use crate::testing::assertions::{expect_field, expect_matches_snapshot, expect_status};
use crate::testing::{CaseContext, Suite, TestCase};

use super::{USER, USER_BY_NAME, USER_CREATE_WITH_LIST, USER_LOGIN, USER_LOGOUT};

pub const SUITE: &str = "User tests";
pub const CREATE: &str = "create a user";
pub const LOG_IN: &str = "log in a user";
pub const LOG_OUT: &str = "log out a user";
pub const CREATE_LIST: &str = "create a list of users";

const ROLE: &str = "user";
const LIST_SIZE: usize = 3;
const ROUND_TRIP_FIELDS: [&str; 5] = ["username", "firstName", "lastName", "email", "phone"];

pub fn suite() -> Suite {
    Suite::new(SUITE)
        .case(CREATE, |cx| create_user(cx).boxed())
        .with_case(TestCase::new(LOG_IN, |cx| log_in(cx).boxed()).depends_on(CREATE))
        .case(LOG_OUT, |cx| log_out(cx).boxed())
        .case(CREATE_LIST, |cx| create_list(cx).boxed())
}

fn password_override(cx: &CaseContext<'_>) -> Value {
    json!({ "password": cx.env.test_data.user.password })
}

async fn create_user(cx: CaseContext<'_>) -> Result<()> {
    let user = cx.factory.generate(EntityKind::User, &password_override(&cx))?;

    let response = cx.client.create(USER, user.to_json()).await?;
    expect_status(&response, 200)?;
    expect_field(&response, "code", 200, FieldMode::Equals)?;

    let username = cx.fixtures.set(ROLE, &user).identity.to_string();
    info!(%username, "user created");

    let created = cx
        .client
        .read(&resolve_path(USER_BY_NAME, &[("username", username.as_str())])?, &[])
        .await?;
    expect_status(&created, 200)?;
    expect_matches_snapshot(&created, cx.fixtures.get(ROLE)?, &ROUND_TRIP_FIELDS)
}

async fn log_in(cx: CaseContext<'_>) -> Result<()> {
    let fixture = cx.fixtures.get(ROLE)?;
    let username = fixture.identity.to_string();
    let password = fixture
        .field_str("password")
        .ok_or_else(|| ContractError::configuration("User fixture has no password"))?
        .to_string();

    let response = cx
        .client
        .read(USER_LOGIN, &[("username", username.as_str()), ("password", password.as_str())])
        .await?;
    expect_status(&response, 200)?;
    expect_field(&response, "code", 200, FieldMode::Equals)?;
    expect_field(&response, "message", "logged in user", FieldMode::Contains)
}

async fn log_out(cx: CaseContext<'_>) -> Result<()> {
    let response = cx.client.read(USER_LOGOUT, &[]).await?;
    expect_status(&response, 200)?;
    expect_field(&response, "code", 200, FieldMode::Equals)?;
    expect_field(&response, "message", "ok", FieldMode::Equals)
}

async fn create_list(cx: CaseContext<'_>) -> Result<()> {
    let overrides = password_override(&cx);
    let users = (0..LIST_SIZE)
        .map(|_| cx.factory.generate(EntityKind::User, &overrides))
        .collect::<Result<Vec<_>>>()?;

    let payload = Value::Array(users.iter().map(|user| user.to_json()).collect());
    let response = cx.client.create(USER_CREATE_WITH_LIST, payload).await?;
    expect_status(&response, 200)?;

    for user in &users {
        let username = user.identity().to_string();
        let found = cx
            .client
            .read(&resolve_path(USER_BY_NAME, &[("username", username.as_str())])?, &[])
            .await?;
        expect_status(&found, 200)?;
        expect_field(&found, "username", username.as_str(), FieldMode::Contains)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RunEnvironment;
    use crate::factory::DataFactory;
    use crate::fixture::FixtureContext;
    use crate::http::ApiClient;
    use crate::scenarios::fake_store::{FakePetStore, Faults};
    use crate::testing::assertions::expect_fields;
    use crate::testing::{CaseVerdict, SkipReason, SuiteOrchestrator, SuiteStatus};

    fn environment(server: &wiremock::MockServer) -> RunEnvironment {
        RunEnvironment {
            base_url: FakePetStore::base_url(server),
            ..RunEnvironment::default()
        }
    }

    #[tokio::test]
    async fn suite_passes_against_conforming_store() {
        let store = FakePetStore::new();
        let server = store.serve().await;
        let orchestrator =
            SuiteOrchestrator::new(environment(&server), DataFactory::seeded(21)).unwrap();

        let report = orchestrator.run(&suite()).await;
        assert_eq!(report.status, SuiteStatus::Passed, "{report:?}");
        assert_eq!(report.passed(), 4);
    }

    #[tokio::test]
    async fn login_is_skipped_when_creation_fails() {
        let store = FakePetStore::with_faults(Faults {
            reject_user_create: true,
            ..Faults::default()
        });
        let server = store.serve().await;
        let orchestrator =
            SuiteOrchestrator::new(environment(&server), DataFactory::seeded(22)).unwrap();

        let report = orchestrator.run(&suite()).await;
        match &report.case(CREATE).unwrap().verdict {
            CaseVerdict::Failed(failure) => {
                assert_eq!(failure.kind, "status_mismatch");
                assert!(failure.message.contains("POST /user"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            report.case(LOG_IN).unwrap().verdict,
            CaseVerdict::Skipped {
                skip: SkipReason::DependencyFailed(CREATE.into())
            }
        );
        assert!(report.case(LOG_OUT).unwrap().verdict.is_passed());
        assert_eq!(report.status, SuiteStatus::PartiallyFailed);
    }

    #[tokio::test]
    async fn alice_round_trip() {
        let store = FakePetStore::new();
        let server = store.serve().await;
        let env = environment(&server);
        let client = ApiClient::new(&env).unwrap();
        let factory = DataFactory::seeded(23);
        let mut fixtures = FixtureContext::new();

        let alice = factory
            .generate(EntityKind::User, &json!({"username": "alice123", "password": "Secret1"}))
            .unwrap();
        let created = client.create(USER, alice.to_json()).await.unwrap();
        expect_status(&created, 200).unwrap();
        fixtures.set(ROLE, &alice);

        let read = client.read("/user/alice123", &[]).await.unwrap();
        expect_status(&read, 200).unwrap();
        expect_fields(&read, &[("username", json!("alice123"))]).unwrap();
        expect_matches_snapshot(&read, fixtures.get(ROLE).unwrap(), &ROUND_TRIP_FIELDS).unwrap();
        assert_eq!(store.user("alice123").unwrap()["password"], json!("Secret1"));
    }
}
