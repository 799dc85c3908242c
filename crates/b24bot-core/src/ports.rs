use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    domain::{ContactId, Credential, RobotSummary},
    robot::RobotDefinition,
    Result,
};

/// Durable home of the single installed credential.
///
/// Implementations must replace the record atomically on `save` and report a
/// missing or unreadable record as `None` from `load`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, credential: &Credential) -> Result<()>;
    async fn load(&self) -> Option<Credential>;
}

/// Authenticated calls against one portal's REST API.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// `bizproc.robot.delete`
    async fn delete_robot(&self, code: &str) -> Result<()>;

    /// `bizproc.robot.add`
    async fn register_robot(&self, definition: &RobotDefinition) -> Result<()>;

    /// `bizproc.robot.list`
    async fn list_robots(&self) -> Result<Vec<RobotSummary>>;

    /// `crm.contact.add`
    async fn create_contact(&self, fields: Map<String, Value>) -> Result<ContactId>;

    /// `bizproc.event.send`
    async fn report_result(&self, event_token: &str, return_values: Map<String, Value>)
        -> Result<()>;
}

/// Builds a [`PlatformClient`] bound to a portal domain and access token.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, domain: &str, access_token: &str) -> Box<dyn PlatformClient>;
}

/// OAuth2 authorization-code exchange with the platform's OAuth server.
#[async_trait]
pub trait OAuthExchange: Send + Sync {
    /// URL the installing admin is sent to when no code is present.
    fn authorize_url(&self) -> String;

    async fn exchange_code(&self, code: &str) -> Result<Credential>;
}
