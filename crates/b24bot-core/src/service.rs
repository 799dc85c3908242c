//! Robot lifecycle: registration on a portal and processing of robot invocations.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::{
    domain::{ContactId, ContactRequest, Invocation},
    errors::Error,
    ports::{PlatformClient, PlatformConnector, TokenStore},
    robot::{self, RobotDefinition},
    Result,
};

const CONTACT_TYPE_CLIENT: &str = "CLIENT";
const MULTIFIELD_TYPE_WORK: &str = "WORK";

/// Application service behind both the install endpoints and the robot handler.
///
/// Holds no credential of its own: every invocation reads the store afresh, so a
/// reinstall takes effect on the next call.
pub struct RobotService {
    store: Arc<dyn TokenStore>,
    connector: Arc<dyn PlatformConnector>,
    handler_url: String,
}

impl RobotService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        connector: Arc<dyn PlatformConnector>,
        handler_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            connector,
            handler_url: handler_url.into(),
        }
    }

    pub fn definition(&self) -> RobotDefinition {
        RobotDefinition::contact_robot(self.handler_url.clone())
    }

    /// (Re)register the robot on `domain`.
    ///
    /// The old registration is deleted first and the outcome ignored, so repeated
    /// installs converge on the same remote state.
    pub async fn install(&self, domain: &str, access_token: &str) -> Result<()> {
        if domain.trim().is_empty() || access_token.trim().is_empty() {
            return Err(Error::Validation(
                "robot registration needs a portal domain and access token".to_string(),
            ));
        }

        let client = self.connector.connect(domain, access_token);
        let definition = self.definition();

        if let Err(e) = client.delete_robot(&definition.code).await {
            tracing::warn!(code = %definition.code, "robot delete before add ignored: {e}");
        }

        client.register_robot(&definition).await.map_err(|e| {
            tracing::error!(%domain, code = %definition.code, "robot registration failed: {e}");
            e
        })?;

        tracing::info!(%domain, code = %definition.code, handler = %definition.handler_url, "robot registered");
        Ok(())
    }

    /// Create the CRM contact for one invocation and report the outputs back.
    ///
    /// Success means the contact exists; result delivery is best-effort.
    pub async fn process(&self, invocation: &Invocation) -> Result<ContactId> {
        if invocation.event_token.trim().is_empty() {
            return Err(Error::Validation("event_token is missing".to_string()));
        }
        let contact = &invocation.contact;
        if !contact.has_required_names() {
            return Err(Error::Validation("NAME and LAST_NAME required".to_string()));
        }

        let client = self.client().await?;
        tracing::info!(
            first_name = %contact.first_name,
            last_name = %contact.last_name,
            "processing robot request"
        );

        let contact_id = client.create_contact(contact_fields(contact)).await?;
        tracing::info!(contact_id = contact_id.0, "contact created");

        let values = return_values(contact_id, contact);
        if let Err(e) = client.report_result(&invocation.event_token, values).await {
            tracing::warn!(
                contact_id = contact_id.0,
                "result not delivered to business process: {e}"
            );
        }

        Ok(contact_id)
    }

    async fn client(&self) -> Result<Box<dyn PlatformClient>> {
        let credential = self.store.load().await.ok_or_else(|| {
            Error::Config("application not installed: no stored credential".to_string())
        })?;
        if !credential.is_usable() {
            return Err(Error::Config(
                "stored credential lacks domain or access token".to_string(),
            ));
        }
        Ok(self
            .connector
            .connect(&credential.domain, &credential.access_token))
    }
}

/// CRM field map for `crm.contact.add`.
///
/// Phone and email are multi-fields and are omitted entirely when empty.
pub fn contact_fields(contact: &ContactRequest) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("NAME".into(), json!(contact.first_name));
    fields.insert("LAST_NAME".into(), json!(contact.last_name));
    fields.insert("SECOND_NAME".into(), json!(contact.second_name));
    fields.insert("TYPE_ID".into(), json!(CONTACT_TYPE_CLIENT));

    if !contact.phone.is_empty() {
        fields.insert("PHONE".into(), work_multifield(&contact.phone));
    }
    if !contact.email.is_empty() {
        fields.insert("EMAIL".into(), work_multifield(&contact.email));
    }
    fields
}

fn work_multifield(value: &str) -> Value {
    json!([{ "VALUE": value, "VALUE_TYPE": MULTIFIELD_TYPE_WORK }])
}

/// Output values, keyed exactly like the robot's return properties.
pub fn return_values(contact_id: ContactId, contact: &ContactRequest) -> Map<String, Value> {
    let mut values = Map::new();
    values.insert(robot::RET_CONTACT_ID.into(), json!(contact_id.0));
    values.insert(robot::RET_NAME.into(), json!(contact.first_name));
    values.insert(robot::RET_LAST_NAME.into(), json!(contact.last_name));
    values.insert(robot::RET_SECOND_NAME.into(), json!(contact.second_name));
    values.insert(robot::RET_FULL_NAME.into(), json!(contact.full_name()));
    values.insert(robot::RET_PHONE.into(), json!(contact.phone));
    values.insert(robot::RET_EMAIL.into(), json!(contact.email));
    values
}
