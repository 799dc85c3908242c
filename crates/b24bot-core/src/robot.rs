//! The robot definition registered with the business-process engine.

use std::collections::BTreeMap;

use serde::Serialize;

/// Stable robot code; used as the idempotency key for delete-before-add.
pub const ROBOT_CODE: &str = "REST_ROBOT_MY_UNIQUE_V3";
pub const ROBOT_NAME: &str = "Bit24Test";

/// Portal user the robot runs as.
pub const AUTH_USER_ID: u32 = 1;
/// Document type the robot is offered for (CRM deals).
pub const DEAL_DOCUMENT_TYPE: &str = "CCrmDocumentDeal";

// Input properties (form keys arrive as `properties[<KEY>]`).
pub const PROP_LAST_NAME: &str = "LAST_NAME";
pub const PROP_NAME: &str = "NAME";
pub const PROP_SECOND_NAME: &str = "SECOND_NAME";
pub const PROP_PHONE: &str = "PHONE";
pub const PROP_EMAIL: &str = "EMAIL";

// Return properties.
pub const RET_CONTACT_ID: &str = "created_contact_id";
pub const RET_NAME: &str = "res_name";
pub const RET_LAST_NAME: &str = "res_last_name";
pub const RET_SECOND_NAME: &str = "res_second_name";
pub const RET_FULL_NAME: &str = "res_full_name";
pub const RET_PHONE: &str = "res_phone";
pub const RET_EMAIL: &str = "res_email";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Int,
}

/// One robot property, serialized in the portal's `{Name, Type, Required}` shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropertySpec {
    #[serde(rename = "Name")]
    pub display_name: String,
    #[serde(rename = "Type")]
    pub kind: PropertyType,
    #[serde(rename = "Required", skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

impl PropertySpec {
    pub fn new(display_name: &str, kind: PropertyType) -> Self {
        Self {
            display_name: display_name.to_string(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RobotDefinition {
    pub code: String,
    pub name: String,
    pub handler_url: String,
    pub properties: BTreeMap<String, PropertySpec>,
    pub return_properties: BTreeMap<String, PropertySpec>,
}

impl RobotDefinition {
    /// Materialize the contact robot for a deployment reachable at `handler_url`.
    pub fn contact_robot(handler_url: impl Into<String>) -> Self {
        use PropertyType::{Int, String as Str};

        let properties = [
            (PROP_LAST_NAME, PropertySpec::new("Фамилия", Str).required()),
            (PROP_NAME, PropertySpec::new("Имя", Str).required()),
            (PROP_SECOND_NAME, PropertySpec::new("Отчество", Str)),
            (PROP_PHONE, PropertySpec::new("Телефон", Str)),
            (PROP_EMAIL, PropertySpec::new("Email", Str)),
        ];

        let return_properties = [
            (RET_CONTACT_ID, PropertySpec::new("ID созданного контакта", Int)),
            (RET_NAME, PropertySpec::new("Имя контакта", Str)),
            (RET_LAST_NAME, PropertySpec::new("Фамилия контакта", Str)),
            (RET_SECOND_NAME, PropertySpec::new("Отчество контакта", Str)),
            (RET_FULL_NAME, PropertySpec::new("ФИО (одной строкой)", Str)),
            (RET_PHONE, PropertySpec::new("Телефон контакта (возврат)", Str)),
            (RET_EMAIL, PropertySpec::new("Email контакта (возврат)", Str)),
        ];

        Self {
            code: ROBOT_CODE.to_string(),
            name: ROBOT_NAME.to_string(),
            handler_url: handler_url.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            return_properties: return_properties
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}
