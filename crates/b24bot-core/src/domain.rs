use serde::{Deserialize, Serialize};

/// OAuth credential set for the (single) installed portal.
///
/// This is exactly the record the token store persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub application_token: Option<String>,
    #[serde(default)]
    pub domain: String,
}

impl Credential {
    /// Whether portal calls can be made with this credential at all.
    pub fn is_usable(&self) -> bool {
        !self.access_token.trim().is_empty() && !self.domain.trim().is_empty()
    }
}

/// Contact data received from a robot invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactRequest {
    pub last_name: String,
    pub first_name: String,
    pub second_name: String,
    pub phone: String,
    pub email: String,
}

impl ContactRequest {
    /// Build a request from optional form values; absent optional fields become empty.
    pub fn from_parts(
        last_name: Option<String>,
        first_name: Option<String>,
        second_name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            last_name: last_name.unwrap_or_default(),
            first_name: first_name.unwrap_or_default(),
            second_name: second_name.unwrap_or_default(),
            phone: phone.unwrap_or_default(),
            email: email.unwrap_or_default(),
        }
    }

    /// Both name parts must be present.
    pub fn has_required_names(&self) -> bool {
        !self.last_name.trim().is_empty() && !self.first_name.trim().is_empty()
    }

    /// "Last First Second" with blank parts dropped.
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.second_name]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A single robot-step execution as delivered by the business-process engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Correlates the async result with the paused workflow.
    pub event_token: String,
    pub contact: ContactRequest,
}

/// CRM contact id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContactId(pub i64);

/// A robot as reported by `bizproc.robot.list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RobotSummary {
    pub code: String,
    pub name: Option<String>,
}

/// Result of an installation attempt that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Credential saved and robot (re)registered.
    Installed,
    /// Credential saved, but it carries no portal domain, so the robot was not registered.
    CredentialOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(last: &str, first: &str, second: &str) -> ContactRequest {
        ContactRequest {
            last_name: last.to_string(),
            first_name: first.to_string(),
            second_name: second.to_string(),
            ..ContactRequest::default()
        }
    }

    #[test]
    fn full_name_skips_blank_parts() {
        assert_eq!(contact("Ivanov", "Ivan", "").full_name(), "Ivanov Ivan");
        assert_eq!(contact("Ivanov", "Ivan", "   ").full_name(), "Ivanov Ivan");
        assert_eq!(
            contact(" Ivanov ", "Ivan", "Ivanovich").full_name(),
            "Ivanov Ivan Ivanovich"
        );
    }

    #[test]
    fn from_parts_defaults_missing_optionals() {
        let req = ContactRequest::from_parts(
            Some("Petrov".to_string()),
            Some("Petr".to_string()),
            None,
            None,
            None,
        );
        assert_eq!(req.second_name, "");
        assert_eq!(req.phone, "");
        assert_eq!(req.full_name(), "Petrov Petr");
        assert!(req.has_required_names());
    }

    #[test]
    fn required_names_reject_blank() {
        assert!(!contact("", "Ivan", "").has_required_names());
        assert!(!contact("Ivanov", " ", "").has_required_names());
    }

    #[test]
    fn credential_usability() {
        let mut cred = Credential {
            access_token: "tok".to_string(),
            domain: "portal.bitrix24.ru".to_string(),
            ..Credential::default()
        };
        assert!(cred.is_usable());
        cred.domain.clear();
        assert!(!cred.is_usable());
    }
}
