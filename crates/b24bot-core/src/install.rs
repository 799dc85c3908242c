//! Application installation: OAuth code exchange or platform install event,
//! followed by robot registration.

use std::sync::Arc;

use crate::{
    domain::{Credential, InstallOutcome},
    errors::Error,
    ports::{OAuthExchange, TokenStore},
    service::RobotService,
    Result,
};

pub struct Installer {
    store: Arc<dyn TokenStore>,
    oauth: Arc<dyn OAuthExchange>,
    robots: Arc<RobotService>,
}

impl Installer {
    pub fn new(
        store: Arc<dyn TokenStore>,
        oauth: Arc<dyn OAuthExchange>,
        robots: Arc<RobotService>,
    ) -> Self {
        Self {
            store,
            oauth,
            robots,
        }
    }

    pub fn authorize_url(&self) -> String {
        self.oauth.authorize_url()
    }

    /// Finish the OAuth redirect: exchange `code`, persist the credential, register the robot.
    pub async fn complete_oauth(&self, code: &str) -> Result<InstallOutcome> {
        let credential = self.exchange_code(code).await?;
        self.install(credential).await
    }

    /// Trade an authorization code for a credential; nothing is persisted.
    pub async fn exchange_code(&self, code: &str) -> Result<Credential> {
        if code.trim().is_empty() {
            return Err(Error::Validation("authorization code is empty".to_string()));
        }
        self.oauth.exchange_code(code).await
    }

    /// Handle the platform-initiated install event carrying the credential directly.
    pub async fn accept_install_event(&self, credential: Credential) -> Result<InstallOutcome> {
        self.install(credential).await
    }

    /// Persist `credential` (replacing any previous one), then register the robot.
    ///
    /// A credential without an access token is rejected before anything is stored.
    pub async fn install(&self, credential: Credential) -> Result<InstallOutcome> {
        if credential.access_token.trim().is_empty() {
            return Err(Error::Validation("No token".to_string()));
        }

        // Saved first: a failed registration leaves a usable credential behind and
        // the install can simply be retried.
        self.store.save(&credential).await?;

        if credential.domain.trim().is_empty() {
            tracing::warn!("credential has no portal domain; robot registration skipped");
            return Ok(InstallOutcome::CredentialOnly);
        }

        self.robots
            .install(&credential.domain, &credential.access_token)
            .await?;
        Ok(InstallOutcome::Installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        service::tests::{installed, Call, FakeConnector, FakePlatform},
        token_store::MemoryTokenStore,
    };
    use async_trait::async_trait;

    struct FakeOAuth {
        result: std::result::Result<Credential, u16>,
    }

    #[async_trait]
    impl OAuthExchange for FakeOAuth {
        fn authorize_url(&self) -> String {
            "https://oauth.test/oauth/authorize/?client_id=app".to_string()
        }

        async fn exchange_code(&self, code: &str) -> Result<Credential> {
            assert_eq!(code, "abc");
            self.result.clone().map_err(|status| Error::Remote {
                method: "oauth/token".to_string(),
                status,
                body: "invalid_grant".to_string(),
            })
        }
    }

    struct Harness {
        store: Arc<MemoryTokenStore>,
        platform: Arc<FakePlatform>,
        installer: Installer,
    }

    fn harness(platform: FakePlatform, oauth: FakeOAuth) -> Harness {
        let store = Arc::new(MemoryTokenStore::new());
        let platform = Arc::new(platform);
        let robots = Arc::new(RobotService::new(
            store.clone(),
            Arc::new(FakeConnector(platform.clone())),
            "https://robot.example.com/handler",
        ));
        let installer = Installer::new(store.clone(), Arc::new(oauth), robots);
        Harness {
            store,
            platform,
            installer,
        }
    }

    #[tokio::test]
    async fn oauth_exchange_saves_and_registers() {
        let h = harness(
            FakePlatform::default(),
            FakeOAuth {
                result: Ok(installed()),
            },
        );

        let outcome = h.installer.complete_oauth("abc").await.unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(h.store.load().await, Some(installed()));
        assert!(h
            .platform
            .calls()
            .iter()
            .any(|c| matches!(c, Call::RegisterRobot(_))));
    }

    #[tokio::test]
    async fn failed_exchange_saves_nothing() {
        let h = harness(FakePlatform::default(), FakeOAuth { result: Err(401) });

        let err = h.installer.complete_oauth("abc").await.unwrap_err();
        assert!(matches!(err, Error::Remote { status: 401, .. }));
        assert_eq!(h.store.load().await, None);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_domain_persists_but_skips_registration() {
        let partial = Credential {
            domain: String::new(),
            ..installed()
        };
        let h = harness(
            FakePlatform::default(),
            FakeOAuth {
                result: Ok(partial.clone()),
            },
        );

        let outcome = h.installer.complete_oauth("abc").await.unwrap();
        assert_eq!(outcome, InstallOutcome::CredentialOnly);
        assert_eq!(h.store.load().await, Some(partial));
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn registration_failure_keeps_saved_credential() {
        let h = harness(
            FakePlatform {
                fail_register: true,
                ..FakePlatform::default()
            },
            FakeOAuth {
                result: Ok(installed()),
            },
        );

        let err = h.installer.accept_install_event(installed()).await.unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
        assert_eq!(h.store.load().await, Some(installed()));
    }

    #[tokio::test]
    async fn install_event_without_token_is_rejected() {
        let h = harness(
            FakePlatform::default(),
            FakeOAuth {
                result: Ok(installed()),
            },
        );

        let err = h
            .installer
            .accept_install_event(Credential {
                access_token: String::new(),
                ..installed()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(h.store.load().await, None);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn oauth_response_without_token_is_rejected() {
        let h = harness(
            FakePlatform::default(),
            FakeOAuth {
                result: Ok(Credential {
                    access_token: String::new(),
                    ..installed()
                }),
            },
        );

        let err = h.installer.complete_oauth("abc").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(h.store.load().await, None);
        assert!(h.platform.calls().is_empty());
    }

    #[tokio::test]
    async fn reinstall_overwrites_credential() {
        let h = harness(
            FakePlatform::default(),
            FakeOAuth {
                result: Ok(installed()),
            },
        );

        h.installer.accept_install_event(installed()).await.unwrap();
        let other = Credential {
            access_token: "tok2".to_string(),
            domain: "other.bitrix24.com".to_string(),
            ..installed()
        };
        h.installer.accept_install_event(other.clone()).await.unwrap();
        assert_eq!(h.store.load().await, Some(other));
    }
}
