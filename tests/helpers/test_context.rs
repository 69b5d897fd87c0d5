//! Seeded hostel fixture

use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;

use hostelflow::config::{Settings, SyncMode, WebhookConfig};
use hostelflow::database::memory::{DEMO_SECURITY_ID, DEMO_STUDENT_2_ID, DEMO_STUDENT_ID, DEMO_WARDEN_ID};
use hostelflow::database::{ChangeFeed, InMemoryStore, RecordStore};
use hostelflow::services::Session;
use hostelflow::state::sync::{SyncRecord, Synchronizer};
use hostelflow::state::AppContext;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// A demo hostel backed by the in-memory store
pub struct TestHostel {
    pub store: Arc<InMemoryStore>,
    pub feed: ChangeFeed,
    pub context: AppContext,
}

impl TestHostel {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    /// Hostel whose check-ins are forwarded to `webhook_url`
    pub fn with_webhook(webhook_url: &str) -> Self {
        let mut settings = test_settings();
        settings.webhook = WebhookConfig {
            enabled: true,
            url: Some(webhook_url.to_string()),
            timeout_seconds: 2,
        };
        Self::with_settings(settings)
    }

    pub fn with_sync_mode(mode: SyncMode) -> Self {
        let mut settings = test_settings();
        settings.sync.mode = mode;
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_tracing();
        let feed = ChangeFeed::new(settings.sync.buffer);
        let store = Arc::new(InMemoryStore::with_demo_data(feed.clone()).expect("demo data"));
        let dyn_store: Arc<dyn RecordStore> = store.clone();
        let context = AppContext::new(settings, dyn_store, feed.clone()).expect("context");
        Self { store, feed, context }
    }

    pub async fn sign_in(&self, user_id: u128) -> Session {
        self.context
            .services
            .auth_service
            .sign_in(Uuid::from_u128(user_id))
            .await
            .expect("demo principal signs in")
    }

    pub async fn student(&self) -> Session {
        self.sign_in(DEMO_STUDENT_ID).await
    }

    pub async fn other_student(&self) -> Session {
        self.sign_in(DEMO_STUDENT_2_ID).await
    }

    pub async fn warden(&self) -> Session {
        self.sign_in(DEMO_WARDEN_ID).await
    }

    pub async fn guard(&self) -> Session {
        self.sign_in(DEMO_SECURITY_ID).await
    }

    pub async fn view<T: SyncRecord>(&self) -> Synchronizer<T> {
        self.context.view().await
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.database.url = "memory://".to_string();
    settings.geolocation.timeout_seconds = 1;
    settings
}

/// Wait for the next change a view applies
pub async fn next_change<T: SyncRecord>(view: &mut Synchronizer<T>) {
    tokio::time::timeout(Duration::from_secs(2), view.changed())
        .await
        .expect("view did not update in time");
}
