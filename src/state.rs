use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::repository::postgres::PgBookingStore;
use crate::repository::store::BookingStore;
use crate::services::bookings::{BookingPolicy, BookingService};
use crate::services::clock::{Clock, SystemClock};
use crate::services::notifications::WebhookNotificationSender;
use crate::services::payout::PayoutEngine;
use crate::services::payout_provider::HttpPayoutProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http_client: Client,
    pub db_pool: Option<PgPool>,
    pub store: Option<Arc<dyn BookingStore>>,
    pub bookings: Option<Arc<BookingService>>,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.payout_provider_timeout_seconds))
            .build()?;

        let db_pool = db::build_pool(&config)?;
        let store: Option<Arc<dyn BookingStore>> = db_pool
            .clone()
            .map(|pool| Arc::new(PgBookingStore::new(pool)) as Arc<dyn BookingStore>);

        let bookings = store
            .clone()
            .map(|store| Arc::new(build_booking_service(store, &config, http_client.clone())));

        Ok(Self {
            config: Arc::new(config),
            http_client,
            db_pool,
            store,
            bookings,
        })
    }

    pub fn bookings(&self) -> AppResult<&Arc<BookingService>> {
        self.bookings.as_ref().ok_or_else(|| {
            AppError::Dependency("Database is not configured. Set DATABASE_URL.".to_string())
        })
    }
}

/// Wire the engine from configuration: system clock, HTTP payout provider,
/// webhook notification sender.
pub fn build_booking_service(
    store: Arc<dyn BookingStore>,
    config: &AppConfig,
    http_client: Client,
) -> BookingService {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let provider = Arc::new(HttpPayoutProvider::new(
        http_client.clone(),
        config.payout_provider_base_url.clone(),
        config.payout_provider_api_key.clone(),
    ));
    let payout = Arc::new(PayoutEngine::new(
        Arc::clone(&store),
        provider,
        Arc::clone(&clock),
        config.platform_fee_percent,
    ));
    let notifier = Arc::new(WebhookNotificationSender::new(
        http_client,
        config.notification_webhook_url.clone(),
    ));
    BookingService::new(
        store,
        payout,
        notifier,
        clock,
        BookingPolicy::from_config(config),
    )
}
