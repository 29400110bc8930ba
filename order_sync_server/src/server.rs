use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, web::ServiceConfig, App, HttpServer};
use idosell_tools::{
    templates::{load_or_default, CREATE_BODY, EDIT_BODY},
    IdosellApi,
};
use log::*;
use order_sync_engine::{
    traits::{FulfillmentClient, MarketplaceClient},
    OrderSyncApi,
    SqliteDatabase,
    SyncDatabase,
};
use osync_common::RequestTemplate;
use refurbed_tools::RefurbedApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{IdosellFulfillment, RefurbedMarketplace},
    routes::{
        health,
        ArchiveOrdersRoute,
        FetchOrdersRoute,
        ProcessCancelledRoute,
        ProcessOrdersRoute,
        RunTaskRoute,
        SelectOrderRoute,
        UpdateStatesRoute,
    },
};

pub type LiveSyncApi = OrderSyncApi<SqliteDatabase, RefurbedMarketplace, IdosellFulfillment>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Loads the request templates and builds the API clients. Fails if a configured template cannot be read, so that a
/// typo in a path is caught at startup rather than on the first send.
pub fn sync_components(
    config: &ServerConfig,
) -> Result<(RequestTemplate, RefurbedMarketplace, IdosellFulfillment), ServerError> {
    let create_template = load_or_default(config.create_template.as_deref(), CREATE_BODY)
        .map_err(|e| ServerError::InitializeError(format!("Create-order template: {e}")))?;
    let edit_template = load_or_default(config.edit_template.as_deref(), EDIT_BODY)
        .map_err(|e| ServerError::InitializeError(format!("Edit-order template: {e}")))?;
    let refurbed = RefurbedApi::new(config.refurbed.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let idosell = IdosellApi::new(config.idosell.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?
        .with_edit_template(edit_template);
    if config.refurbed.api_key.is_unset() || config.idosell.api_key.is_unset() {
        warn!("🪛️ At least one API key is missing. Requests to that system will fail.");
    }
    Ok((create_template, RefurbedMarketplace::new(refurbed), IdosellFulfillment::new(idosell)))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let (create_template, marketplace, fulfillment) = sync_components(&config)?;
    info!("🚀️ Sync policy: {:?}", config.policy);
    let policy = config.policy.clone();
    let srv = HttpServer::new(move || {
        let sync_api: LiveSyncApi =
            OrderSyncApi::new(db.clone(), marketplace.clone(), fulfillment.clone(), create_template.clone())
                .with_policy(policy.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("osync::access_log"))
            .app_data(web::Data::new(sync_api))
            .service(health)
            .configure(sync_routes::<SqliteDatabase, RefurbedMarketplace, IdosellFulfillment>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the sync actions. The matching `OrderSyncApi<B, M, F>` must be added as app data.
pub fn sync_routes<B, M, F>(cfg: &mut ServiceConfig)
where
    B: SyncDatabase + 'static,
    M: MarketplaceClient + 'static,
    F: FulfillmentClient + 'static,
{
    cfg.service(RunTaskRoute::<B, M, F>::new())
        .service(FetchOrdersRoute::<B, M, F>::new())
        .service(ArchiveOrdersRoute::<B, M, F>::new())
        .service(UpdateStatesRoute::<B, M, F>::new())
        .service(ProcessOrdersRoute::<B, M, F>::new())
        .service(ProcessCancelledRoute::<B, M, F>::new())
        .service(SelectOrderRoute::<B, M, F>::new());
}
