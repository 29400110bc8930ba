//! Request handler definitions
//!
//! Every sync action is a `POST` without a body that runs exactly one synchronizer operation and answers with the
//! operation's plain-text log. Handlers that are more than a line or two MUST go into a separate module.
//!
//! Operations await the remote APIs and the database, so they never block a worker thread. Actix runs each worker's
//! requests sequentially, which is enough: the store's row versions guard against concurrent runs from other
//! workers or processes.
use actix_web::{get, http::header::ContentType, web, HttpResponse, Responder};
use log::*;
use order_sync_engine::{
    db_types::MarketplaceId,
    sync_objects::BatchSummary,
    traits::{FulfillmentClient, MarketplaceClient},
    OrderSyncApi,
    SyncDatabase,
};

use crate::errors::ServerError;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

fn summary_response(summary: &BatchSummary) -> HttpResponse {
    HttpResponse::Ok().insert_header(ContentType::plaintext()).body(summary.to_string())
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Sync actions  ----------------------------------------------------
route!(run_task => Post "/run_task" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
/// Sends every selected order to the ERP.
pub async fn run_task<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received run_task request");
    let summary = api.send_selected().await?;
    info!("💻️ Sent selected orders. {} created, {} failed", summary.succeeded(), summary.failed());
    Ok(summary_response(&summary))
}

route!(fetch_orders => Post "/fetch_orders" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
pub async fn fetch_orders<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received fetch_orders request");
    let summary = api.fetch_new().await?;
    info!("💻️ Fetched orders. {} imported", summary.succeeded());
    Ok(summary_response(&summary))
}

route!(archive_orders => Post "/archive_orders" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
pub async fn archive_orders<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received archive_orders request");
    let summary = api.archive_completed().await?;
    Ok(summary_response(&summary))
}

route!(update_states => Post "/update_states" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
pub async fn update_states<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received update_states request");
    let summary = api.update_states().await?;
    Ok(summary_response(&summary))
}

route!(process_orders => Post "/process_orders" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
/// Re-sends shipment notifications the marketplace has not acknowledged yet.
pub async fn process_orders<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received process_orders request");
    let summary = api.process_shipped().await?;
    Ok(summary_response(&summary))
}

route!(process_cancelled => Post "/process_cancelled" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
pub async fn process_cancelled<B, M, F>(api: web::Data<OrderSyncApi<B, M, F>>) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    debug!("💻️ Received process_cancelled request");
    let summary = api.process_cancelled().await?;
    Ok(summary_response(&summary))
}

route!(select_order => Post "/select/{marketplace_id}" impl SyncDatabase, MarketplaceClient, FulfillmentClient);
/// The operator action. Marks a `NEW` or `ERROR` order for the next `/run_task`.
pub async fn select_order<B, M, F>(
    path: web::Path<String>,
    api: web::Data<OrderSyncApi<B, M, F>>,
) -> Result<HttpResponse, ServerError>
where
    B: SyncDatabase,
    M: MarketplaceClient,
    F: FulfillmentClient,
{
    let id = MarketplaceId::from(path.into_inner());
    debug!("💻️ Received select request for {id}");
    let summary = api.select_orders(&[id]).await?;
    if let Some((id, e)) = summary.failures().next() {
        warn!("💻️ Order {id} could not be selected. {e}");
        return Err(ServerError::from(e.clone()));
    }
    Ok(summary_response(&summary))
}
