use crate::api::routes;
use crate::config::SharedConfig;
use crate::host_store::DynHostStore;
use std::future::Future;
use std::net::SocketAddr;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub hosts: DynHostStore,
}

pub fn new(
    config: SharedConfig,
    hosts: DynHostStore,
) -> impl Future<Output = hyper::Result<()>> {
    axum::Server::bind(&config.api_bind_addr).serve(
        routes::new(AppState { config, hosts })
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
}
