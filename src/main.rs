use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use std::io;

use workforce_metrics_backend::config::Settings;
use workforce_metrics_backend::{configure, db};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().map_err(|err| {
        error!("Invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;

    let store = db::create_store(&settings).await.map_err(|err| {
        error!("Failed to initialise the store: {}", err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;
    let store = web::Data::from(store);

    info!("Starting server at {}", settings.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(store.clone())
            .configure(configure)
    })
    .bind(&settings.bind_address)?
    .run()
    .await
}
