//! Consumes a CSV or XLSX table of addresses, geocodes each row, and outputs
//! a GeoJSON file with one point feature per resolved address.

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = addr2geojson::run().await {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}
